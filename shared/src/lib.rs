//! Shared types and models for the Production Costing Platform
//!
//! This crate contains types shared between the backend core and other
//! components of the system. It has no I/O dependencies of its own; the
//! optional `sqlx` feature adds database derives for the backend.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
