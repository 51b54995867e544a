//! Database models for the Production Costing Platform
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
