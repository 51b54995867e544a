//! Production Costing Platform - Core Library
//!
//! The costing and reconciliation core for multi-tenant food/retail
//! production businesses: per-unit product cost computation, standard cost
//! snapshots with variance tracking, a concurrency-safe stock ledger with
//! moving-average costing, and SIC usage reconciliation.
//!
//! This crate is consumed in-process by the HTTP API layer; routing,
//! authentication and catalog CRUD live outside of it.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;

/// Initialize tracing for binaries embedding this library
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "production_costing_backend=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
