//! Product, recipe and packaging models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sellable product produced by the business
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One material line of a product's recipe.
///
/// `quantity` is the amount consumed per one production batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RecipeLine {
    pub id: Uuid,
    pub business_id: Uuid,
    pub product_id: Uuid,
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub unit: Option<String>,
}

/// A packaging item with its per-unit cost
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PackagingItem {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub cost_per_unit: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Mapping of a packaging item to a product, with quantity per batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PackagingAssignment {
    pub id: Uuid,
    pub business_id: Uuid,
    pub product_id: Uuid,
    pub packaging_id: Uuid,
    pub quantity: Decimal,
}
