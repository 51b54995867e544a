//! Raw material and purchase models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A raw material in a business's catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Material {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    /// Measurement unit (e.g., "kg", "litre", "pcs")
    pub unit: String,
    pub created_at: DateTime<Utc>,
}

/// A recorded purchase of a raw material.
///
/// Immutable once created; the costing pipeline reads only the most
/// recently dated purchase per material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MaterialPurchase {
    pub id: Uuid,
    pub business_id: Uuid,
    pub material_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub purchase_price: Decimal,
    pub purchase_qty: Decimal,
    pub purchase_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
