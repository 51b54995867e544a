//! Short-Interval-Control (SIC) usage models
//!
//! SIC entries capture periodic physical counts (opening / issues / waste /
//! closing) used to infer actual material usage and product output.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A daily physical count for a raw material
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SicRawEntry {
    pub id: Uuid,
    pub business_id: Uuid,
    pub material_id: Uuid,
    pub entry_date: NaiveDate,
    pub opening_qty: Decimal,
    pub issues_qty: Decimal,
    pub waste_qty: Decimal,
    pub closing_qty: Decimal,
    /// opening + issues - waste - closing, persisted verbatim
    pub computed_usage: Decimal,
    pub override_reason: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A daily physical count for a finished product.
///
/// Structurally identical to [`SicRawEntry`]; `produced_qty` plays the
/// issues role and the computed figure is the inferred sales quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SicProductEntry {
    pub id: Uuid,
    pub business_id: Uuid,
    pub product_id: Uuid,
    pub entry_date: NaiveDate,
    pub opening_qty: Decimal,
    pub produced_qty: Decimal,
    pub waste_qty: Decimal,
    pub closing_qty: Decimal,
    pub computed_sales_qty: Decimal,
    pub override_reason: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
