//! Labour and operating-expense allocation models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a labour cost is allocated to production
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "labour_allocation_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum LabourAllocationType {
    Fixed,
}

/// A labour cost pool with an optional effective-date window.
/// Open bounds mean the record is always active on that side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LabourCostRecord {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub allocation_type: LabourAllocationType,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// How an overhead item is allocated to production cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "opex_allocation_mode", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OpexAllocationMode {
    /// A fixed amount per batch
    Fixed,
    /// A percentage of the pre-overhead COGS
    PercentOfCogs,
}

/// An overhead (OPEX) item with an optional effective-date window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OpexItem {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub allocation_mode: OpexAllocationMode,
    /// Amount used when `allocation_mode` is `Fixed`
    pub amount: Decimal,
    /// Percentage (0-100) used when `allocation_mode` is `PercentOfCogs`
    pub percentage_value: Decimal,
    pub estimated_monthly_sales: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}
