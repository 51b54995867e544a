//! Stock ledger models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of item a stock record refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "stock_item_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Material,
    Product,
}

/// Type of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "stock_movement_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    VendorDelivery,
    Production,
    Sale,
    Waste,
}

impl MovementType {
    /// Whether this movement adds stock to the balance
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            MovementType::In | MovementType::VendorDelivery | MovementType::Production
        )
    }
}

/// An append-only stock movement audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: Uuid,
    pub business_id: Uuid,
    pub item_type: ItemType,
    pub item_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub cost_per_unit: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub vendor_id: Option<Uuid>,
    /// Free-form link to the originating document (purchase, sale, ...)
    pub reference: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// The running balance for one item, maintained under row lock.
///
/// `quantity` is the signed sum of all movements for the item;
/// `average_cost` is a moving average over inbound movements only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockBalance {
    pub business_id: Uuid,
    pub item_type: ItemType,
    pub item_id: Uuid,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub updated_at: DateTime<Utc>,
}
