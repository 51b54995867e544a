//! Standard cost snapshot and variance models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable "standard" cost snapshot for a product.
///
/// All component costs are per unit. The most recently created snapshot
/// is the active standard for the product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StandardCostSnapshot {
    pub id: Uuid,
    pub business_id: Uuid,
    pub product_id: Uuid,
    pub recipe_cost: Decimal,
    pub packaging_cost: Decimal,
    pub labour_cost: Decimal,
    pub opex_cost: Decimal,
    pub cogs: Decimal,
    pub tcop: Decimal,
    /// Margin as a fraction (0.2 = 20%)
    pub margin_percent: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// A recorded variance between a recomputed actual cost and a standard.
///
/// Signs are consistent across all components: positive means the actual
/// exceeded the standard (unfavorable cost drift).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CostVariance {
    pub id: Uuid,
    pub business_id: Uuid,
    pub product_id: Uuid,
    pub snapshot_id: Uuid,
    pub actual_recipe_cost: Decimal,
    pub actual_packaging_cost: Decimal,
    pub actual_labour_cost: Decimal,
    pub actual_opex_cost: Decimal,
    pub actual_tcop: Decimal,
    pub variance_recipe: Decimal,
    pub variance_packaging: Decimal,
    pub variance_labour: Decimal,
    pub variance_opex: Decimal,
    pub variance_total: Decimal,
    pub created_at: DateTime<Utc>,
}
