//! Standard cost snapshots and variance tracking
//!
//! A "standard" freezes a pipeline result as the pricing baseline for a
//! product. Variance recomputation reruns the pipeline with the standard's
//! margin and records the signed drift of every cost component.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CostVariance, StandardCostSnapshot};
use crate::services::costing::{ComputeCostOptions, CostResult, CostingService};
use shared::validation::validate_margin_fraction;

/// Service managing standard cost snapshots and cost variances
#[derive(Clone)]
pub struct StandardCostService {
    db: PgPool,
}

/// Result of a variance recomputation
#[derive(Debug, Clone, Serialize)]
pub struct VarianceComparison {
    pub actual: CostResult,
    pub standard: StandardCostSnapshot,
    pub variance: CostVariance,
}

/// Resolve the active standard for a variance recomputation.
///
/// A product that has never been standardized has nothing to compare
/// against, so the absence is a NotFound rather than a zero baseline.
pub fn require_standard(
    standard: Option<StandardCostSnapshot>,
) -> AppResult<StandardCostSnapshot> {
    standard.ok_or_else(|| AppError::NotFound("Standard cost snapshot".to_string()))
}

impl StandardCostService {
    /// Create a new StandardCostService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Run the cost pipeline and freeze the result as the new standard.
    ///
    /// Standards are append-only; the most recently created snapshot is the
    /// active standard for the product.
    pub async fn standardize(
        &self,
        business_id: Uuid,
        product_id: Uuid,
        margin_percent: Decimal,
    ) -> AppResult<StandardCostSnapshot> {
        validate_margin_fraction(margin_percent).map_err(|message| AppError::Validation {
            field: "margin_percent".to_string(),
            message: message.to_string(),
            message_th: "อัตรากำไรต้องอยู่ระหว่าง 0 ถึง 1".to_string(),
        })?;

        let costing = CostingService::new(self.db.clone());
        let options = ComputeCostOptions {
            margin_percent: Some(margin_percent),
            ..Default::default()
        };
        let result = costing
            .compute_product_cost(business_id, product_id, &options)
            .await?;

        let snapshot = sqlx::query_as::<_, StandardCostSnapshot>(
            r#"
            INSERT INTO standard_cost_snapshots (
                business_id, product_id, recipe_cost, packaging_cost, labour_cost,
                opex_cost, cogs, tcop, margin_percent, selling_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, business_id, product_id, recipe_cost, packaging_cost,
                      labour_cost, opex_cost, cogs, tcop, margin_percent,
                      selling_price, created_at
            "#,
        )
        .bind(business_id)
        .bind(product_id)
        .bind(result.recipe_cost)
        .bind(result.packaging_cost)
        .bind(result.labour_cost)
        .bind(result.opex_cost)
        .bind(result.cogs)
        .bind(result.tcop)
        .bind(result.margin_percent)
        .bind(result.selling_price)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            "Recorded standard cost snapshot {} for product {}",
            snapshot.id,
            product_id
        );

        Ok(snapshot)
    }

    /// The active standard for a product, if one has been recorded
    pub async fn latest_standard(
        &self,
        business_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Option<StandardCostSnapshot>> {
        let snapshot = sqlx::query_as::<_, StandardCostSnapshot>(
            r#"
            SELECT id, business_id, product_id, recipe_cost, packaging_cost,
                   labour_cost, opex_cost, cogs, tcop, margin_percent,
                   selling_price, created_at
            FROM standard_cost_snapshots
            WHERE business_id = $1 AND product_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(business_id)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(snapshot)
    }

    /// List all standard cost snapshots for a product, newest first
    pub async fn list_standards(
        &self,
        business_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Vec<StandardCostSnapshot>> {
        let snapshots = sqlx::query_as::<_, StandardCostSnapshot>(
            r#"
            SELECT id, business_id, product_id, recipe_cost, packaging_cost,
                   labour_cost, opex_cost, cogs, tcop, margin_percent,
                   selling_price, created_at
            FROM standard_cost_snapshots
            WHERE business_id = $1 AND product_id = $2
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(business_id)
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(snapshots)
    }

    /// Recompute the actual cost of a product and record its variance
    /// against the active standard.
    ///
    /// Fails with NotFound (and writes nothing) when the product has never
    /// been standardized. Positive variance means the actual cost exceeds
    /// the standard.
    pub async fn recompute_variance(
        &self,
        business_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<VarianceComparison> {
        let standard = require_standard(self.latest_standard(business_id, product_id).await?)?;

        let costing = CostingService::new(self.db.clone());
        let options = ComputeCostOptions {
            margin_percent: standard.margin_percent,
            ..Default::default()
        };
        let actual = costing
            .compute_product_cost(business_id, product_id, &options)
            .await?;

        let variance = sqlx::query_as::<_, CostVariance>(
            r#"
            INSERT INTO cost_variances (
                business_id, product_id, snapshot_id,
                actual_recipe_cost, actual_packaging_cost, actual_labour_cost,
                actual_opex_cost, actual_tcop,
                variance_recipe, variance_packaging, variance_labour,
                variance_opex, variance_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, business_id, product_id, snapshot_id,
                      actual_recipe_cost, actual_packaging_cost, actual_labour_cost,
                      actual_opex_cost, actual_tcop,
                      variance_recipe, variance_packaging, variance_labour,
                      variance_opex, variance_total, created_at
            "#,
        )
        .bind(business_id)
        .bind(product_id)
        .bind(standard.id)
        .bind(actual.recipe_cost)
        .bind(actual.packaging_cost)
        .bind(actual.labour_cost)
        .bind(actual.opex_cost)
        .bind(actual.tcop)
        .bind(actual.recipe_cost - standard.recipe_cost)
        .bind(actual.packaging_cost - standard.packaging_cost)
        .bind(actual.labour_cost - standard.labour_cost)
        .bind(actual.opex_cost - standard.opex_cost)
        .bind(actual.tcop - standard.tcop)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            "Recorded cost variance {} for product {} against standard {}",
            variance.id,
            product_id,
            standard.id
        );

        Ok(VarianceComparison {
            actual,
            standard,
            variance,
        })
    }
}
