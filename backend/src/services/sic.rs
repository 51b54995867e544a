//! Short-Interval-Control usage reconciliation
//!
//! Captures periodic physical counts for materials and products, infers
//! usage/output from them, and reconciles recipe-implied expected usage
//! against physically reported usage.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{SicProductEntry, SicRawEntry};
use crate::services::costing::purchase_unit_cost;
use shared::types::DateRange;
use shared::validation::validate_count;

/// SIC usage reconciliation service
#[derive(Clone)]
pub struct SicService {
    db: PgPool,
}

/// Usage inferred from a physical count:
/// opening + issues - waste - closing.
///
/// May be negative when the closing count exceeds what the other figures
/// imply; the override reason mechanism covers such discrepancies.
pub fn computed_usage(
    opening: Decimal,
    issues: Decimal,
    waste: Decimal,
    closing: Decimal,
) -> Decimal {
    opening + issues - waste - closing
}

/// Input for submitting a raw material count
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRawUsageInput {
    pub material_id: Uuid,
    pub entry_date: Option<NaiveDate>,
    pub opening_qty: Decimal,
    pub issues_qty: Decimal,
    pub waste_qty: Decimal,
    pub closing_qty: Decimal,
    pub override_reason: Option<String>,
}

/// Input for submitting a finished product count
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitProductUsageInput {
    pub product_id: Uuid,
    pub entry_date: Option<NaiveDate>,
    pub opening_qty: Decimal,
    pub produced_qty: Decimal,
    pub waste_qty: Decimal,
    pub closing_qty: Decimal,
    pub override_reason: Option<String>,
}

/// One material line of the raw material variance report
#[derive(Debug, Clone, Serialize)]
pub struct RawMaterialVarianceRow {
    pub material_id: Uuid,
    pub material_name: String,
    /// Recipe-implied usage given the reported product output
    pub expected_usage: Decimal,
    /// Physically reported usage (issues + waste)
    pub actual_usage: Decimal,
    /// Latest purchase unit cost at report time
    pub unit_cost: Decimal,
    pub variance_qty: Decimal,
    pub variance_value: Decimal,
}

/// One product line of the product variance report
#[derive(Debug, Clone, Serialize)]
pub struct ProductVarianceRow {
    pub product_id: Uuid,
    pub product_name: String,
    pub expected_sales_qty: Decimal,
    pub actual_sales_qty: Decimal,
    /// Average selling price observed in recorded sales
    pub selling_price: Decimal,
    pub expected_revenue: Decimal,
    pub actual_revenue: Decimal,
    pub variance_revenue: Decimal,
}

/// Row for usage aggregation queries
#[derive(Debug, FromRow)]
struct UsageAggRow {
    item_id: Uuid,
    total: Decimal,
}

/// Row for the latest-purchase query
#[derive(Debug, FromRow)]
struct LatestPurchaseRow {
    material_id: Uuid,
    purchase_price: Decimal,
    purchase_qty: Decimal,
}

/// Row for name lookups
#[derive(Debug, FromRow)]
struct NamedRow {
    id: Uuid,
    name: String,
}

/// Row for the sales aggregation query
#[derive(Debug, FromRow)]
struct SalesAggRow {
    product_id: Uuid,
    actual_qty: Decimal,
    avg_price: Decimal,
}

impl SicService {
    /// Create a new SicService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Submit a physical count for a raw material.
    ///
    /// The usage identity is persisted verbatim alongside the inputs; no
    /// check is made against the prior day's closing (the override reason
    /// covers deliberate corrections).
    pub async fn submit_raw_usage(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        input: SubmitRawUsageInput,
    ) -> AppResult<SicRawEntry> {
        Self::validate_counts(&[
            ("opening_qty", input.opening_qty),
            ("issues_qty", input.issues_qty),
            ("waste_qty", input.waste_qty),
            ("closing_qty", input.closing_qty),
        ])?;

        let material_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM materials WHERE id = $1 AND business_id = $2)",
        )
        .bind(input.material_id)
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        if !material_exists {
            return Err(AppError::NotFound("Material".to_string()));
        }

        let entry_date = input.entry_date.unwrap_or_else(|| Utc::now().date_naive());
        let usage = computed_usage(
            input.opening_qty,
            input.issues_qty,
            input.waste_qty,
            input.closing_qty,
        );

        let entry = sqlx::query_as::<_, SicRawEntry>(
            r#"
            INSERT INTO sic_raw_entries (
                business_id, material_id, entry_date, opening_qty, issues_qty,
                waste_qty, closing_qty, computed_usage, override_reason, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, business_id, material_id, entry_date, opening_qty, issues_qty,
                      waste_qty, closing_qty, computed_usage, override_reason,
                      created_by, created_at
            "#,
        )
        .bind(business_id)
        .bind(input.material_id)
        .bind(entry_date)
        .bind(input.opening_qty)
        .bind(input.issues_qty)
        .bind(input.waste_qty)
        .bind(input.closing_qty)
        .bind(usage)
        .bind(&input.override_reason)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(entry)
    }

    /// Submit a physical count for a finished product.
    ///
    /// Structurally identical to [`SicService::submit_raw_usage`], with
    /// produced quantity in the issues role; the computed figure is the
    /// inferred sales quantity.
    pub async fn submit_product_usage(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        input: SubmitProductUsageInput,
    ) -> AppResult<SicProductEntry> {
        Self::validate_counts(&[
            ("opening_qty", input.opening_qty),
            ("produced_qty", input.produced_qty),
            ("waste_qty", input.waste_qty),
            ("closing_qty", input.closing_qty),
        ])?;

        let product_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND business_id = $2)",
        )
        .bind(input.product_id)
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let entry_date = input.entry_date.unwrap_or_else(|| Utc::now().date_naive());
        let sales_qty = computed_usage(
            input.opening_qty,
            input.produced_qty,
            input.waste_qty,
            input.closing_qty,
        );

        let entry = sqlx::query_as::<_, SicProductEntry>(
            r#"
            INSERT INTO sic_product_entries (
                business_id, product_id, entry_date, opening_qty, produced_qty,
                waste_qty, closing_qty, computed_sales_qty, override_reason, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, business_id, product_id, entry_date, opening_qty, produced_qty,
                      waste_qty, closing_qty, computed_sales_qty, override_reason,
                      created_by, created_at
            "#,
        )
        .bind(business_id)
        .bind(input.product_id)
        .bind(entry_date)
        .bind(input.opening_qty)
        .bind(input.produced_qty)
        .bind(input.waste_qty)
        .bind(input.closing_qty)
        .bind(sales_qty)
        .bind(&input.override_reason)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(entry)
    }

    /// Raw material entries in a date range, newest first
    pub async fn list_raw_entries(
        &self,
        business_id: Uuid,
        range: &DateRange,
    ) -> AppResult<Vec<SicRawEntry>> {
        let entries = sqlx::query_as::<_, SicRawEntry>(
            r#"
            SELECT id, business_id, material_id, entry_date, opening_qty, issues_qty,
                   waste_qty, closing_qty, computed_usage, override_reason,
                   created_by, created_at
            FROM sic_raw_entries
            WHERE business_id = $1 AND entry_date BETWEEN $2 AND $3
            ORDER BY entry_date DESC, created_at DESC
            "#,
        )
        .bind(business_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// Product entries in a date range, newest first
    pub async fn list_product_entries(
        &self,
        business_id: Uuid,
        range: &DateRange,
    ) -> AppResult<Vec<SicProductEntry>> {
        let entries = sqlx::query_as::<_, SicProductEntry>(
            r#"
            SELECT id, business_id, product_id, entry_date, opening_qty, produced_qty,
                   waste_qty, closing_qty, computed_sales_qty, override_reason,
                   created_by, created_at
            FROM sic_product_entries
            WHERE business_id = $1 AND entry_date BETWEEN $2 AND $3
            ORDER BY entry_date DESC, created_at DESC
            "#,
        )
        .bind(business_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// Compare recipe-implied expected material usage against physically
    /// reported usage over a date range.
    ///
    /// Variance is valued at the latest purchase unit cost at report time,
    /// not the historical cost.
    pub async fn raw_material_variance_report(
        &self,
        business_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<RawMaterialVarianceRow>> {
        // What the recipes say should have been consumed, given reported output
        let expected_rows = sqlx::query_as::<_, UsageAggRow>(
            r#"
            SELECT rl.material_id AS item_id,
                   COALESCE(SUM(rl.quantity * spe.computed_sales_qty), 0) AS total
            FROM recipe_lines rl
            JOIN sic_product_entries spe
              ON spe.product_id = rl.product_id AND spe.business_id = rl.business_id
            WHERE rl.business_id = $1 AND spe.entry_date BETWEEN $2 AND $3
            GROUP BY rl.material_id
            "#,
        )
        .bind(business_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        // What was physically reported as consumed
        let actual_rows = sqlx::query_as::<_, UsageAggRow>(
            r#"
            SELECT material_id AS item_id,
                   COALESCE(SUM(issues_qty + waste_qty), 0) AS total
            FROM sic_raw_entries
            WHERE business_id = $1 AND entry_date BETWEEN $2 AND $3
            GROUP BY material_id
            "#,
        )
        .bind(business_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        let expected: HashMap<Uuid, Decimal> = expected_rows
            .into_iter()
            .map(|row| (row.item_id, row.total))
            .collect();
        let actual: HashMap<Uuid, Decimal> = actual_rows
            .into_iter()
            .map(|row| (row.item_id, row.total))
            .collect();

        let mut material_ids: Vec<Uuid> = expected.keys().chain(actual.keys()).copied().collect();
        material_ids.sort();
        material_ids.dedup();

        if material_ids.is_empty() {
            return Ok(Vec::new());
        }

        let cost_rows = sqlx::query_as::<_, LatestPurchaseRow>(
            r#"
            SELECT DISTINCT ON (material_id) material_id, purchase_price, purchase_qty
            FROM material_purchases
            WHERE business_id = $1 AND material_id = ANY($2)
            ORDER BY material_id, purchase_date DESC, created_at DESC
            "#,
        )
        .bind(business_id)
        .bind(&material_ids)
        .fetch_all(&self.db)
        .await?;

        let unit_costs: HashMap<Uuid, Decimal> = cost_rows
            .into_iter()
            .map(|row| {
                (
                    row.material_id,
                    purchase_unit_cost(row.purchase_price, row.purchase_qty),
                )
            })
            .collect();

        let names = sqlx::query_as::<_, NamedRow>(
            "SELECT id, name FROM materials WHERE business_id = $1 AND id = ANY($2)",
        )
        .bind(business_id)
        .bind(&material_ids)
        .fetch_all(&self.db)
        .await?;

        let mut report: Vec<RawMaterialVarianceRow> = names
            .into_iter()
            .map(|material| {
                let expected_usage = expected.get(&material.id).copied().unwrap_or(Decimal::ZERO);
                let actual_usage = actual.get(&material.id).copied().unwrap_or(Decimal::ZERO);
                let unit_cost = unit_costs.get(&material.id).copied().unwrap_or(Decimal::ZERO);
                let variance_qty = expected_usage - actual_usage;
                RawMaterialVarianceRow {
                    material_id: material.id,
                    material_name: material.name,
                    expected_usage,
                    actual_usage,
                    unit_cost,
                    variance_qty,
                    variance_value: variance_qty * unit_cost,
                }
            })
            .collect();

        report.sort_by(|a, b| a.material_name.cmp(&b.material_name));

        Ok(report)
    }

    /// Compare SIC-inferred expected sales against recorded point-of-sale
    /// quantities per product.
    ///
    /// Aggregates all history; callers wanting a window should scope the
    /// underlying entries themselves.
    pub async fn product_variance_report(
        &self,
        business_id: Uuid,
    ) -> AppResult<Vec<ProductVarianceRow>> {
        let expected_rows = sqlx::query_as::<_, UsageAggRow>(
            r#"
            SELECT product_id AS item_id,
                   COALESCE(SUM(computed_sales_qty), 0) AS total
            FROM sic_product_entries
            WHERE business_id = $1
            GROUP BY product_id
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        let sales_rows = sqlx::query_as::<_, SalesAggRow>(
            r#"
            SELECT product_id,
                   COALESCE(SUM(quantity), 0) AS actual_qty,
                   CASE WHEN SUM(quantity) > 0
                        THEN SUM(quantity * unit_price) / SUM(quantity)
                        ELSE 0
                   END AS avg_price
            FROM sale_items
            WHERE business_id = $1
            GROUP BY product_id
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        let expected: HashMap<Uuid, Decimal> = expected_rows
            .into_iter()
            .map(|row| (row.item_id, row.total))
            .collect();
        let sales: HashMap<Uuid, (Decimal, Decimal)> = sales_rows
            .into_iter()
            .map(|row| (row.product_id, (row.actual_qty, row.avg_price)))
            .collect();

        let mut product_ids: Vec<Uuid> = expected.keys().chain(sales.keys()).copied().collect();
        product_ids.sort();
        product_ids.dedup();

        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let names = sqlx::query_as::<_, NamedRow>(
            "SELECT id, name FROM products WHERE business_id = $1 AND id = ANY($2)",
        )
        .bind(business_id)
        .bind(&product_ids)
        .fetch_all(&self.db)
        .await?;

        let mut report: Vec<ProductVarianceRow> = names
            .into_iter()
            .map(|product| {
                let expected_sales_qty =
                    expected.get(&product.id).copied().unwrap_or(Decimal::ZERO);
                let (actual_sales_qty, selling_price) = sales
                    .get(&product.id)
                    .copied()
                    .unwrap_or((Decimal::ZERO, Decimal::ZERO));
                let expected_revenue = expected_sales_qty * selling_price;
                let actual_revenue = actual_sales_qty * selling_price;
                ProductVarianceRow {
                    product_id: product.id,
                    product_name: product.name,
                    expected_sales_qty,
                    actual_sales_qty,
                    selling_price,
                    expected_revenue,
                    actual_revenue,
                    variance_revenue: expected_revenue - actual_revenue,
                }
            })
            .collect();

        report.sort_by(|a, b| a.product_name.cmp(&b.product_name));

        Ok(report)
    }

    fn validate_counts(counts: &[(&str, Decimal)]) -> AppResult<()> {
        for (field, value) in counts {
            validate_count(*value).map_err(|message| AppError::Validation {
                field: field.to_string(),
                message: message.to_string(),
                message_th: "จำนวนที่นับต้องไม่ติดลบ".to_string(),
            })?;
        }
        Ok(())
    }
}
