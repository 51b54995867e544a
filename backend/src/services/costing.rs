//! Product cost computation pipeline
//!
//! Derives per-unit product cost from recipe, packaging, labour and overhead
//! inputs and resolves a selling price or margin. The stages run in order
//! (recipe, packaging, labour, opex) because percent-of-COGS overhead depends
//! on the result of the prior three. Pure read computation, no side effects.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{OpexAllocationMode, OpexItem};
use shared::validation::{is_window_active, validate_margin_fraction, validate_selling_price};

/// Costing service computing per-unit product costs
#[derive(Clone)]
pub struct CostingService {
    db: PgPool,
}

/// Options for a cost computation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComputeCostOptions {
    /// Units produced per batch; defaults to 1 when absent or non-positive
    pub batch_size: Option<Decimal>,
    /// Target margin as a fraction (0.2 = 20%); resolves a selling price
    pub margin_percent: Option<Decimal>,
    /// Given selling price; resolves a margin
    pub selling_price: Option<Decimal>,
}

/// One recipe line of the itemized cost breakdown
#[derive(Debug, Clone, Serialize)]
pub struct RecipeComponentCost {
    pub material_id: Uuid,
    pub material_name: String,
    pub unit: Option<String>,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub line_cost: Decimal,
}

/// Result of a full cost computation. All component costs are per unit.
#[derive(Debug, Clone, Serialize)]
pub struct CostResult {
    pub product_id: Uuid,
    pub batch_size: Decimal,
    pub recipe_cost: Decimal,
    pub packaging_cost: Decimal,
    pub labour_cost: Decimal,
    pub opex_cost: Decimal,
    /// Pre-overhead cost of goods sold per unit
    pub cogs: Decimal,
    /// Total cost of production per unit
    pub tcop: Decimal,
    pub margin_percent: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub components: Vec<RecipeComponentCost>,
}

/// Row for the recipe line query
#[derive(Debug, FromRow)]
struct RecipeLineRow {
    material_id: Uuid,
    material_name: String,
    unit: Option<String>,
    quantity: Decimal,
}

/// Unit cost of a material from its most recent purchase.
/// A non-positive purchase quantity yields 0 rather than dividing by it.
pub fn purchase_unit_cost(purchase_price: Decimal, purchase_qty: Decimal) -> Decimal {
    if purchase_qty > Decimal::ZERO {
        purchase_price / purchase_qty
    } else {
        Decimal::ZERO
    }
}

/// Batch size guarded against division by zero: absent, zero or negative
/// values fall back to 1.
pub fn effective_batch_size(batch_size: Option<Decimal>) -> Decimal {
    match batch_size {
        Some(size) if size > Decimal::ZERO => size,
        _ => Decimal::ONE,
    }
}

/// Total overhead per batch from the OPEX items active on the given date.
///
/// Fixed items contribute their amount; percent-of-COGS items contribute
/// `percentage_value/100 × cogs_per_unit`.
pub fn overhead_total(items: &[OpexItem], cogs_per_unit: Decimal, on: NaiveDate) -> Decimal {
    items
        .iter()
        .filter(|item| is_window_active(item.start_date, item.end_date, on))
        .map(|item| match item.allocation_mode {
            OpexAllocationMode::Fixed => item.amount,
            OpexAllocationMode::PercentOfCogs => {
                item.percentage_value / Decimal::from(100) * cogs_per_unit
            }
        })
        .sum()
}

/// Resolve the pricing pair (margin, selling price) for a given TCOP.
///
/// Exactly one of margin or selling price may be supplied. A supplied margin
/// must be a fraction in (0, 1); a supplied price must be positive. With
/// neither supplied both stay unset, which is a valid result.
pub fn resolve_pricing(
    tcop: Decimal,
    margin_percent: Option<Decimal>,
    selling_price: Option<Decimal>,
) -> AppResult<(Option<Decimal>, Option<Decimal>)> {
    match (margin_percent, selling_price) {
        (Some(_), Some(_)) => Err(AppError::Validation {
            field: "margin_percent/selling_price".to_string(),
            message: "Provide either a target margin or a selling price, not both".to_string(),
            message_th: "ต้องระบุอัตรากำไรหรือราคาขายอย่างใดอย่างหนึ่ง".to_string(),
        }),
        (Some(margin), None) => {
            validate_margin_fraction(margin).map_err(|message| AppError::Validation {
                field: "margin_percent".to_string(),
                message: message.to_string(),
                message_th: "อัตรากำไรต้องอยู่ระหว่าง 0 ถึง 1".to_string(),
            })?;
            let price = tcop / (Decimal::ONE - margin);
            Ok((Some(margin), Some(price)))
        }
        (None, Some(price)) => {
            validate_selling_price(price).map_err(|message| AppError::Validation {
                field: "selling_price".to_string(),
                message: message.to_string(),
                message_th: "ราคาขายต้องมากกว่า 0".to_string(),
            })?;
            let margin = (price - tcop) / price;
            Ok((Some(margin), Some(price)))
        }
        (None, None) => Ok((None, None)),
    }
}

impl CostingService {
    /// Create a new CostingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Unit cost of a material: most recent purchase's price divided by its
    /// quantity, or 0 when the material has never been purchased.
    pub async fn latest_unit_cost(&self, business_id: Uuid, material_id: Uuid) -> AppResult<Decimal> {
        let latest = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT purchase_price, purchase_qty
            FROM material_purchases
            WHERE business_id = $1 AND material_id = $2
            ORDER BY purchase_date DESC, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(business_id)
        .bind(material_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(latest.map_or(Decimal::ZERO, |(price, qty)| purchase_unit_cost(price, qty)))
    }

    /// Compute the full per-unit cost of a product.
    ///
    /// A product with no recipe lines, packaging, labour or overhead yields
    /// zero components rather than an error.
    pub async fn compute_product_cost(
        &self,
        business_id: Uuid,
        product_id: Uuid,
        options: &ComputeCostOptions,
    ) -> AppResult<CostResult> {
        // Validate product belongs to business
        let product_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND business_id = $2)",
        )
        .bind(product_id)
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let batch_size = effective_batch_size(options.batch_size);
        let today = Utc::now().date_naive();

        // Stage 1: recipe cost per batch, itemized
        let lines = sqlx::query_as::<_, RecipeLineRow>(
            r#"
            SELECT rl.material_id, m.name AS material_name, rl.unit, rl.quantity
            FROM recipe_lines rl
            JOIN materials m ON m.id = rl.material_id
            WHERE rl.product_id = $1 AND rl.business_id = $2
            ORDER BY m.name ASC
            "#,
        )
        .bind(product_id)
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        let mut components = Vec::with_capacity(lines.len());
        let mut recipe_batch_total = Decimal::ZERO;
        for line in lines {
            let unit_cost = self.latest_unit_cost(business_id, line.material_id).await?;
            let line_cost = unit_cost * line.quantity;
            recipe_batch_total += line_cost;
            components.push(RecipeComponentCost {
                material_id: line.material_id,
                material_name: line.material_name,
                unit: line.unit,
                quantity: line.quantity,
                unit_cost,
                line_cost,
            });
        }

        // Stage 2: packaging cost per batch
        let packaging_batch_total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(pa.quantity * p.cost_per_unit), 0)
            FROM packaging_assignments pa
            JOIN packagings p ON p.id = pa.packaging_id
            WHERE pa.product_id = $1 AND pa.business_id = $2
            "#,
        )
        .bind(product_id)
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        // Stage 3: labour cost pool active today, per batch
        let labour_batch_total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM labour_costs
            WHERE business_id = $1
              AND (start_date IS NULL OR start_date <= $2)
              AND (end_date IS NULL OR end_date >= $2)
            "#,
        )
        .bind(business_id)
        .bind(today)
        .fetch_one(&self.db)
        .await?;

        let recipe_cost = recipe_batch_total / batch_size;
        let packaging_cost = packaging_batch_total / batch_size;
        let labour_cost = labour_batch_total / batch_size;
        let cogs = recipe_cost + packaging_cost + labour_cost;

        // Stage 4: overhead, which may reference the pre-overhead COGS
        let opex_items = sqlx::query_as::<_, OpexItem>(
            r#"
            SELECT id, business_id, name, allocation_mode, amount, percentage_value,
                   estimated_monthly_sales, start_date, end_date, created_at
            FROM opex_items
            WHERE business_id = $1
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        let opex_cost = overhead_total(&opex_items, cogs, today) / batch_size;
        let tcop = cogs + opex_cost;

        let (margin_percent, selling_price) =
            resolve_pricing(tcop, options.margin_percent, options.selling_price)?;

        Ok(CostResult {
            product_id,
            batch_size,
            recipe_cost,
            packaging_cost,
            labour_cost,
            opex_cost,
            cogs,
            tcop,
            margin_percent,
            selling_price,
            components,
        })
    }
}
