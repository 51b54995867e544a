//! Stock ledger: append-only movements and locked running balances
//!
//! Movements are an immutable audit trail. The per-item balance row is the
//! only mutable shared state in the core and is adjusted strictly under an
//! exclusive row lock, so concurrent writers to the same item serialize and
//! the moving average is always computed against the correct prior quantity.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ItemType, MovementType, StockBalance, StockMovement};
use shared::types::Pagination;
use shared::validation::validate_positive_quantity;

/// Stock ledger service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Input for recording a stock movement
#[derive(Debug, Clone, Deserialize)]
pub struct RecordMovementInput {
    pub item_type: ItemType,
    pub item_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub cost_per_unit: Option<Decimal>,
    pub vendor_id: Option<Uuid>,
    pub reference: Option<String>,
}

/// Apply a signed quantity delta to a balance, returning the new
/// (quantity, average_cost) pair.
///
/// Only an inbound delta with a known unit cost re-averages; outbound
/// movements never revalue the average. When the resulting quantity is not
/// positive the average degenerates to 0.
pub fn apply_stock_delta(
    quantity: Decimal,
    average_cost: Decimal,
    delta_qty: Decimal,
    cost_per_unit: Option<Decimal>,
) -> (Decimal, Decimal) {
    let new_qty = quantity + delta_qty;
    let new_avg = match cost_per_unit {
        Some(cost) if delta_qty > Decimal::ZERO => {
            if new_qty <= Decimal::ZERO {
                Decimal::ZERO
            } else {
                (average_cost * quantity + cost * delta_qty) / new_qty
            }
        }
        _ => average_cost,
    };
    (new_qty, new_avg)
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a stock movement audit row.
    ///
    /// Pure append; never fails due to balance state. Callers that change
    /// physical stock should prefer [`StockService::post_movement`], which
    /// also applies the balance effect in the same transaction.
    pub async fn record_movement(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        input: RecordMovementInput,
    ) -> AppResult<StockMovement> {
        Self::validate_quantity(input.quantity)?;
        Self::insert_movement(&self.db, business_id, user_id, &input).await
    }

    /// Adjust the running balance for an item by a signed delta.
    ///
    /// The only mutation point for stock balances. Takes an exclusive row
    /// lock on the (business, item type, item) balance before reading it;
    /// a missing row is created with the delta as its quantity.
    pub async fn upsert_balance(
        &self,
        business_id: Uuid,
        item_type: ItemType,
        item_id: Uuid,
        delta_qty: Decimal,
        cost_per_unit: Option<Decimal>,
    ) -> AppResult<StockBalance> {
        let mut tx = self.db.begin().await?;
        let balance = Self::upsert_balance_in_tx(
            &mut tx,
            business_id,
            item_type,
            item_id,
            delta_qty,
            cost_per_unit,
        )
        .await?;
        tx.commit().await?;
        Ok(balance)
    }

    /// Record a movement and apply its balance effect in one transaction,
    /// so an audit row never lands without the matching balance update.
    pub async fn post_movement(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        input: RecordMovementInput,
    ) -> AppResult<(StockMovement, StockBalance)> {
        Self::validate_quantity(input.quantity)?;

        let delta_qty = if input.movement_type.is_inbound() {
            input.quantity
        } else {
            -input.quantity
        };

        let mut tx = self.db.begin().await?;

        let movement = Self::insert_movement(&mut *tx, business_id, user_id, &input).await?;
        let balance = Self::upsert_balance_in_tx(
            &mut tx,
            business_id,
            input.item_type,
            input.item_id,
            delta_qty,
            input.cost_per_unit,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Posted stock movement {} ({:?} {}), new balance {}",
            movement.id,
            movement.movement_type,
            movement.quantity,
            balance.quantity
        );

        Ok((movement, balance))
    }

    /// Get the balance for an item, if any movement has been posted
    pub async fn get_balance(
        &self,
        business_id: Uuid,
        item_type: ItemType,
        item_id: Uuid,
    ) -> AppResult<Option<StockBalance>> {
        let balance = sqlx::query_as::<_, StockBalance>(
            r#"
            SELECT business_id, item_type, item_id, quantity, average_cost, updated_at
            FROM stock_balances
            WHERE business_id = $1 AND item_type = $2 AND item_id = $3
            "#,
        )
        .bind(business_id)
        .bind(item_type)
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(balance)
    }

    /// Movement history for one item, newest first
    pub async fn movements_for_item(
        &self,
        business_id: Uuid,
        item_type: ItemType,
        item_id: Uuid,
    ) -> AppResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, business_id, item_type, item_id, movement_type, quantity,
                   cost_per_unit, total_cost, vendor_id, reference, created_by, created_at
            FROM stock_movements
            WHERE business_id = $1 AND item_type = $2 AND item_id = $3
            ORDER BY created_at DESC
            "#,
        )
        .bind(business_id)
        .bind(item_type)
        .bind(item_id)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// List movements for a business, newest first
    pub async fn list_movements(
        &self,
        business_id: Uuid,
        pagination: &Pagination,
    ) -> AppResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, business_id, item_type, item_id, movement_type, quantity,
                   cost_per_unit, total_cost, vendor_id, reference, created_by, created_at
            FROM stock_movements
            WHERE business_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(business_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    fn validate_quantity(quantity: Decimal) -> AppResult<()> {
        validate_positive_quantity(quantity).map_err(|message| AppError::Validation {
            field: "quantity".to_string(),
            message: message.to_string(),
            message_th: "ปริมาณต้องมากกว่า 0".to_string(),
        })
    }

    async fn insert_movement<'e, E>(
        executor: E,
        business_id: Uuid,
        user_id: Uuid,
        input: &RecordMovementInput,
    ) -> AppResult<StockMovement>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let total_cost = input.cost_per_unit.map(|cost| cost * input.quantity);

        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (
                business_id, item_type, item_id, movement_type, quantity,
                cost_per_unit, total_cost, vendor_id, reference, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, business_id, item_type, item_id, movement_type, quantity,
                      cost_per_unit, total_cost, vendor_id, reference, created_by, created_at
            "#,
        )
        .bind(business_id)
        .bind(input.item_type)
        .bind(input.item_id)
        .bind(input.movement_type)
        .bind(input.quantity)
        .bind(input.cost_per_unit)
        .bind(total_cost)
        .bind(input.vendor_id)
        .bind(&input.reference)
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(movement)
    }

    async fn upsert_balance_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        business_id: Uuid,
        item_type: ItemType,
        item_id: Uuid,
        delta_qty: Decimal,
        cost_per_unit: Option<Decimal>,
    ) -> AppResult<StockBalance> {
        // Exclusive lock on the balance row; concurrent adjustments to the
        // same item queue up here.
        let existing = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT quantity, average_cost
            FROM stock_balances
            WHERE business_id = $1 AND item_type = $2 AND item_id = $3
            FOR UPDATE
            "#,
        )
        .bind(business_id)
        .bind(item_type)
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await?;

        let balance = match existing {
            None => {
                // First movement for this item. Two concurrent first
                // movements surface as a retryable conflict.
                sqlx::query_as::<_, StockBalance>(
                    r#"
                    INSERT INTO stock_balances (
                        business_id, item_type, item_id, quantity, average_cost
                    )
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING business_id, item_type, item_id, quantity, average_cost, updated_at
                    "#,
                )
                .bind(business_id)
                .bind(item_type)
                .bind(item_id)
                .bind(delta_qty)
                .bind(cost_per_unit.unwrap_or(Decimal::ZERO))
                .fetch_one(&mut **tx)
                .await
                .map_err(|err| match &err {
                    sqlx::Error::Database(db) if db.is_unique_violation() => {
                        AppError::ConcurrencyConflict("Stock balance".to_string())
                    }
                    _ => AppError::from(err),
                })?
            }
            Some((quantity, average_cost)) => {
                let (new_qty, new_avg) =
                    apply_stock_delta(quantity, average_cost, delta_qty, cost_per_unit);

                sqlx::query_as::<_, StockBalance>(
                    r#"
                    UPDATE stock_balances
                    SET quantity = $4, average_cost = $5, updated_at = NOW()
                    WHERE business_id = $1 AND item_type = $2 AND item_id = $3
                    RETURNING business_id, item_type, item_id, quantity, average_cost, updated_at
                    "#,
                )
                .bind(business_id)
                .bind(item_type)
                .bind(item_id)
                .bind(new_qty)
                .bind(new_avg)
                .fetch_one(&mut **tx)
                .await?
            }
        };

        Ok(balance)
    }
}
