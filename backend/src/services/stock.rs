//! Stock ledger: FIFO lot consumption, stock-in and manual adjustments
//!
//! `consume_fifo` and `stock_in` run on a caller-owned connection so sales
//! and invoice receipts can fold them into their own transaction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    earliest_expiration, generate_lot_number, plan_fifo_consumption, LotBalance, LotDraw,
    LotOrigin, LotState, MovementDirection, MovementOrigin, MovementReference, ProductLifecycle,
    ReferenceType,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Stock service for adjustments and lot queries
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Inventory lot
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Lot {
    pub id: Uuid,
    pub product_id: Uuid,
    pub lot_number: String,
    pub initial_quantity: i32,
    pub remaining_quantity: i32,
    pub expiration_date: Option<NaiveDate>,
    pub received_at: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub origin: LotOrigin,
    #[sqlx(try_from = "String")]
    pub state: LotState,
}

/// Who and what caused a stock change
#[derive(Debug, Clone, Copy)]
pub struct MovementContext<'a> {
    pub origin: MovementOrigin,
    pub reference: Option<MovementReference>,
    pub note: Option<&'a str>,
    pub user_id: Option<Uuid>,
}

/// Product state after a stock change
#[derive(Debug, Clone, Serialize)]
pub struct StockLevel {
    pub product_id: Uuid,
    pub quantity: i32,
    pub stock_actual: Option<i32>,
    pub expiration_date: Option<NaiveDate>,
    pub movement_id: Uuid,
}

/// Result of a FIFO consumption
#[derive(Debug, Clone, Serialize)]
pub struct Consumption {
    #[serde(flatten)]
    pub level: StockLevel,
    pub draws: Vec<LotDrawView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LotDrawView {
    pub lot_id: Uuid,
    pub taken: i32,
    pub remaining: i32,
    pub state: LotState,
}

impl From<LotDraw> for LotDrawView {
    fn from(draw: LotDraw) -> Self {
        Self {
            lot_id: draw.lot_id,
            taken: draw.taken,
            remaining: draw.remaining,
            state: draw.state,
        }
    }
}

/// Result of a stock-in
#[derive(Debug, Clone, Serialize)]
pub struct StockIn {
    #[serde(flatten)]
    pub level: StockLevel,
    pub lot: Lot,
}

/// Input for a manual stock adjustment
#[derive(Debug, Deserialize)]
pub struct StockAdjustmentInput {
    pub product_id: Uuid,
    pub direction: MovementDirection,
    pub quantity: i32,
    pub reason: Option<String>,
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockAdjustment {
    pub adjustment_id: Uuid,
    pub product_id: Uuid,
    pub direction: MovementDirection,
    pub quantity: i32,
    pub new_quantity: i32,
    pub expiration_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot: Option<Lot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub draws: Vec<LotDrawView>,
}

#[derive(Debug, FromRow)]
struct LotBalanceRow {
    id: Uuid,
    remaining_quantity: i32,
    expiration_date: Option<NaiveDate>,
    received_at: DateTime<Utc>,
}

impl From<LotBalanceRow> for LotBalance {
    fn from(row: LotBalanceRow) -> Self {
        Self {
            lot_id: row.id,
            remaining: row.remaining_quantity,
            expiration_date: row.expiration_date,
            received_at: row.received_at,
        }
    }
}

const LOT_COLUMNS: &str = "id, product_id, lot_number, initial_quantity, remaining_quantity, \
                           expiration_date, received_at, origin, state";

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Apply a manual adjustment: `in` creates a lot, `out` consumes FIFO
    pub async fn adjust(
        &self,
        user_id: Uuid,
        input: StockAdjustmentInput,
        today: NaiveDate,
    ) -> AppResult<StockAdjustment> {
        shared::validate_quantity(input.quantity)?;
        let reason = input
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        let mut tx = self.db.begin().await?;

        // Fails with NotFound before anything is written
        ensure_live_product(&mut tx, input.product_id).await?;

        let adjustment_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO stock_adjustments (product_id, direction, quantity, reason, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(input.product_id)
        .bind(input.direction.as_str())
        .bind(input.quantity)
        .bind(reason)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let ctx = MovementContext {
            origin: MovementOrigin::Adjustment,
            reference: Some(MovementReference {
                kind: ReferenceType::Adjustment,
                id: adjustment_id,
            }),
            note: reason,
            user_id: Some(user_id),
        };

        let adjustment = match input.direction {
            MovementDirection::In => {
                let result = stock_in(
                    &mut tx,
                    input.product_id,
                    input.quantity,
                    input.expiration_date,
                    LotOrigin::Adjustment,
                    ctx,
                    today,
                )
                .await?;
                StockAdjustment {
                    adjustment_id,
                    product_id: input.product_id,
                    direction: input.direction,
                    quantity: input.quantity,
                    new_quantity: result.level.quantity,
                    expiration_date: result.level.expiration_date,
                    lot: Some(result.lot),
                    draws: Vec::new(),
                }
            }
            MovementDirection::Out => {
                let result = consume_fifo(&mut tx, input.product_id, input.quantity, ctx).await?;
                StockAdjustment {
                    adjustment_id,
                    product_id: input.product_id,
                    direction: input.direction,
                    quantity: input.quantity,
                    new_quantity: result.level.quantity,
                    expiration_date: result.level.expiration_date,
                    lot: None,
                    draws: result.draws,
                }
            }
        };

        tx.commit().await?;

        tracing::info!(
            product_id = %adjustment.product_id,
            direction = adjustment.direction.as_str(),
            quantity = adjustment.quantity,
            new_quantity = adjustment.new_quantity,
            "Stock adjusted"
        );

        Ok(adjustment)
    }

    /// Lots of a product, FIFO order first, depleted lots after active ones
    pub async fn list_lots(&self, product_id: Uuid) -> AppResult<Vec<Lot>> {
        let lots = sqlx::query_as::<_, Lot>(&format!(
            r#"
            SELECT {}
            FROM lots
            WHERE product_id = $1
            ORDER BY (state = 'active') DESC, expiration_date ASC NULLS LAST, received_at ASC
            "#,
            LOT_COLUMNS
        ))
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(lots)
    }
}

/// Consumes `quantity` units of a product from its active lots, oldest
/// expiration first, and records one outgoing movement.
///
/// On insufficient stock nothing has been written.
pub async fn consume_fifo(
    conn: &mut PgConnection,
    product_id: Uuid,
    quantity: i32,
    ctx: MovementContext<'_>,
) -> AppResult<Consumption> {
    shared::validate_quantity(quantity)?;
    ensure_live_product(conn, product_id).await?;

    let mut balances = active_lot_balances(conn, product_id).await?;
    let draws = plan_fifo_consumption(&balances, quantity)?;

    for draw in &draws {
        sqlx::query("UPDATE lots SET remaining_quantity = $2, state = $3 WHERE id = $1")
            .bind(draw.lot_id)
            .bind(draw.remaining)
            .bind(draw.state.as_str())
            .execute(&mut *conn)
            .await?;

        if let Some(balance) = balances.iter_mut().find(|b| b.lot_id == draw.lot_id) {
            balance.remaining = draw.remaining;
        }
    }

    let expiration_date = earliest_expiration(&balances);
    let (new_quantity, stock_actual) = sqlx::query_as::<_, (i32, Option<i32>)>(
        r#"
        UPDATE products
        SET quantity = GREATEST(quantity - $2, 0),
            stock_actual = CASE WHEN stock_actual IS NULL THEN NULL
                                ELSE GREATEST(stock_actual - $2, 0) END,
            expiration_date = $3,
            updated_at = NOW()
        WHERE id = $1
        RETURNING quantity, stock_actual
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(expiration_date)
    .fetch_one(&mut *conn)
    .await?;

    let movement_id =
        record_movement(conn, product_id, MovementDirection::Out, quantity, ctx).await?;

    tracing::debug!(
        %product_id,
        quantity,
        lots = draws.len(),
        origin = ctx.origin.as_str(),
        "FIFO consumption applied"
    );

    Ok(Consumption {
        level: StockLevel {
            product_id,
            quantity: new_quantity,
            stock_actual,
            expiration_date,
            movement_id,
        },
        draws: draws.into_iter().map(LotDrawView::from).collect(),
    })
}

/// Receives `quantity` units into a new lot and records one incoming movement
pub async fn stock_in(
    conn: &mut PgConnection,
    product_id: Uuid,
    quantity: i32,
    expiration_date: Option<NaiveDate>,
    origin: LotOrigin,
    ctx: MovementContext<'_>,
    today: NaiveDate,
) -> AppResult<StockIn> {
    shared::validate_quantity(quantity)?;
    ensure_live_product(conn, product_id).await?;

    let next = sqlx::query_scalar::<_, i64>("SELECT nextval('lot_number_seq')")
        .fetch_one(&mut *conn)
        .await?;
    let sequence = u32::try_from(next)
        .map_err(|_| AppError::Internal("lot sequence overflow".to_string()))?;

    let lot = sqlx::query_as::<_, Lot>(&format!(
        r#"
        INSERT INTO lots (product_id, lot_number, initial_quantity, remaining_quantity,
                          expiration_date, origin, state)
        VALUES ($1, $2, $3, $3, $4, $5, 'active')
        RETURNING {}
        "#,
        LOT_COLUMNS
    ))
    .bind(product_id)
    .bind(generate_lot_number(today, sequence))
    .bind(quantity)
    .bind(expiration_date)
    .bind(origin.as_str())
    .fetch_one(&mut *conn)
    .await?;

    let balances = active_lot_balances(conn, product_id).await?;
    let expiration_date = earliest_expiration(&balances);

    let (new_quantity, stock_actual) = sqlx::query_as::<_, (i32, Option<i32>)>(
        r#"
        UPDATE products
        SET quantity = quantity + $2,
            stock_actual = CASE WHEN stock_actual IS NULL THEN NULL
                                ELSE stock_actual + $2 END,
            expiration_date = $3,
            updated_at = NOW()
        WHERE id = $1
        RETURNING quantity, stock_actual
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(expiration_date)
    .fetch_one(&mut *conn)
    .await?;

    let movement_id =
        record_movement(conn, product_id, MovementDirection::In, quantity, ctx).await?;

    Ok(StockIn {
        level: StockLevel {
            product_id,
            quantity: new_quantity,
            stock_actual,
            expiration_date,
            movement_id,
        },
        lot,
    })
}

/// Fails with NotFound for unknown or deleted products
async fn ensure_live_product(conn: &mut PgConnection, product_id: Uuid) -> AppResult<()> {
    let lifecycle =
        sqlx::query_scalar::<_, String>("SELECT lifecycle FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    match lifecycle.as_deref().map(str::parse::<ProductLifecycle>) {
        Some(Ok(ProductLifecycle::Live)) => Ok(()),
        _ => Err(AppError::NotFound("Product".to_string())),
    }
}

async fn active_lot_balances(conn: &mut PgConnection, product_id: Uuid) -> AppResult<Vec<LotBalance>> {
    let rows = sqlx::query_as::<_, LotBalanceRow>(
        r#"
        SELECT id, remaining_quantity, expiration_date, received_at
        FROM lots
        WHERE product_id = $1 AND state = 'active'
        ORDER BY expiration_date ASC NULLS LAST, received_at ASC
        "#,
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(LotBalance::from).collect())
}

async fn record_movement(
    conn: &mut PgConnection,
    product_id: Uuid,
    direction: MovementDirection,
    quantity: i32,
    ctx: MovementContext<'_>,
) -> AppResult<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO inventory_movements (product_id, direction, quantity, origin,
                                         reference_type, reference_id, note, user_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(product_id)
    .bind(direction.as_str())
    .bind(quantity)
    .bind(ctx.origin.as_str())
    .bind(ctx.reference.map(|r| r.kind.as_str()))
    .bind(ctx.reference.map(|r| r.id))
    .bind(ctx.note)
    .bind(ctx.user_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}
