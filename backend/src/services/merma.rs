//! Merma (spoilage) service: moving products out of sellable stock and
//! valuing the losses

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{projected_loss, ExpiringStock, MermaState};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::product::{Product, PRODUCT_COLUMNS};

#[derive(Clone)]
pub struct MermaService {
    db: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct MoveToMermaInput {
    pub product_ids: Vec<Uuid>,
    /// expired, deteriorated or damaged; deteriorated when omitted
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MoveToMermaResult {
    pub moved: u64,
    pub reason: MermaState,
}

#[derive(Debug, Serialize)]
pub struct MermaReport {
    pub products: Vec<Product>,
    pub total_loss: Decimal,
    pub total_units: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LossProjection {
    pub days: i64,
    pub amount: Decimal,
    pub products: usize,
}

#[derive(Debug, FromRow)]
struct ExpiringStockRow {
    price: Decimal,
    quantity: i32,
    stock_actual: Option<i32>,
    expiration_date: Option<NaiveDate>,
}

impl From<ExpiringStockRow> for ExpiringStock {
    fn from(row: ExpiringStockRow) -> Self {
        Self {
            price: row.price,
            quantity: row.quantity,
            stock_actual: row.stock_actual,
            expiration_date: row.expiration_date,
        }
    }
}

impl MermaService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn move_to_merma(&self, input: MoveToMermaInput) -> AppResult<MoveToMermaResult> {
        let reason = shared::parse_merma_reason(
            input.reason.as_deref().unwrap_or(MermaState::Deteriorated.as_str()),
        )?;
        if input.product_ids.is_empty() {
            return Err(AppError::Validation {
                field: "product_ids".to_string(),
                message: "No products selected".to_string(),
                message_es: "No se seleccionaron productos".to_string(),
            });
        }

        let result = sqlx::query(
            r#"
            UPDATE products
            SET merma_state = $2, merma_at = NOW(), updated_at = NOW()
            WHERE id = ANY($1) AND lifecycle = 'live'
            "#,
        )
        .bind(&input.product_ids)
        .bind(reason.as_str())
        .execute(&self.db)
        .await?;

        tracing::info!(
            moved = result.rows_affected(),
            reason = reason.as_str(),
            "Products moved to merma"
        );

        Ok(MoveToMermaResult {
            moved: result.rows_affected(),
            reason,
        })
    }

    /// Live products in merma with their total value
    pub async fn list(&self) -> AppResult<MermaReport> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {}
            FROM products
            WHERE lifecycle = 'live' AND merma_state <> 'active'
            ORDER BY merma_at DESC NULLS LAST, name
            "#,
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        let total_loss = products
            .iter()
            .map(|p| p.price * Decimal::from(p.quantity))
            .sum();
        let total_units = products.iter().map(|p| i64::from(p.quantity)).sum();

        Ok(MermaReport {
            products,
            total_loss,
            total_units,
        })
    }

    /// Moves every active product whose expiration date has passed to
    /// merma state `expired`
    pub async fn expire_overdue(&self, today: NaiveDate) -> AppResult<Vec<Product>> {
        let moved = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET merma_state = 'expired', merma_at = NOW(), updated_at = NOW()
            WHERE lifecycle = 'live' AND merma_state = 'active' AND expiration_date < $1
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(today)
        .fetch_all(&self.db)
        .await?;

        for product in &moved {
            tracing::warn!(
                product_id = %product.id,
                name = %product.name,
                expiration_date = ?product.expiration_date,
                "Expired product moved to merma"
            );
        }

        Ok(moved)
    }

    /// Value of live stock expiring within `days` days
    pub async fn loss_projection(&self, today: NaiveDate, days: i64) -> AppResult<LossProjection> {
        let until = today + Duration::days(days);

        let items: Vec<ExpiringStock> = sqlx::query_as::<_, ExpiringStockRow>(
            r#"
            SELECT price, quantity, stock_actual, expiration_date
            FROM products
            WHERE lifecycle = 'live' AND expiration_date BETWEEN $1 AND $2
            "#,
        )
        .bind(today)
        .bind(until)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(ExpiringStock::from)
        .collect();

        Ok(LossProjection {
            days,
            amount: projected_loss(&items, today, days),
            products: items.len(),
        })
    }
}
