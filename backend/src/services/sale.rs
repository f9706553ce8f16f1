//! Point of sale: recording sales and consuming their stock

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    compute_change, document_totals, format_folio, MovementOrigin, MovementReference, Pagination,
    PricedLine, ReferenceType, SalesChannel,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::stock::{consume_fifo, MovementContext};

#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub folio: String,
    pub sold_at: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub channel: SalesChannel,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub net_total: Decimal,
    pub iva_total: Decimal,
    pub total: Decimal,
    pub discount_total: Decimal,
    pub amount_paid: Decimal,
    pub change_given: Decimal,
    pub user_id: Option<Uuid>,
    pub seller_username: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount_pct: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

#[derive(Debug, Deserialize)]
pub struct SaleLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub discount_pct: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct RecordSaleInput {
    pub lines: Vec<SaleLineInput>,
    pub channel: SalesChannel,
    pub customer_id: Option<Uuid>,
    pub amount_paid: Decimal,
}

#[derive(Debug, FromRow)]
struct SellableProductRow {
    id: Uuid,
    price: Decimal,
}

pub(crate) const SALE_SELECT: &str = r#"
    SELECT s.id, s.folio, s.sold_at, s.channel, s.customer_id, c.name AS customer_name,
           s.net_total, s.iva_total, s.total, s.discount_total, s.amount_paid,
           s.change_given, s.user_id, u.username AS seller_username
    FROM sales s
    LEFT JOIN customers c ON c.id = s.customer_id
    LEFT JOIN users u ON u.id = s.user_id
"#;

impl SaleService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Records a sale and consumes every line FIFO in one transaction
    pub async fn record(&self, user_id: Uuid, input: RecordSaleInput) -> AppResult<SaleDetail> {
        if input.lines.is_empty() {
            return Err(AppError::Validation {
                field: "lines".to_string(),
                message: "A sale needs at least one line".to_string(),
                message_es: "La venta debe tener al menos un producto".to_string(),
            });
        }
        for line in &input.lines {
            shared::validate_quantity(line.quantity)?;
            shared::validate_discount(line.discount_pct)?;
        }

        let mut tx = self.db.begin().await?;

        let product_ids: Vec<Uuid> = input.lines.iter().map(|l| l.product_id).collect();
        let sellable = sqlx::query_as::<_, SellableProductRow>(
            r#"
            SELECT id, price
            FROM products
            WHERE id = ANY($1) AND lifecycle = 'live' AND merma_state = 'active'
            "#,
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?;

        let mut priced = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let product = sellable
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
            priced.push(PricedLine {
                quantity: line.quantity,
                unit_price: product.price,
                discount_pct: line.discount_pct,
            });
        }

        let totals = document_totals(&priced);
        let change = compute_change(totals.total, input.amount_paid).map_err(|e| {
            AppError::Validation {
                field: "amount_paid".to_string(),
                message: e.to_string(),
                message_es: format!(
                    "El monto pagado ({}) es menor al total ({})",
                    e.paid, e.total
                ),
            }
        })?;

        let sequence = sqlx::query_scalar::<_, i64>("SELECT nextval('sale_folio_seq')")
            .fetch_one(&mut *tx)
            .await?;
        let folio = format_folio(sequence);

        let sale_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO sales (folio, channel, customer_id, net_total, iva_total, total,
                               discount_total, amount_paid, change_given, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&folio)
        .bind(input.channel.as_str())
        .bind(input.customer_id)
        .bind(totals.net)
        .bind(totals.iva)
        .bind(totals.total)
        .bind(totals.discount)
        .bind(input.amount_paid)
        .bind(change)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let ctx = MovementContext {
            origin: MovementOrigin::Sale,
            reference: Some(MovementReference {
                kind: ReferenceType::Sale,
                id: sale_id,
            }),
            note: Some(folio.as_str()),
            user_id: Some(user_id),
        };

        for (line, priced_line) in input.lines.iter().zip(&priced) {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (sale_id, product_id, quantity, unit_price, discount_pct, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(sale_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(priced_line.unit_price)
            .bind(priced_line.discount_pct)
            .bind(priced_line.subtotal())
            .execute(&mut *tx)
            .await?;

            consume_fifo(&mut tx, line.product_id, line.quantity, ctx).await?;
        }

        tx.commit().await?;

        tracing::info!(
            %sale_id,
            folio = %folio,
            total = %totals.total,
            lines = input.lines.len(),
            "Sale recorded"
        );

        self.get(sale_id).await
    }

    pub async fn get(&self, sale_id: Uuid) -> AppResult<SaleDetail> {
        let sale = sqlx::query_as::<_, Sale>(&format!("{} WHERE s.id = $1", SALE_SELECT))
            .bind(sale_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT l.id, l.product_id, p.name AS product_name, l.quantity, l.unit_price,
                   l.discount_pct, l.subtotal
            FROM sale_lines l
            JOIN products p ON p.id = l.product_id
            WHERE l.sale_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleDetail { sale, lines })
    }

    /// Receipt history, newest first
    pub async fn list(&self, page: Pagination) -> AppResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "{} ORDER BY s.sold_at DESC LIMIT $1 OFFSET $2",
            SALE_SELECT
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(sales)
    }
}
