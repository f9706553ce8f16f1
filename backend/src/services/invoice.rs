//! Supplier invoice service: lines, totals, receipt into stock and payment

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    document_totals, LotOrigin, MovementOrigin, MovementReference, PaymentState, PricedLine,
    ReceptionState, ReferenceType,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::stock::{stock_in, MovementContext, StockLevel};

#[derive(Clone)]
pub struct InvoiceService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierInvoice {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub net_amount: Decimal,
    pub iva_amount: Decimal,
    pub total_amount: Decimal,
    #[sqlx(try_from = "String")]
    pub reception_state: ReceptionState,
    pub received_on: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub payment_state: PaymentState,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InvoiceLine {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount_pct: Decimal,
    pub subtotal: Decimal,
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: SupplierInvoice,
    pub lines: Vec<InvoiceLine>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceInput {
    pub supplier_id: Uuid,
    #[validate(length(min = 1, max = 50))]
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddInvoiceLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_pct: Decimal,
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceFilter {
    pub supplier_id: Option<Uuid>,
    pub reception_state: Option<ReceptionState>,
    pub payment_state: Option<PaymentState>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceReceipt {
    pub invoice: SupplierInvoice,
    pub stock: Vec<StockLevel>,
}

#[derive(Debug, FromRow)]
struct InvoiceStatusRow {
    #[sqlx(try_from = "String")]
    reception_state: ReceptionState,
}

#[derive(Debug, FromRow)]
struct PricedLineRow {
    quantity: i32,
    unit_price: Decimal,
    discount_pct: Decimal,
}

const INVOICE_SELECT: &str = r#"
    SELECT i.id, i.supplier_id, s.name AS supplier_name, i.invoice_number, i.issue_date,
           i.due_date, i.net_amount, i.iva_amount, i.total_amount, i.reception_state,
           i.received_on, i.payment_state, i.paid_at, i.notes, i.created_at
    FROM supplier_invoices i
    JOIN suppliers s ON s.id = i.supplier_id
"#;

impl InvoiceService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: InvoiceFilter) -> AppResult<Vec<SupplierInvoice>> {
        let invoices = sqlx::query_as::<_, SupplierInvoice>(&format!(
            r#"
            {}
            WHERE i.lifecycle = 'live'
              AND ($1::UUID IS NULL OR i.supplier_id = $1)
              AND ($2::TEXT IS NULL OR i.reception_state = $2)
              AND ($3::TEXT IS NULL OR i.payment_state = $3)
            ORDER BY i.issue_date DESC, i.created_at DESC
            "#,
            INVOICE_SELECT
        ))
        .bind(filter.supplier_id)
        .bind(filter.reception_state.map(|s| s.as_str()))
        .bind(filter.payment_state.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(invoices)
    }

    pub async fn get(&self, invoice_id: Uuid) -> AppResult<InvoiceDetail> {
        let invoice = self.fetch_invoice(invoice_id).await?;
        let lines = sqlx::query_as::<_, InvoiceLine>(
            r#"
            SELECT l.id, l.invoice_id, l.product_id, p.name AS product_name, l.quantity,
                   l.unit_price, l.discount_pct, l.subtotal, l.expiration_date
            FROM supplier_invoice_lines l
            JOIN products p ON p.id = l.product_id
            WHERE l.invoice_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.db)
        .await?;

        Ok(InvoiceDetail { invoice, lines })
    }

    pub async fn create(&self, input: CreateInvoiceInput) -> AppResult<InvoiceDetail> {
        input.validate()?;

        let supplier_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1 AND lifecycle = 'live')",
        )
        .bind(input.supplier_id)
        .fetch_one(&self.db)
        .await?;

        if !supplier_exists {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        let invoice_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO supplier_invoices (supplier_id, invoice_number, issue_date, due_date, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(input.supplier_id)
        .bind(input.invoice_number.trim())
        .bind(input.issue_date)
        .bind(input.due_date)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await?;

        self.get(invoice_id).await
    }

    pub async fn add_line(&self, invoice_id: Uuid, input: AddInvoiceLineInput) -> AppResult<InvoiceDetail> {
        shared::validate_quantity(input.quantity)?;
        shared::validate_unit_price(input.unit_price)?;
        shared::validate_discount(input.discount_pct)?;

        let mut tx = self.db.begin().await?;
        ensure_editable(&mut tx, invoice_id).await?;

        let product_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND lifecycle = 'live')",
        )
        .bind(input.product_id)
        .fetch_one(&mut *tx)
        .await?;

        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let line = PricedLine {
            quantity: input.quantity,
            unit_price: input.unit_price,
            discount_pct: input.discount_pct,
        };

        sqlx::query(
            r#"
            INSERT INTO supplier_invoice_lines (invoice_id, product_id, quantity, unit_price,
                                                discount_pct, subtotal, expiration_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(invoice_id)
        .bind(input.product_id)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(input.discount_pct)
        .bind(line.subtotal())
        .bind(input.expiration_date)
        .execute(&mut *tx)
        .await?;

        refresh_totals(&mut tx, invoice_id).await?;
        tx.commit().await?;

        tracing::info!(%invoice_id, product_id = %input.product_id, quantity = input.quantity, "Invoice line added");

        self.get(invoice_id).await
    }

    pub async fn remove_line(&self, invoice_id: Uuid, line_id: Uuid) -> AppResult<InvoiceDetail> {
        let mut tx = self.db.begin().await?;
        ensure_editable(&mut tx, invoice_id).await?;

        let result = sqlx::query("DELETE FROM supplier_invoice_lines WHERE id = $1 AND invoice_id = $2")
            .bind(line_id)
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Invoice line".to_string()));
        }

        refresh_totals(&mut tx, invoice_id).await?;
        tx.commit().await?;

        self.get(invoice_id).await
    }

    /// Marks the invoice received and stocks in every line as a purchase lot
    pub async fn receive(
        &self,
        invoice_id: Uuid,
        user_id: Uuid,
        today: NaiveDate,
    ) -> AppResult<InvoiceReceipt> {
        let mut tx = self.db.begin().await?;

        let status = fetch_status(&mut tx, invoice_id).await?;
        if status.reception_state == ReceptionState::Received {
            return Err(AppError::Conflict {
                resource: "invoice".to_string(),
                message: "This invoice has already been received".to_string(),
                message_es: "Esta factura ya fue recibida anteriormente".to_string(),
            });
        }

        sqlx::query(
            r#"
            UPDATE supplier_invoices
            SET reception_state = 'received', received_on = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(invoice_id)
        .bind(today)
        .execute(&mut *tx)
        .await?;

        let lines = sqlx::query_as::<_, (Uuid, i32, Option<NaiveDate>)>(
            r#"
            SELECT product_id, quantity, expiration_date
            FROM supplier_invoice_lines
            WHERE invoice_id = $1
            ORDER BY id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&mut *tx)
        .await?;

        let ctx = MovementContext {
            origin: MovementOrigin::Purchase,
            reference: Some(MovementReference {
                kind: ReferenceType::SupplierInvoice,
                id: invoice_id,
            }),
            note: None,
            user_id: Some(user_id),
        };

        let mut stock = Vec::with_capacity(lines.len());
        for (product_id, quantity, expiration_date) in lines {
            let received = stock_in(
                &mut tx,
                product_id,
                quantity,
                expiration_date,
                LotOrigin::Purchase,
                ctx,
                today,
            )
            .await?;
            stock.push(received.level);
        }

        tx.commit().await?;

        tracing::info!(%invoice_id, products = stock.len(), "Supplier invoice received");

        Ok(InvoiceReceipt {
            invoice: self.fetch_invoice(invoice_id).await?,
            stock,
        })
    }

    pub async fn register_payment(&self, invoice_id: Uuid) -> AppResult<SupplierInvoice> {
        let result = sqlx::query(
            r#"
            UPDATE supplier_invoices
            SET payment_state = 'paid', paid_at = COALESCE(paid_at, NOW()), updated_at = NOW()
            WHERE id = $1 AND lifecycle = 'live'
            "#,
        )
        .bind(invoice_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Invoice".to_string()));
        }

        tracing::info!(%invoice_id, "Supplier invoice paid");
        self.fetch_invoice(invoice_id).await
    }

    pub async fn delete(&self, invoice_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE supplier_invoices
            SET lifecycle = 'deleted', deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND lifecycle = 'live'
            "#,
        )
        .bind(invoice_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Invoice".to_string()));
        }
        Ok(())
    }

    async fn fetch_invoice(&self, invoice_id: Uuid) -> AppResult<SupplierInvoice> {
        sqlx::query_as::<_, SupplierInvoice>(&format!(
            "{} WHERE i.id = $1 AND i.lifecycle = 'live'",
            INVOICE_SELECT
        ))
        .bind(invoice_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))
    }
}

async fn fetch_status(conn: &mut PgConnection, invoice_id: Uuid) -> AppResult<InvoiceStatusRow> {
    sqlx::query_as::<_, InvoiceStatusRow>(
        "SELECT reception_state FROM supplier_invoices WHERE id = $1 AND lifecycle = 'live'",
    )
    .bind(invoice_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Invoice".to_string()))
}

/// Lines are frozen once the goods are in stock
async fn ensure_editable(conn: &mut PgConnection, invoice_id: Uuid) -> AppResult<()> {
    let status = fetch_status(conn, invoice_id).await?;
    if status.reception_state == ReceptionState::Received {
        return Err(AppError::Conflict {
            resource: "invoice".to_string(),
            message: "Lines of a received invoice cannot change".to_string(),
            message_es: "No se pueden modificar líneas de una factura recibida".to_string(),
        });
    }
    Ok(())
}

async fn refresh_totals(conn: &mut PgConnection, invoice_id: Uuid) -> AppResult<()> {
    let lines: Vec<PricedLine> = sqlx::query_as::<_, PricedLineRow>(
        "SELECT quantity, unit_price, discount_pct FROM supplier_invoice_lines WHERE invoice_id = $1",
    )
    .bind(invoice_id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|row| PricedLine {
        quantity: row.quantity,
        unit_price: row.unit_price,
        discount_pct: row.discount_pct,
    })
    .collect();

    let totals = document_totals(&lines);

    sqlx::query(
        r#"
        UPDATE supplier_invoices
        SET net_amount = $2, iva_amount = $3, total_amount = $4, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(invoice_id)
    .bind(totals.net)
    .bind(totals.iva)
    .bind(totals.total)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
