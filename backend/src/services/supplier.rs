//! Supplier management service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::SupplierState;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub rut: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    #[sqlx(try_from = "String")]
    pub state: SupplierState,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Supplier listing row with invoice statistics
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub supplier: Supplier,
    pub invoice_count: i64,
    pub pending_invoice_count: i64,
    pub pending_amount: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SupplierInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub rut: Option<String>,
    #[validate(length(max = 200))]
    pub contact_name: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub state: Option<SupplierState>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SupplierFilter {
    pub q: Option<String>,
    pub state: Option<SupplierState>,
}

const SUPPLIER_COLUMNS: &str = "s.id, s.name, s.rut, s.contact_name, s.phone, s.email, s.address, \
     s.city, s.region, s.state, s.notes, s.created_at, s.updated_at";

impl SupplierService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: SupplierFilter) -> AppResult<Vec<SupplierSummary>> {
        let pattern = filter
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q));

        let suppliers = sqlx::query_as::<_, SupplierSummary>(&format!(
            r#"
            SELECT {},
                   COUNT(i.id) AS invoice_count,
                   COUNT(i.id) FILTER (WHERE i.payment_state = 'pending') AS pending_invoice_count,
                   COALESCE(SUM(i.total_amount) FILTER (WHERE i.payment_state = 'pending'), 0)
                       AS pending_amount
            FROM suppliers s
            LEFT JOIN supplier_invoices i ON i.supplier_id = s.id AND i.lifecycle = 'live'
            WHERE s.lifecycle = 'live'
              AND ($1::TEXT IS NULL
                   OR s.name ILIKE $1 OR s.rut ILIKE $1
                   OR s.contact_name ILIKE $1 OR s.email ILIKE $1)
              AND ($2::TEXT IS NULL OR s.state = $2)
            GROUP BY s.id
            ORDER BY s.name
            "#,
            SUPPLIER_COLUMNS
        ))
        .bind(pattern)
        .bind(filter.state.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }

    pub async fn get(&self, supplier_id: Uuid) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {} FROM suppliers s WHERE s.id = $1 AND s.lifecycle = 'live'",
            SUPPLIER_COLUMNS
        ))
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    pub async fn create(&self, input: SupplierInput) -> AppResult<Supplier> {
        input.validate()?;
        let rut = self.checked_rut(input.rut.as_deref(), None).await?;

        let supplier_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO suppliers (name, rut, contact_name, phone, email, address, city,
                                   region, state, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(input.name.trim())
        .bind(rut)
        .bind(&input.contact_name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.region)
        .bind(input.state.unwrap_or(SupplierState::Active).as_str())
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(%supplier_id, name = %input.name, "Supplier created");
        self.get(supplier_id).await
    }

    pub async fn update(&self, supplier_id: Uuid, input: SupplierInput) -> AppResult<Supplier> {
        input.validate()?;
        self.get(supplier_id).await?;
        let rut = self.checked_rut(input.rut.as_deref(), Some(supplier_id)).await?;

        sqlx::query(
            r#"
            UPDATE suppliers
            SET name = $2, rut = $3, contact_name = $4, phone = $5, email = $6,
                address = $7, city = $8, region = $9, state = $10, notes = $11,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(supplier_id)
        .bind(input.name.trim())
        .bind(rut)
        .bind(&input.contact_name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.region)
        .bind(input.state.unwrap_or(SupplierState::Active).as_str())
        .bind(&input.notes)
        .execute(&self.db)
        .await?;

        self.get(supplier_id).await
    }

    pub async fn delete(&self, supplier_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE suppliers
            SET lifecycle = 'deleted', deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND lifecycle = 'live'
            "#,
        )
        .bind(supplier_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplier".to_string()));
        }
        Ok(())
    }

    /// Validates the RUT check digit and rejects one already used by another
    /// live supplier. Blank RUTs are stored as NULL.
    async fn checked_rut(&self, rut: Option<&str>, exclude: Option<Uuid>) -> AppResult<Option<String>> {
        let Some(rut) = rut.map(str::trim).filter(|r| !r.is_empty()) else {
            return Ok(None);
        };
        shared::validate_rut(rut)?;

        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM suppliers
                WHERE rut = $1 AND lifecycle = 'live' AND ($2::UUID IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(rut)
        .bind(exclude)
        .fetch_one(&self.db)
        .await?;

        if taken {
            return Err(AppError::Conflict {
                resource: "rut".to_string(),
                message: "A supplier with this RUT already exists".to_string(),
                message_es: "Ya existe un proveedor con ese RUT".to_string(),
            });
        }

        Ok(Some(rut.to_string()))
    }
}
