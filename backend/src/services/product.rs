//! Product catalogue service

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{catalogue_key, LotOrigin, MermaState, MovementOrigin, ProductLifecycle};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::stock::{stock_in, MovementContext};

#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub product_type: Option<String>,
    pub format: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub stock_actual: Option<i32>,
    pub min_stock: Option<i32>,
    pub max_stock: Option<i32>,
    pub expiration_date: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub merma_state: MermaState,
    #[sqlx(try_from = "String")]
    pub lifecycle: ProductLifecycle,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, description, brand, product_type, format, \
     price, quantity, stock_actual, min_stock, max_stock, expiration_date, merma_state, \
     lifecycle, deleted_at, created_at, updated_at";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    pub product_type: Option<String>,
    pub format: Option<String>,
    pub price: Decimal,
    /// Opening stock; creates the first lot when positive
    #[serde(default)]
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub min_stock: Option<i32>,
    pub max_stock: Option<i32>,
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    pub product_type: Option<String>,
    pub format: Option<String>,
    pub price: Option<Decimal>,
    pub min_stock: Option<i32>,
    pub max_stock: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductSearch {
    pub q: Option<String>,
}

impl ProductService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Live products ordered by name, one entry per (name, brand)
    pub async fn list(&self, search: ProductSearch) -> AppResult<Vec<Product>> {
        let pattern = search
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q));

        let rows = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {}
            FROM products
            WHERE lifecycle = 'live'
              AND ($1::TEXT IS NULL
                   OR name ILIKE $1 OR brand ILIKE $1
                   OR product_type ILIKE $1 OR format ILIKE $1)
            ORDER BY name, created_at
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;

        let mut seen = HashSet::new();
        Ok(rows
            .into_iter()
            .filter(|p| seen.insert(catalogue_key(&p.name, p.brand.as_deref())))
            .collect())
    }

    pub async fn get(&self, product_id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1 AND lifecycle = 'live'",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Creates a product; positive opening stock becomes its first lot
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateProductInput,
        today: NaiveDate,
    ) -> AppResult<Product> {
        input.validate()?;
        shared::validate_price(input.price)?;
        shared::validate_stock_thresholds(input.min_stock, input.max_stock)?;

        let mut tx = self.db.begin().await?;

        let product_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO products (name, description, brand, product_type, format, price,
                                  quantity, stock_actual, min_stock, max_stock)
            VALUES ($1, $2, $3, $4, $5, $6, 0, 0, $7, $8)
            RETURNING id
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(&input.brand)
        .bind(&input.product_type)
        .bind(&input.format)
        .bind(input.price)
        .bind(input.min_stock)
        .bind(input.max_stock)
        .fetch_one(&mut *tx)
        .await?;

        if input.quantity > 0 {
            stock_in(
                &mut tx,
                product_id,
                input.quantity,
                input.expiration_date,
                LotOrigin::Opening,
                MovementContext {
                    origin: MovementOrigin::Opening,
                    reference: None,
                    note: None,
                    user_id: Some(user_id),
                },
                today,
            )
            .await?;
        } else if input.expiration_date.is_some() {
            sqlx::query("UPDATE products SET expiration_date = $2 WHERE id = $1")
                .bind(product_id)
                .bind(input.expiration_date)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(%product_id, name = %input.name, opening = input.quantity, "Product created");

        self.get(product_id).await
    }

    pub async fn update(&self, product_id: Uuid, input: UpdateProductInput) -> AppResult<Product> {
        input.validate()?;
        if let Some(price) = input.price {
            shared::validate_price(price)?;
        }

        let current = self.get(product_id).await?;
        shared::validate_stock_thresholds(
            input.min_stock.or(current.min_stock),
            input.max_stock.or(current.max_stock),
        )?;

        sqlx::query(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                brand = COALESCE($4, brand),
                product_type = COALESCE($5, product_type),
                format = COALESCE($6, format),
                price = COALESCE($7, price),
                min_stock = COALESCE($8, min_stock),
                max_stock = COALESCE($9, max_stock),
                updated_at = NOW()
            WHERE id = $1 AND lifecycle = 'live'
            "#,
        )
        .bind(product_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.description)
        .bind(&input.brand)
        .bind(&input.product_type)
        .bind(&input.format)
        .bind(input.price)
        .bind(input.min_stock)
        .bind(input.max_stock)
        .execute(&self.db)
        .await?;

        self.get(product_id).await
    }

    /// Soft delete: the row and its history stay, listings skip it
    pub async fn delete(&self, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET lifecycle = 'deleted', deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND lifecycle = 'live'
            "#,
        )
        .bind(product_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        tracing::info!(%product_id, "Product deleted");
        Ok(())
    }

    /// Live products expiring within `[today, today + days]`
    pub async fn expiring(&self, today: NaiveDate, days: Option<i64>) -> AppResult<Vec<Product>> {
        let days = shared::validate_window_days(days)?;
        let until = today + Duration::days(days);

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {}
            FROM products
            WHERE lifecycle = 'live'
              AND expiration_date BETWEEN $1 AND $2
            ORDER BY expiration_date, name
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(today)
        .bind(until)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }
}
