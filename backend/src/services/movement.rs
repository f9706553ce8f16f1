//! Kardex queries over recorded inventory movements

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{MovementDirection, MovementOrigin, Pagination};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Clone)]
pub struct MovementService {
    db: PgPool,
}

/// Kardex row with the product name joined in
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Movement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    #[sqlx(try_from = "String")]
    pub direction: MovementDirection,
    pub quantity: i32,
    #[sqlx(try_from = "String")]
    pub origin: MovementOrigin,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub note: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub direction: Option<MovementDirection>,
    pub product_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl MovementService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Newest movements first
    pub async fn list(&self, filter: MovementFilter) -> AppResult<Vec<Movement>> {
        let defaults = Pagination::default();
        let page = Pagination {
            page: filter.page.unwrap_or(defaults.page),
            per_page: filter.per_page.unwrap_or(defaults.per_page),
        };

        let movements = sqlx::query_as::<_, Movement>(
            r#"
            SELECT m.id, m.product_id, p.name AS product_name, m.direction, m.quantity,
                   m.origin, m.reference_type, m.reference_id, m.note, m.user_id, m.created_at
            FROM inventory_movements m
            JOIN products p ON p.id = m.product_id
            WHERE ($1::TEXT IS NULL OR m.direction = $1)
              AND ($2::UUID IS NULL OR m.product_id = $2)
            ORDER BY m.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.direction.map(|d| d.as_str()))
        .bind(filter.product_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }
}
