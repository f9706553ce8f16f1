//! Alert generation and management
//!
//! The sweep walks every live, non-merma product once and keeps at most one
//! active alert per (product, category). Counts only include alerts that
//! were created or changed.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    evaluate_product, reconcile, AlertCategory, AlertDraft, AlertState, AlertSubject,
    AlertSweepSummary, AlertType, Reconciliation,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct AlertService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Alert {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    #[sqlx(try_from = "String")]
    pub alert_type: AlertType,
    #[sqlx(try_from = "String")]
    pub category: AlertCategory,
    #[sqlx(try_from = "String")]
    pub state: AlertState,
    pub message: String,
    pub generated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlertFilter {
    pub state: Option<AlertState>,
    pub alert_type: Option<AlertType>,
    pub category: Option<AlertCategory>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAlertStateInput {
    pub state: AlertState,
}

#[derive(Debug, FromRow)]
struct SweepProductRow {
    id: Uuid,
    name: String,
    quantity: i32,
    min_stock: Option<i32>,
    expiration_date: Option<NaiveDate>,
}

#[derive(Debug, FromRow)]
struct ActiveAlertRow {
    id: Uuid,
    product_id: Uuid,
    #[sqlx(try_from = "String")]
    category: AlertCategory,
    #[sqlx(try_from = "String")]
    alert_type: AlertType,
    message: String,
}

impl AlertService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Runs the alert sweep for `today` in a single transaction
    pub async fn generate(&self, today: NaiveDate) -> AppResult<AlertSweepSummary> {
        let mut tx = self.db.begin().await?;

        let products = sqlx::query_as::<_, SweepProductRow>(
            r#"
            SELECT id, name, quantity, min_stock, expiration_date
            FROM products
            WHERE lifecycle = 'live' AND merma_state = 'active'
            ORDER BY name
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let active: HashMap<(Uuid, AlertCategory), ActiveAlertRow> =
            sqlx::query_as::<_, ActiveAlertRow>(
                r#"
                SELECT id, product_id, category, alert_type, message
                FROM alerts
                WHERE state = 'active'
                "#,
            )
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|row| ((row.product_id, row.category), row))
            .collect();

        let mut summary = AlertSweepSummary::default();

        for product in &products {
            let evaluation = evaluate_product(
                &AlertSubject {
                    name: &product.name,
                    quantity: product.quantity,
                    min_stock: product.min_stock,
                    expiration_date: product.expiration_date,
                },
                today,
            );

            if let Some(draft) = evaluation.expiry {
                let existing = active.get(&(product.id, AlertCategory::Expiry));
                if apply_draft(&mut tx, product.id, existing, &draft).await? {
                    summary.record(&draft);
                }
            }

            match evaluation.low_stock {
                Some(draft) => {
                    let existing = active.get(&(product.id, AlertCategory::LowStock));
                    if apply_draft(&mut tx, product.id, existing, &draft).await? {
                        summary.record(&draft);
                    }
                }
                None => {
                    if active.contains_key(&(product.id, AlertCategory::LowStock)) {
                        resolve_category(&mut tx, product.id, AlertCategory::LowStock).await?;
                    }
                }
            }
        }

        tx.commit().await?;

        tracing::info!(
            products = products.len(),
            red = summary.red,
            yellow = summary.yellow,
            green = summary.green,
            low_stock = summary.low_stock,
            total = summary.total,
            "Alert sweep completed"
        );

        Ok(summary)
    }

    pub async fn list(&self, filter: AlertFilter) -> AppResult<Vec<Alert>> {
        let alerts = sqlx::query_as::<_, Alert>(
            r#"
            SELECT a.id, a.product_id, p.name AS product_name, a.alert_type, a.category,
                   a.state, a.message, a.generated_at, a.closed_at
            FROM alerts a
            JOIN products p ON p.id = a.product_id
            WHERE ($1::TEXT IS NULL OR a.state = $1)
              AND ($2::TEXT IS NULL OR a.alert_type = $2)
              AND ($3::TEXT IS NULL OR a.category = $3)
            ORDER BY a.generated_at DESC
            "#,
        )
        .bind(filter.state.map(|s| s.as_str()))
        .bind(filter.alert_type.map(|t| t.as_str()))
        .bind(filter.category.map(|c| c.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(alerts)
    }

    /// Marks an alert resolved or ignored
    pub async fn update_state(
        &self,
        alert_id: Uuid,
        user_id: Uuid,
        input: UpdateAlertStateInput,
    ) -> AppResult<Alert> {
        if input.state == AlertState::Active {
            return Err(AppError::Validation {
                field: "state".to_string(),
                message: "Alerts can only be resolved or ignored".to_string(),
                message_es: "Las alertas solo pueden resolverse o ignorarse".to_string(),
            });
        }

        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE alerts
            SET state = $2, closed_at = NOW(), closed_by = $3
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(alert_id)
        .bind(input.state.as_str())
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Alert".to_string()))?;

        self.get(updated).await
    }

    pub async fn get(&self, alert_id: Uuid) -> AppResult<Alert> {
        sqlx::query_as::<_, Alert>(
            r#"
            SELECT a.id, a.product_id, p.name AS product_name, a.alert_type, a.category,
                   a.state, a.message, a.generated_at, a.closed_at
            FROM alerts a
            JOIN products p ON p.id = a.product_id
            WHERE a.id = $1
            "#,
        )
        .bind(alert_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Alert".to_string()))
    }
}

/// Creates or updates the active alert for the draft's category. Returns
/// whether anything was written.
async fn apply_draft(
    conn: &mut PgConnection,
    product_id: Uuid,
    existing: Option<&ActiveAlertRow>,
    draft: &AlertDraft,
) -> AppResult<bool> {
    let current = existing.map(|row| (row.alert_type, row.message.as_str()));

    match (reconcile(current, draft), existing) {
        (Reconciliation::Unchanged, _) => Ok(false),
        (Reconciliation::Update, Some(row)) => {
            sqlx::query(
                r#"
                UPDATE alerts
                SET alert_type = $2, message = $3, generated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(row.id)
            .bind(draft.alert_type.as_str())
            .bind(&draft.message)
            .execute(&mut *conn)
            .await?;
            Ok(true)
        }
        _ => {
            sqlx::query(
                r#"
                INSERT INTO alerts (product_id, alert_type, category, state, message)
                VALUES ($1, $2, $3, 'active', $4)
                "#,
            )
            .bind(product_id)
            .bind(draft.alert_type.as_str())
            .bind(draft.category.as_str())
            .bind(&draft.message)
            .execute(&mut *conn)
            .await?;
            Ok(true)
        }
    }
}

async fn resolve_category(
    conn: &mut PgConnection,
    product_id: Uuid,
    category: AlertCategory,
) -> AppResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE alerts
        SET state = 'resolved', closed_at = NOW()
        WHERE product_id = $1 AND category = $2 AND state = 'active'
        "#,
    )
    .bind(product_id)
    .bind(category.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}
