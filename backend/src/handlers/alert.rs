//! HTTP handlers for expiry and low-stock alerts

use axum::{
    extract::{Path, Query, State},
    Json,
};
use shared::{AccessMode, AlertSweepSummary, Section};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::today;
use crate::middleware::CurrentUser;
use crate::services::alert::{Alert, AlertFilter, UpdateAlertStateInput};
use crate::services::AlertService;
use crate::AppState;

pub async fn list_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<AlertFilter>,
) -> AppResult<Json<Vec<Alert>>> {
    current_user
        .0
        .require_section(Section::Alertas, AccessMode::Read)?;
    let service = AlertService::new(state.db);
    Ok(Json(service.list(filter).await?))
}

/// Run the alert sweep now
pub async fn generate_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<AlertSweepSummary>> {
    current_user
        .0
        .require_section(Section::Alertas, AccessMode::Write)?;
    let service = AlertService::new(state.db);
    Ok(Json(service.generate(today()).await?))
}

/// Resolve or ignore an alert
pub async fn update_alert_state(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(alert_id): Path<Uuid>,
    Json(input): Json<UpdateAlertStateInput>,
) -> AppResult<Json<Alert>> {
    current_user
        .0
        .require_section(Section::Alertas, AccessMode::Write)?;
    let service = AlertService::new(state.db);
    let alert = service
        .update_state(alert_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(alert))
}
