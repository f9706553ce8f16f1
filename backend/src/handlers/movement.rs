//! HTTP handlers for the kardex

use axum::{
    extract::{Query, State},
    Json,
};
use shared::{AccessMode, Section};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::movement::{Movement, MovementFilter};
use crate::services::MovementService;
use crate::AppState;

/// Inventory movements, newest first
pub async fn list_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<MovementFilter>,
) -> AppResult<Json<Vec<Movement>>> {
    current_user
        .0
        .require_section(Section::Movimientos, AccessMode::Read)?;
    let service = MovementService::new(state.db);
    Ok(Json(service.list(filter).await?))
}
