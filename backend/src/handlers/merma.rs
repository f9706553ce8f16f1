//! HTTP handlers for merma (spoilage)

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::{AccessMode, Section};

use crate::error::AppResult;
use crate::handlers::today;
use crate::middleware::CurrentUser;
use crate::services::merma::{LossProjection, MermaReport, MoveToMermaInput, MoveToMermaResult};
use crate::services::product::Product;
use crate::services::MermaService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LossProjectionQuery {
    pub days: Option<i64>,
}

/// Products currently in merma with their accumulated loss
pub async fn list_merma(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<MermaReport>> {
    current_user
        .0
        .require_section(Section::Merma, AccessMode::Read)?;
    let service = MermaService::new(state.db);
    Ok(Json(service.list().await?))
}

pub async fn move_to_merma(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<MoveToMermaInput>,
) -> AppResult<Json<MoveToMermaResult>> {
    current_user
        .0
        .require_section(Section::Merma, AccessMode::Write)?;
    let service = MermaService::new(state.db);
    Ok(Json(service.move_to_merma(input).await?))
}

/// Move every product past its expiration date into merma
pub async fn expire_overdue(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    current_user
        .0
        .require_section(Section::Merma, AccessMode::Write)?;
    let service = MermaService::new(state.db);
    Ok(Json(service.expire_overdue(today()).await?))
}

pub async fn loss_projection(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<LossProjectionQuery>,
) -> AppResult<Json<LossProjection>> {
    current_user
        .0
        .require_section(Section::Merma, AccessMode::Read)?;
    let days = shared::validate_window_days(query.days)?;
    let service = MermaService::new(state.db);
    Ok(Json(service.loss_projection(today(), days).await?))
}
