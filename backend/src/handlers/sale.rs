//! HTTP handlers for the point of sale

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{AccessMode, Pagination, Section};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::sale::{RecordSaleInput, Sale, SaleDetail};
use crate::services::SaleService;
use crate::AppState;

/// Record a sale from the POS
pub async fn record_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordSaleInput>,
) -> AppResult<(StatusCode, Json<SaleDetail>)> {
    current_user
        .0
        .require_section(Section::Pos, AccessMode::Write)?;
    let service = SaleService::new(state.db);
    let sale = service.record(current_user.0.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// Receipt history
pub async fn list_sales(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<Sale>>> {
    current_user
        .0
        .require_section(Section::HistorialBoletas, AccessMode::Read)?;
    let service = SaleService::new(state.db);
    Ok(Json(service.list(page).await?))
}

pub async fn get_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleDetail>> {
    current_user
        .0
        .require_section(Section::HistorialBoletas, AccessMode::Read)?;
    let service = SaleService::new(state.db);
    Ok(Json(service.get(sale_id).await?))
}
