//! HTTP handlers for manual stock adjustments

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::handlers::today;
use crate::middleware::CurrentUser;
use crate::services::stock::{StockAdjustment, StockAdjustmentInput};
use crate::services::StockService;
use crate::AppState;

/// Record a stock adjustment. `in` opens a new lot, `out` consumes FIFO.
pub async fn adjust_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<StockAdjustmentInput>,
) -> AppResult<(StatusCode, Json<StockAdjustment>)> {
    current_user.0.require_stock_adjustment()?;

    let service = StockService::new(state.db);
    let adjustment = service
        .adjust(current_user.0.user_id, input, today())
        .await?;
    Ok((StatusCode::CREATED, Json(adjustment)))
}
