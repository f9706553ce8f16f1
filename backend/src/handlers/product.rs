//! HTTP handlers for the product catalogue

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{AccessMode, Section};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::today;
use crate::middleware::CurrentUser;
use crate::services::product::{CreateProductInput, Product, ProductSearch, UpdateProductInput};
use crate::services::stock::Lot;
use crate::services::{ProductService, StockService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<i64>,
}

/// List live products, optionally filtered by a search term
pub async fn list_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(search): Query<ProductSearch>,
) -> AppResult<Json<Vec<Product>>> {
    current_user
        .0
        .require_section(Section::Inventario, AccessMode::Read)?;
    let service = ProductService::new(state.db);
    Ok(Json(service.list(search).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    current_user
        .0
        .require_section(Section::Inventario, AccessMode::Read)?;
    let service = ProductService::new(state.db);
    Ok(Json(service.get(product_id).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<Product>)> {
    current_user
        .0
        .require_section(Section::Inventario, AccessMode::Write)?;
    let service = ProductService::new(state.db);
    let product = service
        .create(current_user.0.user_id, input, today())
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    current_user
        .0
        .require_section(Section::Inventario, AccessMode::Write)?;
    let service = ProductService::new(state.db);
    Ok(Json(service.update(product_id, input).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user
        .0
        .require_section(Section::Inventario, AccessMode::Write)?;
    let service = ProductService::new(state.db);
    service.delete(product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Products expiring within the next `days` days (7 by default)
pub async fn expiring_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ExpiringQuery>,
) -> AppResult<Json<Vec<Product>>> {
    current_user
        .0
        .require_section(Section::Inventario, AccessMode::Read)?;
    let service = ProductService::new(state.db);
    Ok(Json(service.expiring(today(), query.days).await?))
}

/// Lots of a product in FIFO order
pub async fn list_product_lots(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<Lot>>> {
    current_user
        .0
        .require_section(Section::Inventario, AccessMode::Read)?;
    let service = StockService::new(state.db);
    Ok(Json(service.list_lots(product_id).await?))
}
