//! HTTP handlers for supplier management

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{AccessMode, Section};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::supplier::{Supplier, SupplierFilter, SupplierInput, SupplierSummary};
use crate::services::SupplierService;
use crate::AppState;

/// Suppliers with invoice counts and pending amounts
pub async fn list_suppliers(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<SupplierFilter>,
) -> AppResult<Json<Vec<SupplierSummary>>> {
    current_user
        .0
        .require_section(Section::Proveedores, AccessMode::Read)?;
    let service = SupplierService::new(state.db);
    Ok(Json(service.list(filter).await?))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<Supplier>> {
    current_user
        .0
        .require_section(Section::Proveedores, AccessMode::Read)?;
    let service = SupplierService::new(state.db);
    Ok(Json(service.get(supplier_id).await?))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<SupplierInput>,
) -> AppResult<(StatusCode, Json<Supplier>)> {
    current_user
        .0
        .require_section(Section::Proveedores, AccessMode::Write)?;
    let service = SupplierService::new(state.db);
    let supplier = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
    Json(input): Json<SupplierInput>,
) -> AppResult<Json<Supplier>> {
    current_user
        .0
        .require_section(Section::Proveedores, AccessMode::Write)?;
    let service = SupplierService::new(state.db);
    Ok(Json(service.update(supplier_id, input).await?))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user
        .0
        .require_section(Section::Proveedores, AccessMode::Write)?;
    let service = SupplierService::new(state.db);
    service.delete(supplier_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
