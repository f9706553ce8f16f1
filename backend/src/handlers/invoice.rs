//! HTTP handlers for supplier invoices

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{AccessMode, Section};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::today;
use crate::middleware::CurrentUser;
use crate::services::invoice::{
    AddInvoiceLineInput, CreateInvoiceInput, InvoiceDetail, InvoiceFilter, InvoiceReceipt,
    SupplierInvoice,
};
use crate::services::InvoiceService;
use crate::AppState;

pub async fn list_invoices(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<InvoiceFilter>,
) -> AppResult<Json<Vec<SupplierInvoice>>> {
    current_user
        .0
        .require_section(Section::FacturasProveedores, AccessMode::Read)?;
    let service = InvoiceService::new(state.db);
    Ok(Json(service.list(filter).await?))
}

/// Invoice header with its lines
pub async fn get_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<InvoiceDetail>> {
    current_user
        .0
        .require_section(Section::FacturasProveedores, AccessMode::Read)?;
    let service = InvoiceService::new(state.db);
    Ok(Json(service.get(invoice_id).await?))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateInvoiceInput>,
) -> AppResult<(StatusCode, Json<InvoiceDetail>)> {
    current_user
        .0
        .require_section(Section::FacturasProveedores, AccessMode::Write)?;
    let service = InvoiceService::new(state.db);
    let invoice = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn add_invoice_line(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<AddInvoiceLineInput>,
) -> AppResult<Json<InvoiceDetail>> {
    current_user
        .0
        .require_section(Section::FacturasProveedores, AccessMode::Write)?;
    let service = InvoiceService::new(state.db);
    Ok(Json(service.add_line(invoice_id, input).await?))
}

pub async fn remove_invoice_line(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((invoice_id, line_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<InvoiceDetail>> {
    current_user
        .0
        .require_section(Section::FacturasProveedores, AccessMode::Write)?;
    let service = InvoiceService::new(state.db);
    Ok(Json(service.remove_line(invoice_id, line_id).await?))
}

/// Receive the goods: every line enters stock as a purchase lot
pub async fn receive_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<InvoiceReceipt>> {
    current_user
        .0
        .require_section(Section::FacturasProveedores, AccessMode::Write)?;
    let service = InvoiceService::new(state.db);
    let receipt = service
        .receive(invoice_id, current_user.0.user_id, today())
        .await?;
    Ok(Json(receipt))
}

pub async fn pay_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<SupplierInvoice>> {
    current_user
        .0
        .require_section(Section::PagosProveedores, AccessMode::Write)?;
    let service = InvoiceService::new(state.db);
    Ok(Json(service.register_payment(invoice_id).await?))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user
        .0
        .require_section(Section::FacturasProveedores, AccessMode::Write)?;
    let service = InvoiceService::new(state.db);
    service.delete(invoice_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
