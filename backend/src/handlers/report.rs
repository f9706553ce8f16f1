//! HTTP handlers for sales reports and the dashboard

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{AccessMode, Section};

use crate::error::AppResult;
use crate::handlers::today;
use crate::middleware::CurrentUser;
use crate::services::reporting::{
    DashboardMetrics, SalesReport, SalesReportFilter, TopProductsReport,
};
use crate::services::ReportingService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TopProductsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Sales totals for a date range, the current month by default
pub async fn sales_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<SalesReportFilter>,
) -> AppResult<Json<SalesReport>> {
    current_user
        .0
        .require_section(Section::Reportes, AccessMode::Read)?;
    let service = ReportingService::new(state.db);
    Ok(Json(service.sales_report(filter, today()).await?))
}

pub async fn top_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<TopProductsQuery>,
) -> AppResult<Json<TopProductsReport>> {
    current_user
        .0
        .require_section(Section::Reportes, AccessMode::Read)?;
    let service = ReportingService::new(state.db);
    let report = service
        .top_products(query.start_date, query.end_date, today())
        .await?;
    Ok(Json(report))
}

/// Dashboard metrics; refreshes alerts first
pub async fn dashboard(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<DashboardMetrics>> {
    current_user
        .0
        .require_section(Section::Dashboard, AccessMode::Read)?;
    let service = ReportingService::new(state.db);
    Ok(Json(service.dashboard(today()).await?))
}
