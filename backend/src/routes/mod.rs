//! Route definitions for the Fornería API

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Full application router with state applied
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes(state.clone()))
        .with_state(state)
}

/// Create API routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Auth routes (public)
        .nest("/auth", auth_routes(state.clone()))
        .merge(protected_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(handlers::me))
        .route("/users", get(handlers::list_users).post(handlers::create_user))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .merge(protected)
}

/// Everything behind a bearer token
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .route("/stock/adjustments", post(handlers::adjust_stock))
        .route("/movements", get(handlers::list_movements))
        .nest("/alerts", alert_routes())
        .nest("/merma", merma_routes())
        .nest("/suppliers", supplier_routes())
        .nest("/invoices", invoice_routes())
        .nest("/sales", sale_routes())
        .nest("/reports", report_routes())
        .route("/dashboard", get(handlers::dashboard))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route("/expiring", get(handlers::expiring_products))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:product_id/lots", get(handlers::list_product_lots))
}

fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_alerts))
        .route("/generate", post(handlers::generate_alerts))
        .route("/:alert_id", put(handlers::update_alert_state))
}

fn merma_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_merma).post(handlers::move_to_merma))
        .route("/expire", post(handlers::expire_overdue))
        .route("/projection", get(handlers::loss_projection))
}

fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_suppliers).post(handlers::create_supplier))
        .route(
            "/:supplier_id",
            get(handlers::get_supplier)
                .put(handlers::update_supplier)
                .delete(handlers::delete_supplier),
        )
}

fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_invoices).post(handlers::create_invoice))
        .route(
            "/:invoice_id",
            get(handlers::get_invoice).delete(handlers::delete_invoice),
        )
        .route("/:invoice_id/lines", post(handlers::add_invoice_line))
        .route(
            "/:invoice_id/lines/:line_id",
            delete(handlers::remove_invoice_line),
        )
        .route("/:invoice_id/receive", post(handlers::receive_invoice))
        .route("/:invoice_id/payment", post(handlers::pay_invoice))
}

fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::record_sale))
        .route("/:sale_id", get(handlers::get_sale))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(handlers::sales_report))
        .route("/top-products", get(handlers::top_products))
}
