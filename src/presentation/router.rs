// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    admin_dashboard, clear_admin_cache, engineer_dashboard, health_check, refresh_admin_dashboard,
    sales_dashboard, update_report_status,
};
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboards/admin", get(admin_dashboard))
        .route("/dashboards/admin/refresh", post(refresh_admin_dashboard))
        .route("/dashboards/admin/cache", delete(clear_admin_cache))
        .route("/dashboards/sales", get(sales_dashboard))
        .route("/dashboards/engineers/:id", get(engineer_dashboard))
        .route("/reports/:id/status", put(update_report_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
