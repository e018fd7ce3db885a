// HTTP request handlers
use crate::application::aggregator::Aggregated;
use crate::application::dashboard_cache::{CacheEntry, CacheOutcome};
use crate::application::errors::{ClientError, DashboardError};
use crate::domain::dashboard::AdminDashboard;
use crate::domain::period::Period;
use crate::domain::records::ReportStatus;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

pub const USER_HEADER: &str = "x-user-id";

#[derive(Deserialize)]
pub struct PeriodQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: ReportStatus,
}

/// Aggregated view-model as sent to the UI
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardBody<'a, V: Serialize> {
    #[serde(flatten)]
    view: &'a V,
    degraded: bool,
    failed_sources: Vec<String>,
    fetched_at_epoch_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_error: Option<String>,
}

impl<'a, V: Serialize> DashboardBody<'a, V> {
    fn new(aggregated: &'a Aggregated<V>, fetched_at_epoch_ms: i64) -> Self {
        Self {
            view: &aggregated.view,
            degraded: aggregated.degraded(),
            failed_sources: aggregated.failed_sources(),
            fetched_at_epoch_ms,
            cache: None,
            refresh_error: None,
        }
    }
}

fn user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn error_response(status: StatusCode, code: &str, message: &str, compress: bool) -> Response {
    let body = json!({ "error": { "code": code, "message": message } });
    json_response(status, &body, compress).await
}

async fn dashboard_error_response(error: &DashboardError, compress: bool) -> Response {
    let (status, code) = match error {
        DashboardError::EngineerNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        DashboardError::InvalidPeriod { .. } => (StatusCode::BAD_REQUEST, "INVALID_PERIOD"),
        DashboardError::AllSourcesFailed(_) | DashboardError::Upstream(_) => {
            tracing::error!("Dashboard failed: {}", error);
            (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE")
        }
    };
    error_response(status, code, &error.to_string(), compress).await
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Admin dashboard, served from the TTL cache when fresh
pub async fn admin_dashboard(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);
    let user = user_id(&headers);

    let outcome = state
        .admin_cache
        .load_or_refresh(user.as_deref(), || state.dashboard_service.admin_dashboard())
        .await;
    admin_outcome_response(outcome, compress).await
}

/// User-triggered refresh: recompute even if the slot is fresh
pub async fn refresh_admin_dashboard(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let user = user_id(&headers);

    let outcome = state
        .admin_cache
        .force_refresh(user.as_deref(), || state.dashboard_service.admin_dashboard())
        .await;
    admin_outcome_response(outcome, compress).await
}

/// Logout / explicit cache clear
pub async fn clear_admin_cache(headers: HeaderMap, State(state): State<Arc<AppState>>) -> StatusCode {
    state.admin_cache.invalidate(user_id(&headers).as_deref()).await;
    StatusCode::NO_CONTENT
}

async fn admin_outcome_response(
    outcome: CacheOutcome<Aggregated<AdminDashboard>, DashboardError>,
    compress: bool,
) -> Response {
    let (entry, cache, refresh_error): (CacheEntry<_>, _, _) = match outcome {
        CacheOutcome::Fresh(entry) => (entry, "fresh", None),
        CacheOutcome::Refreshed(entry) => (entry, "refreshed", None),
        CacheOutcome::InFlight { stale: Some(entry) } => (entry, "stale", None),
        CacheOutcome::InFlight { stale: None } => {
            return json_response(StatusCode::ACCEPTED, &json!({ "loading": true }), compress).await;
        }
        CacheOutcome::Failed {
            error,
            stale: Some(entry),
        } => {
            tracing::error!("Admin dashboard refresh failed, serving stale data: {}", error);
            (entry, "stale", Some(error.to_string()))
        }
        CacheOutcome::Failed { error, stale: None } => {
            return dashboard_error_response(&error, compress).await;
        }
    };

    let mut body = DashboardBody::new(&entry.view_model, entry.fetched_at_epoch_ms);
    body.cache = Some(cache);
    body.refresh_error = refresh_error;
    json_response(StatusCode::OK, &body, compress).await
}

/// Sales dashboard (not cached)
pub async fn sales_dashboard(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);

    match state.dashboard_service.sales_dashboard().await {
        Ok(aggregated) => {
            let now = state.dashboard_service.clock().now_ms();
            json_response(StatusCode::OK, &DashboardBody::new(&aggregated, now), compress).await
        }
        Err(e) => dashboard_error_response(&e, compress).await,
    }
}

/// Dashboard for one engineer; defaults to the current month
pub async fn engineer_dashboard(
    Path(id): Path<String>,
    Query(query): Query<PeriodQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);

    let period = match (query.year, query.month) {
        (None, None) => None,
        (Some(year), Some(month)) => match Period::new(year, month) {
            Some(period) => Some(period),
            None => {
                let error = DashboardError::InvalidPeriod { year, month };
                return dashboard_error_response(&error, compress).await;
            }
        },
        (year, month) => {
            let error = DashboardError::InvalidPeriod {
                year: year.unwrap_or_default(),
                month: month.unwrap_or_default(),
            };
            return dashboard_error_response(&error, compress).await;
        }
    };

    match state.dashboard_service.engineer_dashboard(&id, period).await {
        Ok(aggregated) => {
            let now = state.dashboard_service.clock().now_ms();
            json_response(StatusCode::OK, &DashboardBody::new(&aggregated, now), compress).await
        }
        Err(e) => dashboard_error_response(&e, compress).await,
    }
}

/// Update a monthly report's status upstream, then drop the caller's admin slot
pub async fn update_report_status(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(update): Json<StatusUpdate>,
) -> Response {
    let compress = accepts_brotli(&headers);

    if update.status == ReportStatus::Unknown {
        return error_response(StatusCode::BAD_REQUEST, "INVALID_STATUS", "unknown report status", compress)
            .await;
    }

    let result = state
        .dashboard_service
        .repository()
        .update_report_status(&id, update.status)
        .await
        .and_then(|envelope| envelope.into_data());

    match result {
        Ok(report) => {
            tracing::info!("Report {} set to {}", report.id, report.status.as_str());
            state.admin_cache.invalidate(user_id(&headers).as_deref()).await;
            json_response(StatusCode::OK, &report, compress).await
        }
        Err(e) if e.is_not_found() => {
            error_response(StatusCode::NOT_FOUND, "NOT_FOUND", &e.to_string(), compress).await
        }
        Err(e @ ClientError::Rejected(_)) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, "REJECTED", &e.to_string(), compress).await
        }
        Err(e) => {
            tracing::error!("Report status update failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE", &e.to_string(), compress)
                .await
        }
    }
}
