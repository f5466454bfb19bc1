//! System API endpoints: status, health probes and log access.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{LogDto, LogResponse, SystemStatus};
use crate::constants::limits;
use crate::db::SiteStatus;

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReadinessChecks {
    pub database: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub checks: HealthReadinessChecks,
}

/// `GET /api/system/status`
///
/// Platform-wide counts plus process uptime and version.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let accounts = state
        .store()
        .list_accounts()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to count accounts: {e}")))?;

    let sites = state
        .store()
        .list_all_sites()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to count sites: {e}")))?;

    let public_sites = sites
        .iter()
        .filter(|s| SiteStatus::parse(&s.status) == Some(SiteStatus::Public))
        .count();

    let posts = state
        .store()
        .list_active_posts(None)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to count posts: {e}")))?;

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time().elapsed().as_secs(),
        accounts: accounts.len(),
        sites: sites.len(),
        public_sites,
        posts: posts.len(),
    })))
}

/// `GET /api/system/health/live`
///
/// Lightweight liveness probe to indicate the API process is running.
pub async fn health_live() -> impl IntoResponse {
    Json(ApiResponse::success(HealthLiveResponse { status: "alive" }))
}

/// `GET /api/system/health/ready`
///
/// Readiness probe that checks database connectivity.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> Response {
    let db_ready = state.store().ping().await.is_ok();

    let status = if db_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::success(HealthReadyResponse {
            ready: db_ready,
            checks: HealthReadinessChecks { database: db_ready },
        })),
    )
        .into_response()
}

// ============================================================================
// Logs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    pub level: Option<String>,
    pub event_type: Option<String>,
}

const fn default_page() -> u64 {
    1
}

const fn default_page_size() -> u64 {
    limits::DEFAULT_LOG_PAGE_SIZE
}

/// `GET /api/system/logs`
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<ApiResponse<LogResponse>>, ApiError> {
    let (logs, total_pages) = state
        .store()
        .get_logs(
            query.page,
            query.page_size.clamp(1, 500),
            query.level,
            query.event_type,
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load logs: {e}")))?;

    Ok(Json(ApiResponse::success(LogResponse {
        logs: logs.into_iter().map(LogDto::from).collect(),
        total_pages,
    })))
}

/// `DELETE /api/system/logs`
pub async fn clear_logs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .store()
        .clear_logs()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to clear logs: {e}")))?;

    tracing::info!("System logs cleared");

    Ok(Json(ApiResponse::success(())))
}
