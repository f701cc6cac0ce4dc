//! REST API handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::types::{
    CacheStatsResponse, CommandRequest, ErrorResponse, ExecuteResponse, ProcessListResponse,
    TelemetryResponse, TerminateResponse,
};
use crate::cache::TtlCache;
use crate::error::ToolRunnerError;
use crate::execution::{Executor, ExecutorConfig, DEFAULT_SUCCESS_TTL};
use crate::process::{Dashboard, ProcessInfo};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<Executor>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(executor: Arc<Executor>) -> Self {
        Self {
            executor,
            started_at: Instant::now(),
        }
    }
}

impl Default for AppState {
    /// State with a default executor and a cache without a background sweeper.
    fn default() -> Self {
        let cache = Arc::new(TtlCache::new(DEFAULT_SUCCESS_TTL));
        Self::new(Arc::new(Executor::new(ExecutorConfig::default(), cache)))
    }
}

/// Health check endpoint.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Execute a command.
pub async fn execute_command(
    State(state): State<AppState>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    if req.command.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("command must not be empty")),
        ));
    }

    let result = state.executor.execute(&req.command, req.use_cache).await;
    Ok(Json(ExecuteResponse::from_result(&result)))
}

/// List live processes.
pub async fn list_processes(State(state): State<AppState>) -> Json<ProcessListResponse> {
    let processes = state.executor.list_processes();
    Json(ProcessListResponse {
        count: processes.len(),
        processes,
    })
}

/// Get the status of a live process.
pub async fn process_status(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
) -> Result<Json<ProcessInfo>, ApiError> {
    state
        .executor
        .process_status(pid)
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::process_not_found(pid)),
            )
        })
}

/// Terminate a live process and its descendants.
pub async fn terminate_process(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
) -> Result<Json<TerminateResponse>, ApiError> {
    match state.executor.terminate_process(pid).await {
        Ok(()) => Ok(Json(TerminateResponse {
            message: "Process terminated".to_string(),
            pid,
        })),
        Err(ToolRunnerError::ProcessNotFound(pid)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::process_not_found(pid)),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::internal_error(e.to_string())),
        )),
    }
}

/// Process dashboard.
pub async fn dashboard(State(state): State<AppState>) -> Json<Dashboard> {
    Json(state.executor.dashboard())
}

/// Result cache statistics.
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(state.executor.cache_stats().into())
}

/// Drop every cached result.
pub async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.executor.clear_cache();
    StatusCode::NO_CONTENT
}

/// Service telemetry.
pub async fn telemetry(State(state): State<AppState>) -> Json<TelemetryResponse> {
    Json(TelemetryResponse {
        uptime_seconds: state.started_at.elapsed().as_secs_f64(),
        active_processes: state.executor.registry().len(),
        cached_results: state.executor.cache_stats().item_count,
    })
}
