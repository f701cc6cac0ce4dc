//! API router configuration.

use std::future::IntoFuture;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use super::handlers::{
    cache_stats, clear_cache, dashboard, execute_command, health, list_processes, process_status,
    telemetry, terminate_process, AppState,
};
use crate::error::ToolRunnerError;

/// Create the API router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    let process_routes = Router::new()
        .route("/list", get(list_processes))
        .route("/status/{pid}", get(process_status))
        .route("/terminate/{pid}", post(terminate_process))
        .route("/dashboard", get(dashboard));

    let cache_routes = Router::new()
        .route("/stats", get(cache_stats))
        .route("/clear", post(clear_cache));

    let api = Router::new()
        .route("/command", post(execute_command))
        .route("/telemetry", get(telemetry))
        .nest("/processes", process_routes)
        .nest("/cache", cache_routes);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Let in-flight requests finish once shutdown is requested.
    pub graceful_shutdown: bool,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            graceful_shutdown: true,
        }
    }

    /// Drop open connections immediately on shutdown.
    pub fn without_graceful_shutdown(mut self) -> Self {
        self.graceful_shutdown = false;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 8888)
    }
}

/// Start the API server and run until `shutdown` flips to `true`.
pub async fn serve(
    config: ServerConfig,
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> crate::Result<()> {
    let addr = config.bind_address();
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(ToolRunnerError::Io)?;

    tracing::info!("Starting tool-runner API server on {}", addr);

    let stop = async move {
        let _ = shutdown.wait_for(|&requested| requested).await;
    };

    let served = if config.graceful_shutdown {
        axum::serve(listener, router)
            .with_graceful_shutdown(stop)
            .await
    } else {
        tokio::select! {
            served = axum::serve(listener, router).into_future() => served,
            _ = stop => Ok(()),
        }
    };

    served.map_err(|e| ToolRunnerError::Io(std::io::Error::other(e.to_string())))?;

    tracing::info!("API server stopped");
    Ok(())
}
