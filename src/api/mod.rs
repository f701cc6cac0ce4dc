//! HTTP front end for the executor.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /api/command` - Execute a command (`{"command": "...", "use_cache": true}`)
//! - `GET /api/processes/list` - List live processes
//! - `GET /api/processes/status/{pid}` - Status of a live process
//! - `POST /api/processes/terminate/{pid}` - Terminate a process tree
//! - `GET /api/processes/dashboard` - Live process snapshot
//! - `GET /api/cache/stats` - Result cache statistics
//! - `POST /api/cache/clear` - Drop all cached results
//! - `GET /api/telemetry` - Uptime and counters
//!
//! ## Example
//!
//! ```no_run
//! use tool_runner::api::{serve, AppState, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> tool_runner::Result<()> {
//!     let (_tx, rx) = tokio::sync::watch::channel(false);
//!     serve(ServerConfig::default(), AppState::default(), rx).await
//! }
//! ```

pub mod handlers;
pub mod router;
pub mod types;

pub use handlers::AppState;
pub use router::{create_router, serve, ServerConfig};
pub use types::{
    CacheStatsResponse, CommandRequest, ErrorResponse, ExecuteResponse, ProcessListResponse,
    TelemetryResponse, TerminateResponse,
};
