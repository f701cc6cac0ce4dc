//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::execution::ExecutionResult;
use crate::process::ProcessInfo;

/// Request to execute a command.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRequest {
    /// The command line, passed verbatim to the shell.
    pub command: String,
    /// Whether to consult and populate the result cache.
    #[serde(default)]
    pub use_cache: bool,
}

/// Response for command execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResponse {
    /// Whether the command exited with code 0.
    pub success: bool,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Exit code, or -1 if the process never started.
    pub return_code: i32,
    /// Execution time in seconds.
    pub execution_time: f64,
    /// Process ID, if the process was started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Whether the command hit its deadline.
    pub timed_out: bool,
}

impl ExecuteResponse {
    pub fn from_result(result: &ExecutionResult) -> Self {
        Self {
            success: result.success,
            stdout: result.stdout_text().into_owned(),
            stderr: result.stderr_text().into_owned(),
            return_code: result.return_code,
            execution_time: result.execution_time_secs(),
            pid: result.pid,
            timed_out: result.timed_out,
        }
    }
}

/// Process list response.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessListResponse {
    /// Number of live processes.
    pub count: usize,
    /// Live processes.
    pub processes: Vec<ProcessInfo>,
}

/// Response for a successful termination.
#[derive(Debug, Clone, Serialize)]
pub struct TerminateResponse {
    pub message: String,
    pub pid: u32,
}

/// Result cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    /// Stored entries.
    pub items: usize,
    /// Default TTL in seconds.
    pub default_ttl_secs: u64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            items: stats.item_count,
            default_ttl_secs: stats.default_ttl.as_secs(),
        }
    }
}

/// Service telemetry.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryResponse {
    pub uptime_seconds: f64,
    pub active_processes: usize,
    pub cached_results: usize,
}

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "PROCESS_NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn process_not_found(pid: u32) -> Self {
        Self::new("PROCESS_NOT_FOUND", format!("Process {} not found", pid))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}
