//! Error types for tool-runner.

use thiserror::Error;

/// Main error type for tool-runner operations.
///
/// Per-command failures (spawn errors, nonzero exits, timeouts) are reported
/// through [`ExecutionResult`](crate::execution::ExecutionResult) instead.
#[derive(Error, Debug)]
pub enum ToolRunnerError {
    /// No live process with the given PID is registered.
    #[error("process {0} not found")]
    ProcessNotFound(u32),

    /// The child process could not be started.
    #[error("failed to spawn process: {0}")]
    Spawn(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience Result type for tool-runner operations.
pub type Result<T> = std::result::Result<T, ToolRunnerError>;
