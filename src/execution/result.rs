//! Execution result types.

use std::borrow::Cow;
use std::time::Duration;

/// Return code reported when no process could be started, or when the
/// process was ended by a signal.
pub const NO_EXIT_CODE: i32 = -1;

/// Outcome of one command run.
///
/// Constructed once per execution and cached by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// True iff `return_code == 0`.
    pub success: bool,
    /// Captured standard output.
    pub stdout: Vec<u8>,
    /// Captured standard error.
    pub stderr: Vec<u8>,
    /// Process exit code, or [`NO_EXIT_CODE`].
    pub return_code: i32,
    /// Wall-clock duration from spawn to exit.
    pub execution_time: Duration,
    /// OS process identifier, if the process was started.
    pub pid: Option<u32>,
    /// Whether the deadline expired and the process was killed.
    pub timed_out: bool,
}

impl ExecutionResult {
    /// Create a result for a process that ran to exit.
    pub fn completed(stdout: Vec<u8>, stderr: Vec<u8>, return_code: i32, pid: u32) -> Self {
        Self {
            success: return_code == 0,
            stdout,
            stderr,
            return_code,
            execution_time: Duration::ZERO,
            pid: Some(pid),
            timed_out: false,
        }
    }

    /// Create a result for a process that could not be started.
    pub fn spawn_failed(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            stdout: Vec::new(),
            stderr: error.to_string().into_bytes(),
            return_code: NO_EXIT_CODE,
            execution_time: Duration::ZERO,
            pid: None,
            timed_out: false,
        }
    }

    /// Create a result for a process killed at its deadline.
    ///
    /// A timeout marker is appended to whatever stderr was captured.
    pub fn timeout(stdout: Vec<u8>, mut stderr: Vec<u8>, pid: u32, limit: Duration) -> Self {
        if !stderr.is_empty() && !stderr.ends_with(b"\n") {
            stderr.push(b'\n');
        }
        stderr.extend_from_slice(timeout_marker(limit).as_bytes());

        Self {
            success: false,
            stdout,
            stderr,
            return_code: NO_EXIT_CODE,
            execution_time: Duration::ZERO,
            pid: Some(pid),
            timed_out: true,
        }
    }

    /// Set the execution time.
    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    /// Check if the command failed for any reason.
    pub fn failed(&self) -> bool {
        !self.success
    }

    /// Check if the process never started.
    pub fn spawn_error(&self) -> bool {
        self.pid.is_none() && self.return_code == NO_EXIT_CODE
    }

    /// Standard output decoded lossily as UTF-8.
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Standard error decoded lossily as UTF-8.
    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// Execution time in fractional seconds.
    pub fn execution_time_secs(&self) -> f64 {
        self.execution_time.as_secs_f64()
    }
}

/// Text appended to stderr when a command exceeds its deadline.
pub fn timeout_marker(limit: Duration) -> String {
    format!("command timed out after {}s", limit.as_secs_f64())
}
