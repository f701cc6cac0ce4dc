//! Command execution engine.
//!
//! This module provides command execution capabilities:
//! - Shell invocation in a fresh process group
//! - Timeout handling with process-tree termination
//! - Concurrent stdout/stderr capture
//! - Memoization of successful results
//! - Shutdown supervision
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tool_runner::cache::TtlCache;
//! use tool_runner::execution::{Executor, ExecutorConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = TtlCache::with_cleanup(Duration::from_secs(1800), Duration::from_secs(600));
//!     let executor = Executor::new(ExecutorConfig::default(), cache);
//!
//!     let result = executor.execute("echo hello", true).await;
//!     println!("Output: {}", result.stdout_text());
//! }
//! ```

mod command;
mod executor;
mod result;
mod shutdown;

pub use command::Shell;
pub use executor::{
    Executor, ExecutorConfig, DEFAULT_DRAIN_TIMEOUT, DEFAULT_SUCCESS_TTL, DEFAULT_TIMEOUT,
};
pub use result::{timeout_marker, ExecutionResult, NO_EXIT_CODE};
pub use shutdown::{shutdown_signal, spawn_shutdown_supervisor};
