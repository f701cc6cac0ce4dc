//! # tool-runner
//!
//! Process execution and result-caching engine for long-running
//! command-line tools.
//!
//! Commands run through a shell in their own process group, with a
//! per-command deadline. Every live process is tracked in a registry so it
//! can be inspected or terminated, and successful results are memoized in a
//! TTL cache keyed by the command line.
//!
//! ## Features
//!
//! - **Process-tree termination**: timeouts and shutdown reach grandchildren
//! - **Two-phase kill**: graceful signal, grace period, then forced kill
//! - **Result cache**: successful outputs reused until their TTL expires
//! - **HTTP front end**: axum router exposing execution and inspection
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tool_runner::{Executor, ExecutorConfig, TtlCache};
//!
//! #[tokio::main]
//! async fn main() {
//!     tool_runner::logging::try_init().ok();
//!
//!     let cache = TtlCache::with_cleanup(Duration::from_secs(1800), Duration::from_secs(600));
//!     let executor = Arc::new(Executor::new(ExecutorConfig::default(), cache));
//!
//!     let result = executor.execute("uname -a", true).await;
//!     println!("{} ({})", result.stdout_text(), result.return_code);
//! }
//! ```

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod process;

pub use cache::{CacheStats, TtlCache};
pub use error::{Result, ToolRunnerError};
pub use execution::{ExecutionResult, Executor, ExecutorConfig, Shell};
pub use process::{
    ProcessInfo, ProcessRegistry, ProcessStatus, TerminationSignal, TerminationStrategy,
};
