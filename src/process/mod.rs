//! Live process tracking and termination.
//!
//! This module provides:
//! - [`ProcessRegistry`]: the set of child processes currently running
//! - [`TerminationStrategy`]: platform-specific tree termination
//! - The graceful-then-forced termination policy

mod info;
mod registry;
mod termination;

#[cfg(test)]
pub(crate) use termination::testing;

pub use info::{unix_seconds, ProcessInfo, ProcessStatus};
pub use registry::{Dashboard, ProcessRegistry, ProcessTicket};
#[cfg(unix)]
pub use termination::PosixTermination;
#[cfg(windows)]
pub use termination::WindowsTermination;
pub use termination::{
    default_strategy, send_signal, terminate_all_gracefully, terminate_gracefully,
    TerminationSignal, TerminationStrategy, DEFAULT_GRACE_PERIOD,
};
