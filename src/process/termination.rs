//! Platform termination strategies.
//!
//! Runaway processes are stopped in two phases: a graceful signal to the
//! whole process tree, a grace period, then a forced kill if anything is
//! still alive. Signal failures are logged and never propagated, since the
//! target may already be gone.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

/// Default wait between the graceful and forced phases.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Termination signal strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    /// Ask the process tree to exit (`SIGTERM`, `taskkill /T`).
    Graceful,
    /// Kill the process tree (`SIGKILL`, `taskkill /F /T`).
    Forced,
}

/// Capability to signal a process and everything it spawned.
///
/// `pid` always names a process spawned as the leader of its own group, so
/// the tree it identifies stays addressable after the leader itself has
/// exited and been reaped.
pub trait TerminationStrategy: Send + Sync {
    /// Deliver `signal` to the process tree rooted at `pid`.
    fn signal(&self, pid: u32, signal: TerminationSignal) -> io::Result<()>;

    /// Check whether any member of the process tree rooted at `pid` may
    /// still be running.
    fn is_alive(&self, pid: u32) -> bool;
}

/// Process-group signaling for Unix-like systems.
///
/// Children are spawned with `process_group(0)`, so the group id equals the
/// leader's pid and never has to be looked up. Signaling the negated pid
/// reaches every descendant that did not move itself to another group, even
/// once the leader is gone.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixTermination;

#[cfg(unix)]
impl PosixTermination {
    /// Negated group id for the group led by `pid`.
    fn group_target(pid: u32) -> io::Result<libc::pid_t> {
        libc::pid_t::try_from(pid)
            .ok()
            .filter(|pid| *pid > 1)
            .map(|pgid| -pgid)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid pid"))
    }
}

#[cfg(unix)]
impl TerminationStrategy for PosixTermination {
    fn signal(&self, pid: u32, signal: TerminationSignal) -> io::Result<()> {
        let target = Self::group_target(pid)?;
        let signo = match signal {
            TerminationSignal::Graceful => libc::SIGTERM,
            TerminationSignal::Forced => libc::SIGKILL,
        };

        // SAFETY: kill only delivers a signal; target is always below -1.
        if unsafe { libc::kill(target, signo) } == -1 {
            return Err(io::Error::last_os_error());
        }
        debug!(pid, target, ?signal, "signal delivered to process group");
        Ok(())
    }

    fn is_alive(&self, pid: u32) -> bool {
        match Self::group_target(pid) {
            // SAFETY: signal 0 performs the permission and existence check only.
            Ok(target) => unsafe { libc::kill(target, 0) == 0 },
            Err(_) => false,
        }
    }
}

/// Tree-kill through `taskkill` for Windows.
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsTermination;

#[cfg(windows)]
impl TerminationStrategy for WindowsTermination {
    fn signal(&self, pid: u32, signal: TerminationSignal) -> io::Result<()> {
        let pid_arg = pid.to_string();
        let mut cmd = std::process::Command::new("taskkill");
        if signal == TerminationSignal::Forced {
            cmd.arg("/F");
        }
        cmd.args(["/T", "/PID", &pid_arg])
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());

        // The exit status is ignored: the target may already have exited.
        let _ = cmd.status()?;
        debug!(pid, ?signal, "taskkill invoked");
        Ok(())
    }

    fn is_alive(&self, _pid: u32) -> bool {
        // No cheap liveness probe; forced tree-kill is idempotent.
        true
    }
}

/// Termination strategy for the current platform.
#[cfg(unix)]
pub fn default_strategy() -> Arc<dyn TerminationStrategy> {
    Arc::new(PosixTermination)
}

/// Termination strategy for the current platform.
#[cfg(windows)]
pub fn default_strategy() -> Arc<dyn TerminationStrategy> {
    Arc::new(WindowsTermination)
}

/// Send `signal`, logging instead of failing.
pub fn send_signal(strategy: &dyn TerminationStrategy, pid: u32, signal: TerminationSignal) {
    if let Err(e) = strategy.signal(pid, signal) {
        warn!(pid, ?signal, error = %e, "failed to signal process");
    }
}

/// Two-phase termination of a single process tree.
pub async fn terminate_gracefully(strategy: &dyn TerminationStrategy, pid: u32, grace: Duration) {
    terminate_all_gracefully(strategy, &[pid], grace).await;
}

/// Two-phase termination of several process trees sharing one grace window.
pub async fn terminate_all_gracefully(
    strategy: &dyn TerminationStrategy,
    pids: &[u32],
    grace: Duration,
) {
    if pids.is_empty() {
        return;
    }

    for &pid in pids {
        send_signal(strategy, pid, TerminationSignal::Graceful);
    }

    tokio::time::sleep(grace).await;

    for &pid in pids {
        if strategy.is_alive(pid) {
            send_signal(strategy, pid, TerminationSignal::Forced);
        }
    }
}
