//! Command execution engine.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::command::Shell;
use super::result::{ExecutionResult, NO_EXIT_CODE};
use crate::cache::{CacheStats, TtlCache};
use crate::error::ToolRunnerError;
use crate::process::{
    default_strategy, send_signal, terminate_all_gracefully, terminate_gracefully, Dashboard,
    ProcessInfo, ProcessRegistry, ProcessTicket, TerminationSignal, TerminationStrategy,
    DEFAULT_GRACE_PERIOD,
};
use crate::Result;

/// Default execution timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// How long successful results stay cached.
pub const DEFAULT_SUCCESS_TTL: Duration = Duration::from_secs(30 * 60);

/// How long to wait for output streams to close after the process exits.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default buffer size for reading process output.
const READ_BUFFER_SIZE: usize = 4096;

/// Executor tuning.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Deadline for a single command.
    pub timeout: Duration,
    /// Wait between graceful and forced termination.
    pub grace_period: Duration,
    /// Bound on output draining once the process has exited.
    pub drain_timeout: Duration,
    /// TTL for cached successful results.
    pub success_ttl: Duration,
    /// Interpreter receiving command lines.
    pub shell: Shell,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            grace_period: DEFAULT_GRACE_PERIOD,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            success_ttl: DEFAULT_SUCCESS_TTL,
            shell: Shell::default(),
        }
    }
}

impl ExecutorConfig {
    /// Set the execution timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the termination grace period.
    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }

    /// Set the bound on output draining after exit.
    pub fn drain_timeout(mut self, limit: Duration) -> Self {
        self.drain_timeout = limit;
        self
    }

    /// Set the shell.
    pub fn shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }
}

/// How a supervised child ended.
enum Exit {
    Code(i32),
    WaitFailed(std::io::Error),
    TimedOut,
}

/// Output stream drained by a background task into a shared buffer.
///
/// The buffer outlives the task, so output read before an abort is kept.
struct StreamCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
    closed: bool,
}

impl StreamCapture {
    fn spawn<R>(stream: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);

        let task = tokio::spawn(async move {
            let Some(mut stream) = stream else {
                return;
            };
            let mut chunk = [0u8; READ_BUFFER_SIZE];
            loop {
                match stream.read(&mut chunk).await {
                    Ok(0) => break, // EOF
                    Ok(n) => sink
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend_from_slice(&chunk[..n]),
                    Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        debug!(error = %e, "output stream read failed");
                        break;
                    }
                }
            }
        });

        Self {
            buffer,
            task,
            closed: false,
        }
    }

    /// Wait up to `limit` for the stream to reach EOF.
    async fn wait_closed(&mut self, limit: Duration) -> bool {
        if !self.closed {
            self.closed = tokio::time::timeout(limit, &mut self.task).await.is_ok();
        }
        self.closed
    }

    /// Take the captured output, detaching the reader if it is still open.
    fn into_output(self) -> Vec<u8> {
        if !self.closed {
            self.task.abort();
        }
        std::mem::take(&mut *self.buffer.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Runs shell commands under a deadline, tracks them while they run, and
/// memoizes successful results.
///
/// Created once at startup and shared by reference; there is no global
/// execution lock.
pub struct Executor {
    config: ExecutorConfig,
    cache: Arc<TtlCache<ExecutionResult>>,
    registry: ProcessRegistry,
    strategy: Arc<dyn TerminationStrategy>,
}

impl Executor {
    /// Create an executor using the platform termination strategy.
    pub fn new(config: ExecutorConfig, cache: Arc<TtlCache<ExecutionResult>>) -> Self {
        Self::with_strategy(config, cache, default_strategy())
    }

    /// Create an executor with an explicit termination strategy.
    pub fn with_strategy(
        config: ExecutorConfig,
        cache: Arc<TtlCache<ExecutionResult>>,
        strategy: Arc<dyn TerminationStrategy>,
    ) -> Self {
        Self {
            config,
            cache,
            registry: ProcessRegistry::new(),
            strategy,
        }
    }

    /// Get the executor configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Get the live process registry.
    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    /// Get the result cache.
    pub fn cache(&self) -> &TtlCache<ExecutionResult> {
        &self.cache
    }

    /// Execute `command` through the shell and wait for it to finish.
    ///
    /// With `use_cache`, a cached result for the identical command line is
    /// returned without spawning anything, and a successful run is cached.
    /// Failures of every kind are reported in the returned result.
    pub async fn execute(&self, command: &str, use_cache: bool) -> ExecutionResult {
        if use_cache {
            if let Some(cached) = self.cache.get(command) {
                debug!(command, "using cached result");
                return cached;
            }
        }

        let start = Instant::now();
        let result = self.run(command).await.with_execution_time(start.elapsed());

        if use_cache && result.success {
            self.cache.set(command, result.clone(), self.config.success_ttl);
        }

        result
    }

    async fn run(&self, command: &str) -> ExecutionResult {
        let mut child = match self.config.shell.command(command).spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = ToolRunnerError::Spawn(e.to_string());
                warn!(command, error = %err, "spawn failed");
                return ExecutionResult::spawn_failed(err);
            }
        };

        let Some(pid) = child.id() else {
            // Only possible once the child has been reaped.
            return ExecutionResult::spawn_failed(ToolRunnerError::Spawn(
                "process exited before it could be tracked".into(),
            ));
        };
        let ticket = self.registry.register(pid, command);
        info!(pid, command, "process started");

        let stdout = StreamCapture::spawn(child.stdout.take());
        let stderr = StreamCapture::spawn(child.stderr.take());

        let waited = tokio::time::timeout(self.config.timeout, child.wait()).await;
        let exit = match waited {
            Ok(Ok(status)) => Exit::Code(status.code().unwrap_or(NO_EXIT_CODE)),
            Ok(Err(e)) => {
                let _ = child.start_kill();
                Exit::WaitFailed(e)
            }
            Err(_) => {
                warn!(pid, timeout = ?self.config.timeout, "deadline expired, killing process tree");
                send_signal(self.strategy.as_ref(), pid, TerminationSignal::Forced);
                let _ = child.start_kill();
                let _ = child.wait().await;
                Exit::TimedOut
            }
        };

        let (stdout, mut stderr) = self.drain(pid, stdout, stderr).await;

        self.registry.unregister(&ticket);

        match exit {
            Exit::Code(code) => {
                info!(pid, code, "process exited");
                ExecutionResult::completed(stdout, stderr, code, pid)
            }
            Exit::WaitFailed(e) => {
                warn!(pid, error = %e, "failed to wait for process");
                stderr.extend_from_slice(e.to_string().as_bytes());
                ExecutionResult::completed(stdout, stderr, NO_EXIT_CODE, pid)
            }
            Exit::TimedOut => ExecutionResult::timeout(stdout, stderr, pid, self.config.timeout),
        }
    }

    /// Collect both output streams once the leader has exited.
    ///
    /// A descendant still holding a pipe after `drain_timeout` is killed
    /// with the rest of the process group before the streams are drained
    /// once more; anything still open after that is detached.
    async fn drain(
        &self,
        pid: u32,
        mut stdout: StreamCapture,
        mut stderr: StreamCapture,
    ) -> (Vec<u8>, Vec<u8>) {
        let limit = self.config.drain_timeout;
        let (out_closed, err_closed) =
            tokio::join!(stdout.wait_closed(limit), stderr.wait_closed(limit));

        if !(out_closed && err_closed) {
            warn!(pid, "output still open after exit, killing process group");
            send_signal(self.strategy.as_ref(), pid, TerminationSignal::Forced);

            let (out_closed, err_closed) =
                tokio::join!(stdout.wait_closed(limit), stderr.wait_closed(limit));
            if !(out_closed && err_closed) {
                warn!(pid, "output stream still open, detaching reader");
            }
        }

        (stdout.into_output(), stderr.into_output())
    }

    /// Snapshot every live process.
    pub fn list_processes(&self) -> Vec<ProcessInfo> {
        self.registry.list()
    }

    /// Get the record of a live process.
    pub fn process_status(&self, pid: u32) -> Option<ProcessInfo> {
        self.registry.get(pid)
    }

    /// Build a dashboard snapshot.
    pub fn dashboard(&self) -> Dashboard {
        self.registry.dashboard()
    }

    /// Get result cache occupancy.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Terminate a registered process and its descendants.
    ///
    /// Sends a graceful signal, waits the grace period, then kills whatever
    /// is left. Fails only when `pid` is not registered.
    pub async fn terminate_process(&self, pid: u32) -> Result<()> {
        let ticket = self
            .registry
            .ticket(pid)
            .ok_or(ToolRunnerError::ProcessNotFound(pid))?;

        info!(pid, "terminating process");
        terminate_gracefully(self.strategy.as_ref(), pid, self.config.grace_period).await;
        self.registry.unregister(&ticket);
        Ok(())
    }

    /// Terminate every registered process, sharing one grace period.
    ///
    /// Returns the number of processes targeted.
    pub async fn terminate_all(&self) -> usize {
        let tickets = self.registry.tickets();
        if tickets.is_empty() {
            return 0;
        }

        info!(count = tickets.len(), "terminating all registered processes");
        let pids: Vec<u32> = tickets.iter().map(ProcessTicket::pid).collect();
        terminate_all_gracefully(self.strategy.as_ref(), &pids, self.config.grace_period).await;

        for ticket in &tickets {
            self.registry.unregister(ticket);
        }
        tickets.len()
    }
}
