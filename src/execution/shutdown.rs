//! Shutdown supervision.
//!
//! Listening for shutdown is decoupled from killing processes: a watch
//! channel carries the shutdown request, and a supervisor task applies the
//! executor's termination policy to everything still registered.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::Executor;

/// Resolve when the process receives Ctrl-C or, on Unix, `SIGTERM`.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}

/// Spawn a task that terminates every registered process once `shutdown`
/// flips to `true` or its sender is dropped.
///
/// The task yields the number of processes it targeted.
pub fn spawn_shutdown_supervisor(
    executor: Arc<Executor>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        if shutdown.wait_for(|&requested| requested).await.is_err() {
            debug!("shutdown channel closed");
        }

        info!("shutting down executor, terminating all processes");
        let terminated = executor.terminate_all().await;
        info!(terminated, "executor shutdown complete");
        terminated
    })
}
