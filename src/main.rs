//! tool-runner binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::watch;
use tool_runner::api::{self, AppState};
use tool_runner::cli::{self, Args};
use tool_runner::config::Config;
use tool_runner::execution::{shutdown_signal, spawn_shutdown_supervisor};
use tool_runner::{logging, Executor, TtlCache};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'tool-runner --help' for more information.");
            return ExitCode::FAILURE;
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> tool_runner::Result<()> {
    let config = Config::load(&args)?;
    logging::init_with_level(Some(config.log_filter()));

    info!("tool-runner v{}", env!("CARGO_PKG_VERSION"));

    let server_config = config.to_server_config()?;
    let cache = TtlCache::with_cleanup(config.cache_ttl(), config.cleanup_interval());
    let executor = Arc::new(Executor::new(config.executor_config(), cache));

    info!(
        timeout_secs = config.executor.timeout_secs,
        cache_ttl_secs = config.cache.default_ttl_secs,
        "executor ready"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let supervisor = spawn_shutdown_supervisor(Arc::clone(&executor), shutdown_rx.clone());

    let signal_tx = Arc::clone(&shutdown_tx);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = signal_tx.send(true);
    });

    let served = api::serve(server_config, AppState::new(executor), shutdown_rx).await;

    // The server may also stop on a bind or accept error.
    let _ = shutdown_tx.send(true);
    match supervisor.await {
        Ok(terminated) => info!(terminated, "shutdown complete"),
        Err(e) => error!(error = %e, "shutdown supervisor failed"),
    }

    served
}
