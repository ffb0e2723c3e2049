use std::path::Path;

use tally::file_io::open_file_for_append;
use tally::App;
use tally::Error;
use tally::Result;
use tally::TallyConfig;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let config = TallyConfig::new()?;

    // Initializing Logs
    let _guard = init_observability(&config.log_dir)?;

    // Validate after logging is up so tolerated config problems are reported
    let config = match config.validate() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {:?}", e);
            return Err(e);
        }
    };

    let app = match App::start(config).await {
        Ok(app) => app,
        Err(e) => {
            error!("start failed: {:?}", e);
            return Err(e);
        }
    };

    info!("Application started. Waiting for CTRL+C signal...");
    if let Err(e) = graceful_shutdown().await {
        error!("Failed to wait for shutdown signal: {:?}", e);
    }

    if let Err(e) = app.shutdown().await {
        error!("shutdown failed: {:?}", e);
        return Err(e);
    }

    println!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(signal_error)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(signal_error)?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    info!("Shutdown server..");
    Ok(())
}

fn signal_error(e: std::io::Error) -> Error {
    Error::fatal("install signal handler", e)
}

pub fn init_observability(log_dir: &Path) -> Result<WorkerGuard> {
    let log_file = open_file_for_append(log_dir.join("tally.log"))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));
    tracing_subscriber::registry().with(base_subscriber).init();

    Ok(guard)
}
