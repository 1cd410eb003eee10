mod config;
mod controller;
mod services;
mod state;
mod transport;

use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use tokio::signal;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::config::LaunchArgs;
use crate::controller::StatDisplayController;
use crate::services::stats_provider::HttpStatsProvider;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = match LaunchArgs::from_env() {
        Ok(args) => args,
        Err(e) => e.exit(),
    };
    if let Some(info) = args.host_info() {
        tracing::debug!(host_info = %info, "launched by Stream Deck host");
    }

    let provider = match HttpStatsProvider::from_config() {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!(error = %e, "failed to build stats HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let controller = StatDisplayController::new(
        Arc::new(provider),
        outbound_tx,
        events_tx.clone(),
        config::refresh_interval(),
    );
    tokio::spawn(controller.run(events_rx));

    let code = tokio::select! {
        result = transport::run(&args, events_tx, outbound_rx) => match result {
            Ok(()) => {
                tracing::info!("host connection closed");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "host transport failed");
                ExitCode::FAILURE
            }
        },
        () = shutdown_signal() => ExitCode::SUCCESS,
    };

    tracing::info!("Plugin shut down");
    code
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let log_file = config::log_file().and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("failed to open log file {}: {e}", path.display());
                None
            }
        }
    });

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
