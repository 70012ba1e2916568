//! pinchy - Keeps a service registry in sync with a source of service definitions
//!
//! This is the main entry point for the pinchy application.

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use pinchy::cli;
use pinchy::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let matches = cli::build_command(env!("CARGO_PKG_VERSION")).get_matches();
    let invocation = cli::resolve(&matches)?;

    // Initialize tracing/logging
    init_tracing(&invocation.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        source = invocation.source.name(),
        registry = invocation.registry.name(),
        mode = ?invocation.mode,
        "Starting pinchy"
    );

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let result = cli::execute(invocation, cancel).await;

    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "pinchy failed");
    }

    info!("pinchy shutdown complete");

    result
}

/// Cancel `token` when a shutdown signal is received
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }

    token.cancel();
}
