//! origin-relay: expose one remote origin under a local port.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request     ┌──────────────────────────────────────────────┐
//!     ───────────────────┼─▶ server ─▶ rewrite ─▶ pooled client ────────┼──▶ Upstream
//!                        │                                              │    Origin
//!     Client Response    │                                              │
//!     ◀──────────────────┼── relay ◀── observe ◀── response head ◀──────┼───
//!                        │  (flush tick)                                │
//!                        └──────────────────────────────────────────────┘
//! ```
//!
//! Exit status is 0 after a graceful shutdown and 1 when startup fails
//! (bad configuration, unusable upstream address, or bind failure).

use std::process::ExitCode;

use clap::Parser;

use origin_relay::cli::Cli;
use origin_relay::lifecycle::{signals, startup, Shutdown};
use origin_relay::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.into_config();

    logging::init(config.as_ref().map(|c| c.debug_logging).unwrap_or(false));
    tracing::info!("origin-relay v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let started = match startup::start(config).await {
        Ok(started) => started,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        shutdown.trigger();
    });

    if let Err(e) = started.server.run(started.listener, server_shutdown).await {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
