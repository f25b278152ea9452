//! Snippit API server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ request id ─▶ trace span ─▶ request logger ─▶ timeout ─▶ handler
//!                                                     │                          │
//!                                                     │ (spawned)                ▼
//!                                                     ▼                    backend (identity,
//!                                               request log table           snippets)
//!
//!     Scheduler ───▶ /api/cron/health-check ─▶ backend ping ─▶ job notification mail
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use snippit::config;
use snippit::observability::{logging, metrics};
use snippit::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "snippit", version)]
#[command(about = "Snippit API server", long_about = None)]
struct Args {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "SNIPPIT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = config::load(args.config.as_deref())?;
    logging::init(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "snippit starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = %config.environment,
        request_timeout_secs = config.limits.request_timeout_secs,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let mut serving = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut serving => {
            result??;
            return Ok(());
        }
        _ = snippit::lifecycle::shutdown_signal() => {
            shutdown.trigger();
        }
    }

    serving.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
