//! graceful-http: serve a router until SIGINT/SIGTERM, then drain.
//!
//! This is the application entry point. It initializes tracing, loads
//! configuration from a TOML file, builds the router and runs one
//! serve-and-shutdown cycle. A drain that exceeds the shutdown deadline exits
//! with an error after the remaining connections were closed.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use graceful_http::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use graceful_http::http::cancel_on_signal;
use graceful_http::routes::create_router;

/// graceful-http: HTTP(S) server with bounded graceful shutdown
#[derive(Parser, Debug)]
#[command(name = "graceful-http", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "graceful_http=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration first so the log format is known
    let config = AppConfig::load(&args.config)?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let addr = config.http.addr()?;
    let deadline = config.shutdown.deadline();
    let shutdown_timeout_ms = deadline.as_duration().as_millis() as u64;
    tracing::info!(
        %addr,
        tls = ?config.http.tls.mode,
        shutdown_timeout_ms,
        "Loaded configuration"
    );

    let server = config.build_server(create_router())?;
    let cancel = cancel_on_signal();

    let outcome = match config.http.tls.files() {
        Some((cert, key)) => {
            server
                .serve_tls_with_shutdown(cancel, cert.to_path_buf(), key.to_path_buf())
                .await
        }
        None => {
            tracing::warn!(
                "TLS disabled - server running on plain HTTP (not recommended for production)"
            );
            server.serve_with_shutdown(cancel).await
        }
    };

    outcome.into_result(deadline)?;
    tracing::info!("Shutdown complete");

    Ok(())
}
