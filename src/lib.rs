//! Graceful HTTP - an HTTP(S) server with bounded graceful shutdown.
//!
//! A [`GracefulServer`] serves an axum router until a cancellation token
//! fires, then stops accepting connections and drains in-flight requests. If the
//! drain outlives the shutdown deadline (5 seconds unless configured), the
//! remaining connections are force-closed. Each cycle reports exactly one
//! [`CycleOutcome`]: stopped cleanly, timed out, or failed.
//!
//! ```no_run
//! use graceful_http::{CycleOutcome, GracefulServer};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run(router: axum::Router) {
//! let cancel = CancellationToken::new();
//! let server = GracefulServer::bind("127.0.0.1:8080".parse().unwrap(), router)
//!     .with_cloudflare_timeouts();
//!
//! match server.serve_with_shutdown(cancel).await {
//!     CycleOutcome::Stopped => {}
//!     CycleOutcome::TimedOut => eprintln!("connections were force-closed"),
//!     CycleOutcome::Failed(e) => eprintln!("server failed: {e}"),
//! }
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;

pub use error::ServeError;
pub use crate::http::{CycleOutcome, GracefulServer, ShutdownCoordinator, ShutdownDeadline};
