//! HTTP server module with bounded graceful shutdown.
//!
//! This module provides:
//! - **Serve loop**: runs a server until it is stopped or fails ([`serve`])
//! - **Shutdown coordinator**: drains on cancellation, force-closes after the
//!   deadline ([`coordinator`])
//! - **GracefulServer**: plain HTTP or HTTPS via axum-server ([`server`])
//! - Timeout and TLS presets ([`options`]) and signal handling ([`shutdown`])

pub mod coordinator;
pub mod options;
pub mod serve;
pub mod server;
pub mod shutdown;
mod tls;

pub use coordinator::{CycleOutcome, Drain, ShutdownCoordinator};
pub use options::{HttpTimeouts, ShutdownDeadline, TlsSettings, TlsVersion};
pub use serve::{Server, Transport};
pub use server::GracefulServer;
pub use shutdown::cancel_on_signal;
