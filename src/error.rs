//! Error types for serving and shutting down.

use std::io;
use std::time::Duration;

/// Errors produced while running a server or coordinating its shutdown.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("Failed to bind server: {0}")]
    Bind(#[source] io::Error),

    #[error("Server error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to load TLS configuration: {0}")]
    Tls(String),

    /// The server has been stopped. Returned by a serve loop that ended because
    /// of a drain or hard stop; never reported as a cycle failure.
    #[error("Server closed")]
    Closed,

    #[error("Graceful shutdown did not finish within {0:?}, connections were force-closed")]
    ShutdownTimeout(Duration),
}

impl ServeError {
    /// Return true for the sentinel that marks a deliberate stop.
    pub fn is_closed(&self) -> bool {
        matches!(self, ServeError::Closed)
    }
}

impl From<rustls::Error> for ServeError {
    fn from(e: rustls::Error) -> Self {
        ServeError::Tls(e.to_string())
    }
}
