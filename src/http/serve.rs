//! The serve loop and the server capability it drives.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::ServeError;

/// How a server listens: plain TCP, or TLS with certificate and key loaded from
/// PEM files when serving starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Plain,
    Tls { cert_path: PathBuf, key_path: PathBuf },
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Plain => f.write_str("http"),
            Transport::Tls { .. } => f.write_str("https"),
        }
    }
}

/// A server that can be started once and stopped from another task.
///
/// `serve` runs concurrently with `drain` and `hard_stop`, so all three borrow
/// `self` immutably.
#[async_trait]
pub trait Server: Send + Sync {
    /// Accept and dispatch connections until stopped.
    ///
    /// Returns [`ServeError::Closed`] once the server has been drained or hard
    /// stopped, including when called after a stop.
    async fn serve(&self, transport: &Transport) -> Result<(), ServeError>;

    /// Stop accepting connections and wait for in-flight work to finish.
    async fn drain(&self) -> Result<(), ServeError>;

    /// Close every outstanding connection immediately.
    async fn hard_stop(&self) -> Result<(), ServeError>;
}

/// Run `server` until it is stopped or fails.
///
/// A stop requested through [`Server::drain`] or [`Server::hard_stop`] ends the
/// loop with `Ok(())`; any other error is returned unchanged.
pub async fn run<S>(server: &S, transport: &Transport) -> Result<(), ServeError>
where
    S: Server + ?Sized,
{
    match server.serve(transport).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_closed() => {
            tracing::debug!(%transport, "Serve loop closed");
            Ok(())
        }
        Err(e) => {
            tracing::error!(%transport, error = %e, "Serve loop failed");
            Err(e)
        }
    }
}
