//! Bounded graceful shutdown.
//!
//! [`ShutdownCoordinator::supervise`] runs a server's serve loop alongside a
//! watcher for the cancellation token. Once the token fires, the watcher asks
//! the server to drain and races that against the shutdown deadline:
//!
//! 1. Drain finishes first: the cycle ends as [`CycleOutcome::Stopped`]
//! 2. Deadline elapses first: the server is hard stopped once and the cycle
//!    ends as [`CycleOutcome::TimedOut`]
//!
//! A serve loop failure always wins over either result. Cancellation alone is
//! never reported as an error.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::options::ShutdownDeadline;
use super::serve::{self, Server, Transport};
use crate::error::ServeError;

/// Terminal result of one serve-and-shutdown cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Cancelled and drained before the deadline.
    Stopped,
    /// Cancelled, but the drain outlived the deadline and connections were
    /// force-closed.
    TimedOut,
    /// The server failed for a reason unrelated to shutdown.
    Failed(ServeError),
}

impl CycleOutcome {
    pub fn is_stopped(&self) -> bool {
        matches!(self, CycleOutcome::Stopped)
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, CycleOutcome::TimedOut)
    }

    /// Convert to a `Result`, reporting a timeout as
    /// [`ServeError::ShutdownTimeout`] with the deadline that was exceeded.
    pub fn into_result(self, deadline: ShutdownDeadline) -> Result<(), ServeError> {
        match self {
            CycleOutcome::Stopped => Ok(()),
            CycleOutcome::TimedOut => Err(ServeError::ShutdownTimeout(deadline.as_duration())),
            CycleOutcome::Failed(e) => Err(e),
        }
    }
}

/// How the drain phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    Completed,
    TimedOut,
}

/// Drives one serve-and-shutdown cycle with a fixed drain deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShutdownCoordinator {
    deadline: ShutdownDeadline,
}

impl ShutdownCoordinator {
    pub fn new(deadline: ShutdownDeadline) -> Self {
        Self { deadline }
    }

    /// Serve until `cancel` fires, then drain within the deadline.
    ///
    /// Never returns while the token is live and the serve loop is healthy.
    pub async fn supervise<S>(
        &self,
        server: &S,
        transport: &Transport,
        cancel: &CancellationToken,
    ) -> CycleOutcome
    where
        S: Server + ?Sized,
    {
        let serving = serve::run(server, transport);
        let watching = self.watch(server, cancel);

        match tokio::try_join!(serving, watching) {
            Ok(((), Drain::Completed)) => {
                tracing::info!("Server stopped gracefully");
                CycleOutcome::Stopped
            }
            Ok(((), Drain::TimedOut)) => CycleOutcome::TimedOut,
            Err(e) => {
                tracing::error!(error = %e, "Server cycle failed");
                CycleOutcome::Failed(e)
            }
        }
    }

    async fn watch<S>(&self, server: &S, cancel: &CancellationToken) -> Result<Drain, ServeError>
    where
        S: Server + ?Sized,
    {
        cancel.cancelled().await;

        let deadline = self.deadline.as_duration();
        let deadline_ms = deadline.as_millis() as u64;
        tracing::info!(deadline_ms, "Shutdown requested, draining connections");

        drain_with_deadline(server, deadline).await
    }
}

/// Drain `server`, hard stopping it if the drain has not finished after `deadline`.
///
/// The deadline timer starts on the first poll. If both complete on the same
/// wake-up the drain wins and no hard stop is issued.
pub async fn drain_with_deadline<S>(server: &S, deadline: Duration) -> Result<Drain, ServeError>
where
    S: Server + ?Sized,
{
    tokio::select! {
        biased;

        result = server.drain() => {
            result?;
            Ok(Drain::Completed)
        }
        _ = tokio::time::sleep(deadline) => {
            let deadline_ms = deadline.as_millis() as u64;
            tracing::warn!(
                deadline_ms,
                "Graceful shutdown deadline elapsed, closing remaining connections"
            );
            server.hard_stop().await?;
            Ok(Drain::TimedOut)
        }
    }
}
