//! OS signal handling.
//!
//! SIGTERM and SIGINT (Ctrl+C elsewhere) cancel a [`CancellationToken`], which
//! starts the graceful shutdown of every server watching it.

use tokio_util::sync::CancellationToken;

/// Cancel a fresh token when the process receives SIGTERM or SIGINT.
///
/// The listener runs in a background task; later signals are ignored because
/// cancellation is one-shot.
pub fn cancel_on_signal() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = trigger.cancelled() => return,
            name = wait_for_signal() => {
                tracing::info!(signal = name, "Received signal, initiating graceful shutdown");
            }
        }
        trigger.cancel();
    });

    token
}

/// Wait for the first shutdown signal and return its name.
///
/// A handler that cannot be installed is logged and never fires.
pub async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
