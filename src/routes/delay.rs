//! Slow endpoint for exercising graceful shutdown.

use std::time::Duration;

use axum::extract::Path;

/// Upper bound so a single request cannot pin the server indefinitely
pub const MAX_DELAY_MS: u64 = 60_000;

/// Sleep for `ms` milliseconds (capped at [`MAX_DELAY_MS`]), then respond.
pub async fn delay(Path(ms): Path<u64>) -> String {
    let ms = ms.min(MAX_DELAY_MS);
    tracing::debug!(delay_ms = ms, "Holding request");
    tokio::time::sleep(Duration::from_millis(ms)).await;
    format!("slept {ms}ms")
}
