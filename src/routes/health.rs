//! Liveness check.

/// Returns "ok" while the server is accepting requests. Once a drain starts the
/// listener is closed, so health checks fail and load balancers stop routing here.
pub async fn health() -> &'static str {
    "ok"
}
