//! HTTP route handlers served by the binary.
//!
//! `/health` is a liveness check. `/delay/{ms}` holds the request open for the
//! given number of milliseconds, which makes drain and force-close behavior
//! visible from a client.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod delay;
pub mod health;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_layer;

/// Creates the Axum router with all routes.
pub fn create_router() -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/delay/{ms}", get(delay::delay))
        .layer(TraceLayer::new_for_http())
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
