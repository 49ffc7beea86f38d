//! Liveness probe.
//!
//! The listener is only bound after bootstrap succeeds, so any answer here
//! means the cache has been filled.

use axum::http::StatusCode;

/// `GET /health`, always `200 OK`.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
