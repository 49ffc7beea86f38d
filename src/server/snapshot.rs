//! Snapshot endpoint.
//!
//! `GET /` returns the whole dependency cache as JSON. When an API token is
//! configured, the request must carry it in the configured header.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, warn};

use super::AppState;
use crate::cache::CacheSnapshot;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("missing or invalid API token")]
    Unauthorized,
}

impl IntoResponse for SnapshotError {
    fn into_response(self) -> Response {
        let status = match &self {
            SnapshotError::Unauthorized => StatusCode::UNAUTHORIZED,
        };
        (status, self.to_string()).into_response()
    }
}

/// `GET /`
pub async fn snapshot_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CacheSnapshot>, SnapshotError> {
    if let Some(token) = app_state.api_token() {
        let presented = headers.get(token.header.as_str()).and_then(|v| v.to_str().ok());
        if presented != Some(token.value.as_str()) {
            warn!(header = %token.header, "Rejecting snapshot request without a valid API token");
            return Err(SnapshotError::Unauthorized);
        }
    }

    let snapshot = app_state.cache().snapshot();
    debug!(repositories = snapshot.branches.len(), "Serving cache snapshot");
    Ok(Json(snapshot))
}
