//! Webhook endpoint handler.
//!
//! Deliveries are processed inline: signature check, parse, then one cache
//! mutation. Everything GitHub sends that parses gets a 200, including events
//! the cache ignores, so GitHub does not mark the hook as failing.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, warn};

use super::AppState;
use crate::types::DeliveryId;
use crate::webhooks::{ParseError, check_signature, parse_webhook, process_event};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid signature")]
    InvalidSignature,

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// `POST /`
///
/// - 200: processed, ignored, or `ping`
/// - 400: no `X-GitHub-Event` header
/// - 401: signature missing or wrong while enforcement is on
/// - 500: body is not JSON
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let event_type = header(&headers, HEADER_EVENT).ok_or(WebhookError::MissingHeader(HEADER_EVENT))?;
    let delivery_id = DeliveryId::new(header(&headers, HEADER_DELIVERY).unwrap_or("-"));

    debug!(
        delivery_id = %delivery_id,
        event_type = %event_type,
        bytes = body.len(),
        "Received webhook"
    );

    let check = check_signature(
        &body,
        header(&headers, HEADER_SIGNATURE),
        app_state.webhook_secret(),
    );
    if !check.is_acceptable() {
        if app_state.enforce_signature() {
            warn!(delivery_id = %delivery_id, ?check, "Rejecting webhook with bad signature");
            return Err(WebhookError::InvalidSignature);
        }
        warn!(delivery_id = %delivery_id, ?check, "Signature verification failed, processing anyway");
    }

    if event_type == "ping" {
        return Ok((StatusCode::OK, "OK"));
    }

    let event = match parse_webhook(event_type, &body) {
        Ok(event) => event,
        Err(e) => {
            warn!(delivery_id = %delivery_id, error = %e, "Rejecting malformed webhook payload");
            return Err(e.into());
        }
    };

    if let Some(event) = event {
        let decision = process_event(app_state.cache(), app_state.filter(), &event);
        debug!(delivery_id = %delivery_id, ?decision, "Webhook processed");
    }

    Ok((StatusCode::OK, "OK"))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
