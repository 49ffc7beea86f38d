//! GitHub webhook payload parser.
//!
//! The event type comes from the `X-GitHub-Event` header. Only `pull_request`
//! payloads are decoded; every other event type yields `Ok(None)`. A body that
//! is not valid JSON is an error regardless of event type, so a broken sender
//! surfaces as a 500 rather than as silence.
//!
//! The parser is lenient about missing fields: repository, number, head ref
//! and description may all be absent without failing the parse.

use serde::Deserialize;
use thiserror::Error;

use crate::types::PrNumber;

use super::events::{PrAction, PullRequestEvent};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The payload is not JSON, or a present field has the wrong type.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Parses a webhook payload into a typed event.
///
/// * `Ok(Some(event))` for a `pull_request` delivery
/// * `Ok(None)` for any other event type
/// * `Err(e)` when the payload is not well-formed JSON
///
/// # Examples
///
/// ```
/// use pullrequestd::webhooks::parse_webhook;
///
/// let payload = br#"{
///     "action": "opened",
///     "number": 7,
///     "pull_request": {
///         "number": 7,
///         "head": { "ref": "feature/login" },
///         "body": "DependsOn:infra-lib#42"
///     },
///     "repository": { "name": "api" }
/// }"#;
///
/// let event = parse_webhook("pull_request", payload).unwrap().unwrap();
/// assert_eq!(event.repo.as_deref(), Some("api"));
/// assert_eq!(event.head_branch, "feature/login");
///
/// assert!(parse_webhook("push", b"{}").unwrap().is_none());
/// ```
pub fn parse_webhook(
    event_type: &str,
    payload: &[u8],
) -> Result<Option<PullRequestEvent>, ParseError> {
    match event_type {
        "pull_request" => parse_pull_request(payload).map(Some),
        _ => {
            serde_json::from_slice::<serde::de::IgnoredAny>(payload)?;
            Ok(None)
        }
    }
}

// ============================================================================
// Raw payload structures for deserialization
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    #[serde(default)]
    action: String,
    number: Option<u64>,
    pull_request: Option<RawPullRequest>,
    repository: Option<RawRepository>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: Option<u64>,
    head: Option<RawHead>,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawHead {
    #[serde(rename = "ref")]
    ref_field: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    name: Option<String>,
}

fn parse_pull_request(payload: &[u8]) -> Result<PullRequestEvent, ParseError> {
    let raw: RawPullRequestPayload = serde_json::from_slice(payload)?;

    let pull_request = raw.pull_request.unwrap_or(RawPullRequest {
        number: None,
        head: None,
        body: None,
    });

    Ok(PullRequestEvent {
        action: PrAction::from_wire(&raw.action),
        repo: raw
            .repository
            .and_then(|r| r.name)
            .filter(|name| !name.is_empty()),
        number: raw.number.or(pull_request.number).map(PrNumber),
        head_branch: pull_request
            .head
            .and_then(|h| h.ref_field)
            .unwrap_or_default(),
        body: pull_request.body.unwrap_or_default(),
    })
}
