//! Webhook handling for GitHub events.
//!
//! - [`signature`]: HMAC-SHA256 verification of the raw delivery
//! - [`parser`]: `pull_request` payloads into [`PullRequestEvent`]
//! - [`processor`]: event to cache mutation

pub mod events;
pub mod parser;
pub mod processor;
pub mod signature;

pub use events::{PrAction, PullRequestEvent};
pub use parser::{ParseError, parse_webhook};
pub use processor::{Decision, SkipReason, plan, process_event};
pub use signature::{
    SignatureCheck, check_signature, compute_signature, format_signature_header,
    parse_signature_header, verify_signature,
};
