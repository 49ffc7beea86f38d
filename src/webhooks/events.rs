//! Typed webhook events.
//!
//! Only `pull_request` deliveries affect the cache. Fields GitHub may omit
//! stay optional here; deciding what a missing field means is the
//! processor's job, not the parser's.

use std::fmt;

use crate::types::{PrKey, PrNumber};

/// Action performed on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrAction {
    Opened,
    Reopened,
    /// Title, body or base branch changed.
    Edited,
    /// Closed, merged or not.
    Closed,
    /// Any action that does not touch the cache (`labeled`, `synchronize`, ...).
    Other(String),
}

impl PrAction {
    pub fn from_wire(action: &str) -> Self {
        match action {
            "opened" => PrAction::Opened,
            "reopened" => PrAction::Reopened,
            "edited" => PrAction::Edited,
            "closed" => PrAction::Closed,
            other => PrAction::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PrAction::Opened => "opened",
            PrAction::Reopened => "reopened",
            PrAction::Edited => "edited",
            PrAction::Closed => "closed",
            PrAction::Other(action) => action,
        }
    }
}

impl fmt::Display for PrAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `pull_request` webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub action: PrAction,

    /// Repository name without the owner. `None` when the payload carried no
    /// repository object or an empty name.
    pub repo: Option<String>,

    /// `None` when neither the top-level `number` nor `pull_request.number`
    /// was present.
    pub number: Option<PrNumber>,

    /// Source branch of the pull request (`pull_request.head.ref`).
    pub head_branch: String,

    /// Pull request description. GitHub sends `null` for an empty description;
    /// both arrive here as the empty string.
    pub body: String,
}

impl PullRequestEvent {
    /// The cache key, if the event names both a repository and a number.
    pub fn key(&self) -> Option<PrKey> {
        let repo = self.repo.as_ref()?;
        Some(PrKey::new(repo.clone(), self.number?))
    }
}
