//! GitHub API access for bootstrap.
//!
//! - [`GitHubHost`] lists an owner's repositories and their open pull requests
//! - failures are classified as transient or permanent ([`GitHubErrorKind`])
//! - transient failures can be retried with exponential backoff

mod client;
mod error;
mod retry;

pub use client::GitHubHost;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use retry::{RetryConfig, RetryPolicy, RetryResult, retry_with_backoff};
