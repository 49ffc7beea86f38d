//! Initial cache fill from the repository host.
//!
//! At startup, before the HTTP listener exists, every open pull request of
//! every tracked repository is loaded into the cache. Only the first page of
//! each listing is read (100 items), so an owner with more repositories, or a
//! repository with more open pull requests, is only partially loaded until
//! webhooks fill the gaps.
//!
//! Unlike webhook events, bootstrapped pull requests are recorded even when
//! their description is empty: they get their branch and an empty dependency
//! set.

use std::future::Future;

use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{CacheMutation, DependencyCache};
use crate::declarations::parse_dependencies;
use crate::filter::RepoFilter;
use crate::github::GitHubApiError;
use crate::types::{PrKey, PrNumber};

/// An open pull request as listed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPullRequest {
    pub number: PrNumber,
    pub branch: String,
    pub body: Option<String>,
}

/// Read access to the owner's repositories and their open pull requests.
///
/// Implemented by [`crate::github::GitHubHost`]; tests use an in-memory host.
pub trait RepositoryHost {
    /// Names of the owner's repositories.
    fn list_repositories(&self) -> impl Future<Output = Result<Vec<String>, GitHubApiError>> + Send;

    fn list_open_pull_requests(
        &self,
        repo: &str,
    ) -> impl Future<Output = Result<Vec<OpenPullRequest>, GitHubApiError>> + Send;
}

/// Startup failures. Any of these stops the daemon.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to list repositories: {0}")]
    ListRepositories(#[source] GitHubApiError),

    #[error("failed to list open pull requests for {repo}: {source}")]
    ListPullRequests {
        repo: String,
        #[source]
        source: GitHubApiError,
    },
}

/// What a bootstrap run loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Included repositories, in listing order.
    pub repositories: Vec<String>,
    pub pull_requests: usize,
}

/// Fills `cache` with the open pull requests of every included repository.
pub async fn bootstrap<H: RepositoryHost>(
    host: &H,
    filter: &RepoFilter,
    cache: &DependencyCache,
) -> Result<BootstrapReport, BootstrapError> {
    let all = host
        .list_repositories()
        .await
        .map_err(BootstrapError::ListRepositories)?;

    let repositories: Vec<String> = all
        .into_iter()
        .filter(|repo| !repo.is_empty() && filter.is_included(repo))
        .collect();
    info!(repositories = ?repositories, "Repositories matching the configured rules");

    let mut report = BootstrapReport::default();
    for repo in repositories {
        let pulls = host.list_open_pull_requests(&repo).await.map_err(|source| {
            BootstrapError::ListPullRequests {
                repo: repo.clone(),
                source,
            }
        })?;

        for pull in &pulls {
            let key = PrKey::new(repo.as_str(), pull.number);
            let dependencies = parse_dependencies(pull.body.as_deref().unwrap_or_default());
            debug!(pr = %key, branch = %pull.branch, ?dependencies, "Found open pull request");
            cache.apply(
                &key,
                &CacheMutation::Upsert {
                    branch: pull.branch.clone(),
                    dependencies,
                },
            );
        }

        info!(repo = %repo, count = pulls.len(), "Loaded open pull requests");
        report.pull_requests += pulls.len();
        report.repositories.push(repo);
    }

    info!(
        repositories = report.repositories.len(),
        pull_requests = report.pull_requests,
        "Bootstrap complete"
    );
    Ok(report)
}
