//! Octocrab client scoped to one repository owner.

use octocrab::Octocrab;
use serde::{Deserialize, Serialize};

use crate::bootstrap::{OpenPullRequest, RepositoryHost};
use crate::types::PrNumber;

use super::error::GitHubApiError;
use super::retry::{RetryConfig, RetryPolicy, retry_with_backoff};

/// Listings read only the first page.
const PER_PAGE: u8 = 100;

/// A GitHub API client for the repositories of one user or organization.
#[derive(Clone)]
pub struct GitHubHost {
    client: Octocrab,
    owner: String,
    organization: bool,
    retry: RetryConfig,
    policy: RetryPolicy,
}

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
}

#[derive(Deserialize)]
struct RawRepository {
    #[serde(default)]
    name: String,
}

impl GitHubHost {
    pub fn new(client: Octocrab, owner: impl Into<String>, organization: bool) -> Self {
        Self {
            client,
            owner: owner.into(),
            organization,
            retry: RetryConfig::DEFAULT,
            policy: RetryPolicy::NoRetry,
        }
    }

    /// Creates a host authenticated with a personal access token. An empty
    /// token gives an anonymous client, which only sees public repositories.
    pub fn from_token(
        token: impl Into<String>,
        owner: impl Into<String>,
        organization: bool,
    ) -> Result<Self, octocrab::Error> {
        let token = token.into();
        let builder = Octocrab::builder();
        let client = if token.is_empty() {
            builder.build()?
        } else {
            builder.personal_token(token).build()?
        };
        Ok(Self::new(client, owner, organization))
    }

    /// Retries transient failures `retries` times. Zero disables retrying.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retry = RetryConfig::with_retries(retries);
        self.policy = RetryPolicy::from_retries(retries);
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// `/orgs/{owner}/repos` or `/users/{owner}/repos`.
    fn repositories_route(&self) -> String {
        let kind = if self.organization { "orgs" } else { "users" };
        format!("/{kind}/{}/repos", self.owner)
    }

    async fn fetch_repositories(&self) -> Result<Vec<String>, GitHubApiError> {
        let repos: Vec<RawRepository> = self
            .client
            .get(
                self.repositories_route(),
                Some(&PageParams { per_page: PER_PAGE }),
            )
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(repos.into_iter().map(|r| r.name).collect())
    }

    async fn fetch_open_pull_requests(
        &self,
        repo: &str,
    ) -> Result<Vec<OpenPullRequest>, GitHubApiError> {
        let page = self
            .client
            .pulls(&self.owner, repo)
            .list()
            .state(octocrab::params::State::Open)
            .per_page(PER_PAGE)
            .page(1u32)
            .send()
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        Ok(page
            .items
            .into_iter()
            .map(|pull| OpenPullRequest {
                number: PrNumber(pull.number),
                branch: pull.head.ref_field,
                body: pull.body,
            })
            .collect())
    }
}

impl RepositoryHost for GitHubHost {
    async fn list_repositories(&self) -> Result<Vec<String>, GitHubApiError> {
        retry_with_backoff(self.retry, self.policy, || self.fetch_repositories())
            .await
            .into_result()
    }

    async fn list_open_pull_requests(
        &self,
        repo: &str,
    ) -> Result<Vec<OpenPullRequest>, GitHubApiError> {
        retry_with_backoff(self.retry, self.policy, || {
            self.fetch_open_pull_requests(repo)
        })
        .await
        .into_result()
    }
}

impl std::fmt::Debug for GitHubHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubHost")
            .field("owner", &self.owner)
            .field("organization", &self.organization)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
