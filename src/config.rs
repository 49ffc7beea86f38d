//! Configuration file loading.
//!
//! The daemon is configured by a single JSON file passed via `start --config`.
//! Field names follow the established on-disk format, so existing config files
//! keep working:
//!
//! ```json
//! {
//!   "version": "1",
//!   "port": "32765",
//!   "incoming_webhook_secret": "s3cr3t",
//!   "outgoing_github_token": "ghp_...",
//!   "pull_request_depends_on": {
//!     "owner": "my-org",
//!     "organization": true,
//!     "repositories": [{ "name": "*" }],
//!     "exclude_repositories": [{ "name": "^archived-", "regexp": true }]
//!   },
//!   "jenkins": {
//!     "base_url": "https://ci.example.com",
//!     "endpoints": [
//!       { "id": "build", "path": "/job/build", "condition": "...",
//!         "retry": { "count": "3", "delay": "10" },
//!         "success": { "http_status": "201" } }
//!     ]
//!   }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::{RepoFilter, RepoRule};

/// Errors that can occur while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON or does not match the schema.
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A field has a value the daemon cannot work with.
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub version: String,

    /// TCP port the HTTP server listens on.
    pub port: String,

    /// Shared secret for webhook signatures. Empty disables the check.
    #[serde(rename = "incoming_webhook_secret", default)]
    pub webhook_secret: String,

    /// Token used for GitHub API calls during bootstrap.
    #[serde(rename = "outgoing_github_token", default)]
    pub github_token: String,

    /// Expected value of the snapshot API token header.
    #[serde(rename = "incoming_api_token_value", default)]
    pub api_token_value: String,

    /// Name of the header carrying the snapshot API token.
    #[serde(rename = "incoming_api_token_header", default)]
    pub api_token_header: String,

    /// Reject webhooks whose signature does not verify.
    ///
    /// When false, a bad signature is logged and the delivery is processed anyway.
    #[serde(default = "default_enforce_signature")]
    pub enforce_signature: bool,

    /// Retries for transient GitHub errors during bootstrap. Zero disables retrying.
    #[serde(default)]
    pub bootstrap_retries: u32,

    pub pull_request_depends_on: PullRequestDependsOn,

    #[serde(default)]
    pub jenkins: Jenkins,
}

fn default_enforce_signature() -> bool {
    true
}

/// Which repositories are tracked, and under which owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequestDependsOn {
    pub owner: String,

    /// Whether `owner` is an organization (as opposed to a user account).
    #[serde(default)]
    pub organization: bool,

    #[serde(default)]
    pub repositories: Vec<RepoRule>,

    #[serde(default)]
    pub exclude_repositories: Vec<RepoRule>,
}

impl PullRequestDependsOn {
    /// Compiles the include and exclude rules.
    pub fn filter(&self) -> RepoFilter {
        RepoFilter::new(&self.repositories, &self.exclude_repositories)
    }
}

/// Build-trigger collaborator settings.
///
/// Nothing in the daemon calls Jenkins; the settings are loaded and validated
/// so a consumer of the dependency snapshot can share one config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Jenkins {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub endpoints: Vec<JenkinsEndpoint>,
}

impl Jenkins {
    /// Looks up an endpoint by its `id`.
    pub fn endpoint(&self, id: &str) -> Option<&JenkinsEndpoint> {
        self.endpoints.iter().find(|e| e.id == id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JenkinsEndpoint {
    pub id: String,
    pub path: String,
    #[serde(default)]
    pub retry: JenkinsEndpointRetry,
    #[serde(default)]
    pub success: JenkinsEndpointSuccess,
    #[serde(default)]
    pub condition: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JenkinsEndpointRetry {
    #[serde(default)]
    pub delay: String,
    #[serde(default)]
    pub count: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JenkinsEndpointSuccess {
    #[serde(default)]
    pub http_status: String,
}

impl JenkinsEndpoint {
    /// Number of attempts for this endpoint. Defaults to 1 when unset.
    pub fn retry_count(&self) -> Result<u32, ConfigError> {
        if self.retry.count.is_empty() {
            return Ok(1);
        }
        self.retry.count.parse().map_err(|_| ConfigError::Invalid {
            field: "jenkins.endpoints.retry.count",
            reason: format!("{:?} is not an integer", self.retry.count),
        })
    }

    /// Delay between attempts. Defaults to zero when unset.
    pub fn retry_delay(&self) -> Result<Duration, ConfigError> {
        if self.retry.delay.is_empty() {
            return Ok(Duration::ZERO);
        }
        self.retry
            .delay
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid {
                field: "jenkins.endpoints.retry.delay",
                reason: format!("{:?} is not an integer", self.retry.delay),
            })
    }

    /// Returns true if `status` is the configured success status.
    ///
    /// An unset or unparseable expected status never matches.
    pub fn is_success_status(&self, status: u16) -> bool {
        self.success
            .http_status
            .parse::<u16>()
            .is_ok_and(|expected| expected == status)
    }
}

impl Config {
    /// Reads, parses and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parses and validates config JSON.
    pub fn from_json(raw: &[u8]) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_slice(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.listen_port()?;

        if self.pull_request_depends_on.owner.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "pull_request_depends_on.owner",
                reason: "must not be empty".to_string(),
            });
        }

        if let Some((header, _)) = self.api_token()
            && HeaderName::from_bytes(header.as_bytes()).is_err()
        {
            return Err(ConfigError::Invalid {
                field: "incoming_api_token_header",
                reason: format!("{header:?} is not a valid HTTP header name"),
            });
        }

        for endpoint in &self.jenkins.endpoints {
            endpoint.retry_count()?;
            endpoint.retry_delay()?;
        }

        Ok(())
    }

    /// The port to listen on.
    pub fn listen_port(&self) -> Result<u16, ConfigError> {
        self.port.trim().parse().map_err(|_| ConfigError::Invalid {
            field: "port",
            reason: format!("{:?} is not a valid TCP port", self.port),
        })
    }

    /// The webhook secret, if signature checking is configured.
    pub fn webhook_secret(&self) -> Option<&[u8]> {
        (!self.webhook_secret.is_empty()).then(|| self.webhook_secret.as_bytes())
    }

    /// Header name and expected value guarding the snapshot endpoint, if both are set.
    pub fn api_token(&self) -> Option<(&str, &str)> {
        if self.api_token_header.is_empty() || self.api_token_value.is_empty() {
            None
        } else {
            Some((&self.api_token_header, &self.api_token_value))
        }
    }
}
