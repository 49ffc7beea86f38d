//! HTTP server for the dependency cache.
//!
//! # Endpoints
//!
//! - `POST /` - Accepts GitHub webhook deliveries and updates the cache
//! - `GET /` - Returns the cache snapshot as JSON
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;

pub mod health;
pub mod snapshot;
pub mod webhook;

pub use health::health_handler;
pub use snapshot::snapshot_handler;
pub use webhook::webhook_handler;

use crate::cache::DependencyCache;
use crate::config::Config;
use crate::filter::RepoFilter;

/// Header/value pair a snapshot request must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiToken {
    pub header: String,
    pub value: String,
}

/// Request authentication settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Security {
    /// Webhook secret. `None` disables signature checks.
    pub webhook_secret: Option<Vec<u8>>,

    /// Reject (rather than log) deliveries that fail the signature check.
    pub enforce_signature: bool,

    pub api_token: Option<ApiToken>,
}

impl Default for Security {
    fn default() -> Self {
        Security {
            webhook_secret: None,
            enforce_signature: true,
            api_token: None,
        }
    }
}

impl Security {
    pub fn from_config(config: &Config) -> Self {
        Security {
            webhook_secret: config.webhook_secret().map(<[u8]>::to_vec),
            enforce_signature: config.enforce_signature,
            api_token: config.api_token().map(|(header, value)| ApiToken {
                header: header.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cache: DependencyCache,
    filter: RepoFilter,
    security: Security,
}

impl AppState {
    pub fn new(cache: DependencyCache, filter: RepoFilter, security: Security) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                cache,
                filter,
                security,
            }),
        }
    }

    pub fn cache(&self) -> &DependencyCache {
        &self.inner.cache
    }

    pub fn filter(&self) -> &RepoFilter {
        &self.inner.filter
    }

    pub fn webhook_secret(&self) -> Option<&[u8]> {
        self.inner.security.webhook_secret.as_deref()
    }

    pub fn enforce_signature(&self) -> bool {
        self.inner.security.enforce_signature
    }

    pub fn api_token(&self) -> Option<&ApiToken> {
        self.inner.security.api_token.as_ref()
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::get;

    axum::Router::new()
        .route("/", get(snapshot_handler).post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
