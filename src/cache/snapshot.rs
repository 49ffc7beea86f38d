//! Point-in-time export of the cache.
//!
//! The JSON shape groups everything by repository, then by pull request number:
//!
//! ```json
//! {
//!   "branches":     { "api": { "7": "feature/login" } },
//!   "dependencies": { "api": { "7": { "infra-lib": 42 } } },
//!   "dependents":   { "infra-lib": { "42": { "api": [7] } } },
//!   "Version": "1"
//! }
//! ```
//!
//! A pull request that declared no dependencies still appears under
//! `dependencies` with an empty object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::PrNumber;

use super::index::CacheIndex;

/// Version tag of the snapshot format.
pub const SNAPSHOT_VERSION: &str = "1";

/// repo → number → value
pub type PerPr<T> = BTreeMap<String, BTreeMap<PrNumber, T>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub branches: PerPr<String>,

    pub dependencies: PerPr<BTreeMap<String, PrNumber>>,

    /// For each pull request, the pull requests that depend on it, grouped by
    /// the dependent's repository.
    #[serde(default)]
    pub dependents: PerPr<BTreeMap<String, Vec<PrNumber>>>,

    #[serde(rename = "Version")]
    pub version: String,
}

impl CacheSnapshot {
    pub(super) fn capture(index: &CacheIndex) -> Self {
        let mut branches: PerPr<String> = BTreeMap::new();
        for (key, branch) in index.iter_branches() {
            branches
                .entry(key.repo.clone())
                .or_default()
                .insert(key.number, branch.clone());
        }

        let mut dependencies: PerPr<BTreeMap<String, PrNumber>> = BTreeMap::new();
        for (key, set) in index.iter_dependencies() {
            dependencies
                .entry(key.repo.clone())
                .or_default()
                .insert(key.number, set.clone());
        }

        let mut dependents: PerPr<BTreeMap<String, Vec<PrNumber>>> = BTreeMap::new();
        for (target, sources) in index.iter_dependents() {
            let mut grouped: BTreeMap<String, Vec<PrNumber>> = BTreeMap::new();
            // `sources` is a BTreeSet, so numbers arrive sorted per repository.
            for source in sources {
                grouped.entry(source.repo.clone()).or_default().push(source.number);
            }
            dependents
                .entry(target.repo.clone())
                .or_default()
                .insert(target.number, grouped);
        }

        CacheSnapshot {
            branches,
            dependencies,
            dependents,
            version: SNAPSHOT_VERSION.to_string(),
        }
    }

    pub fn branch(&self, repo: &str, number: u64) -> Option<&str> {
        self.branches
            .get(repo)
            .and_then(|prs| prs.get(&PrNumber(number)))
            .map(String::as_str)
    }

    pub fn dependencies(&self, repo: &str, number: u64) -> Option<&BTreeMap<String, PrNumber>> {
        self.dependencies
            .get(repo)
            .and_then(|prs| prs.get(&PrNumber(number)))
    }
}
