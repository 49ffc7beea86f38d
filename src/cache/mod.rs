//! The shared dependency cache.
//!
//! [`DependencyCache`] is the only shared mutable state in the daemon. It is
//! constructed once in `main`, filled by the bootstrap scan, then handed to the
//! HTTP server where webhook handlers mutate it and snapshot requests read it.
//!
//! # Locking
//!
//! A single mutex guards the whole [`CacheIndex`]. Each public method is one
//! critical section, and [`DependencyCache::apply`] runs a complete webhook
//! mutation (e.g. "remove branch, then remove dependencies") under one lock
//! acquisition. A concurrent [`DependencyCache::snapshot`] therefore sees a
//! mutation either entirely or not at all. No I/O happens while the lock is held.
//!
//! # Ordering
//!
//! Mutations for the same pull request are applied in whatever order they
//! reach the lock; the last one wins. GitHub does not guarantee delivery order
//! and no sequence numbers are tracked, so a delayed `opened` can overwrite a
//! newer `edited`.

mod index;
mod snapshot;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::types::PrKey;

pub use index::{CacheIndex, DependencySet};
pub use snapshot::{CacheSnapshot, PerPr, SNAPSHOT_VERSION};

/// A complete change to one pull request's cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMutation {
    /// First sighting (`opened`, `reopened`, bootstrap): set branch and dependencies.
    Upsert {
        branch: String,
        dependencies: Vec<String>,
    },

    /// `edited`: drop the old branch, record the new one, replace dependencies.
    Replace {
        branch: String,
        dependencies: Vec<String>,
    },

    /// `closed`: forget the branch and the dependencies.
    Remove,
}

/// Cheaply cloneable handle to the shared cache.
#[derive(Debug, Clone, Default)]
pub struct DependencyCache {
    inner: Arc<Mutex<CacheIndex>>,
}

impl DependencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every mutation leaves the index consistent before returning, so a
    /// poisoned lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, CacheIndex> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_branch(&self, key: &PrKey, branch: impl Into<String>) {
        self.lock().add_branch(key, branch);
    }

    pub fn remove_branch(&self, key: &PrKey) {
        self.lock().remove_branch(key);
    }

    /// Replaces the dependency set of `key` with the well-formed `repo#number`
    /// entries of `deps`.
    pub fn set_dependencies<I, S>(&self, key: &PrKey, deps: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.lock().set_dependencies(key, deps);
    }

    pub fn remove_dependencies(&self, key: &PrKey) {
        self.lock().remove_dependencies(key);
    }

    /// Applies a whole mutation in one critical section.
    pub fn apply(&self, key: &PrKey, mutation: &CacheMutation) {
        let mut index = self.lock();
        match mutation {
            CacheMutation::Upsert {
                branch,
                dependencies,
            } => {
                index.add_branch(key, branch.clone());
                index.set_dependencies(key, dependencies);
            }
            CacheMutation::Replace {
                branch,
                dependencies,
            } => {
                index.remove_branch(key);
                index.add_branch(key, branch.clone());
                index.set_dependencies(key, dependencies);
            }
            CacheMutation::Remove => {
                index.remove_branch(key);
                index.remove_dependencies(key);
            }
        }
        debug!(pr = %key, tracked = index.len(), "Applied cache mutation");
    }

    /// Returns a consistent copy of the whole cache.
    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot::capture(&self.lock())
    }

    pub fn branch(&self, key: &PrKey) -> Option<String> {
        self.lock().branch(key).map(str::to_string)
    }

    pub fn dependencies(&self, key: &PrKey) -> Option<DependencySet> {
        self.lock().dependencies(key).cloned()
    }

    pub fn dependents(&self, key: &PrKey) -> BTreeSet<PrKey> {
        self.lock().dependents(key).cloned().unwrap_or_default()
    }

    /// Number of pull requests with a known branch.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
