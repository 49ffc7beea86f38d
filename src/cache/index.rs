//! The unlocked cache data structure.
//!
//! `CacheIndex` holds three maps keyed by [`PrKey`]:
//!
//! - `branches`: the source branch of every tracked pull request
//! - `dependencies`: for each pull request, the pull request it depends on in
//!   each target repository (at most one per target repository)
//! - `dependents`: the reverse of `dependencies`
//!
//! Every method leaves `dependents` equal to the inversion of `dependencies`.
//! Reverse sets that become empty are removed.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::types::{PrKey, PrNumber};

/// Dependencies declared by one pull request: target repository → number.
pub type DependencySet = BTreeMap<String, PrNumber>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheIndex {
    branches: HashMap<PrKey, String>,
    dependencies: HashMap<PrKey, DependencySet>,
    dependents: HashMap<PrKey, BTreeSet<PrKey>>,
}

impl CacheIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_branch(&mut self, key: &PrKey, branch: impl Into<String>) {
        self.branches.insert(key.clone(), branch.into());
    }

    pub fn remove_branch(&mut self, key: &PrKey) {
        self.branches.remove(key);
    }

    /// Replaces the dependency set of `key`.
    ///
    /// Entries that do not parse as `repo#number` are skipped. When two entries
    /// name the same target repository the later one wins. An empty input
    /// leaves an empty set in place, which is distinct from no set at all.
    pub fn set_dependencies<I, S>(&mut self, key: &PrKey, deps: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.remove_dependencies(key);

        let mut set = DependencySet::new();
        for dep in deps {
            match dep.as_ref().parse::<PrKey>() {
                Ok(target) => {
                    set.insert(target.repo, target.number);
                }
                Err(e) => {
                    debug!(pr = %key, error = %e, "Skipping malformed dependency");
                }
            }
        }

        for (repo, number) in &set {
            self.dependents
                .entry(PrKey::new(repo.clone(), *number))
                .or_default()
                .insert(key.clone());
        }
        self.dependencies.insert(key.clone(), set);
    }

    pub fn remove_dependencies(&mut self, key: &PrKey) {
        let Some(previous) = self.dependencies.remove(key) else {
            return;
        };

        for (repo, number) in previous {
            let target = PrKey::new(repo, number);
            if let Some(dependents) = self.dependents.get_mut(&target) {
                dependents.remove(key);
                if dependents.is_empty() {
                    self.dependents.remove(&target);
                }
            }
        }
    }

    pub fn branch(&self, key: &PrKey) -> Option<&str> {
        self.branches.get(key).map(String::as_str)
    }

    pub fn dependencies(&self, key: &PrKey) -> Option<&DependencySet> {
        self.dependencies.get(key)
    }

    /// Pull requests that declare a dependency on `key`.
    pub fn dependents(&self, key: &PrKey) -> Option<&BTreeSet<PrKey>> {
        self.dependents.get(key)
    }

    pub fn iter_branches(&self) -> impl Iterator<Item = (&PrKey, &String)> {
        self.branches.iter()
    }

    pub fn iter_dependencies(&self) -> impl Iterator<Item = (&PrKey, &DependencySet)> {
        self.dependencies.iter()
    }

    pub fn iter_dependents(&self) -> impl Iterator<Item = (&PrKey, &BTreeSet<PrKey>)> {
        self.dependents.iter()
    }

    /// Number of pull requests with a known branch.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// True when no pull request has a known branch, matching [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Rebuilds the reverse index from `dependencies` and compares.
    #[cfg(test)]
    pub(crate) fn reverse_index_is_consistent(&self) -> bool {
        let mut expected: HashMap<PrKey, BTreeSet<PrKey>> = HashMap::new();
        for (key, set) in &self.dependencies {
            for (repo, number) in set {
                expected
                    .entry(PrKey::new(repo.clone(), *number))
                    .or_default()
                    .insert(key.clone());
            }
        }
        expected == self.dependents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{arb_index_op, IndexOp};
    use proptest::prelude::*;

    fn key(repo: &str, n: u64) -> PrKey {
        PrKey::new(repo, n)
    }

    #[test]
    fn add_branch_is_idempotent() {
        let mut once = CacheIndex::new();
        once.add_branch(&key("api", 7), "feature");

        let mut twice = CacheIndex::new();
        twice.add_branch(&key("api", 7), "feature");
        twice.add_branch(&key("api", 7), "feature");

        assert_eq!(once, twice);
    }

    #[test]
    fn add_branch_overwrites() {
        let mut index = CacheIndex::new();
        index.add_branch(&key("api", 7), "old");
        index.add_branch(&key("api", 7), "new");
        assert_eq!(index.branch(&key("api", 7)), Some("new"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn remove_branch_absent_is_noop() {
        let mut index = CacheIndex::new();
        index.remove_branch(&key("api", 7));
        assert!(index.is_empty());
    }

    #[test]
    fn len_and_is_empty_count_branches_only() {
        let mut index = CacheIndex::new();
        index.set_dependencies(&key("api", 7), ["infra-lib#42"]);
        assert_eq!(index.len(), 0);
        assert!(index.is_empty());

        index.add_branch(&key("api", 7), "feature");
        assert_eq!(index.len(), 1);
        assert!(!index.is_empty());
    }

    #[test]
    fn set_dependencies_records_targets() {
        let mut index = CacheIndex::new();
        index.set_dependencies(&key("api", 7), ["infra-lib#42", "web#3"]);

        let deps = index.dependencies(&key("api", 7)).unwrap();
        assert_eq!(deps.get("infra-lib"), Some(&PrNumber(42)));
        assert_eq!(deps.get("web"), Some(&PrNumber(3)));
        assert!(index.dependents(&key("infra-lib", 42)).unwrap().contains(&key("api", 7)));
    }

    #[test]
    fn empty_replace_leaves_present_empty_set() {
        let mut index = CacheIndex::new();
        index.set_dependencies(&key("api", 7), ["infra-lib#42"]);
        index.set_dependencies(&key("api", 7), Vec::<String>::new());

        assert_eq!(index.dependencies(&key("api", 7)), Some(&DependencySet::new()));
        assert!(index.dependents(&key("infra-lib", 42)).is_none());
    }

    #[test]
    fn replace_drops_previous_targets() {
        let mut index = CacheIndex::new();
        index.set_dependencies(&key("api", 7), ["infra-lib#42", "web#3"]);
        index.set_dependencies(&key("api", 7), ["web#4"]);

        let deps = index.dependencies(&key("api", 7)).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps.get("web"), Some(&PrNumber(4)));
        assert!(index.dependents(&key("web", 3)).is_none());
        assert!(index.dependents(&key("infra-lib", 42)).is_none());
        assert!(index.reverse_index_is_consistent());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let mut index = CacheIndex::new();
        index.set_dependencies(&key("api", 7), ["web#abc", "no-hash", "infra-lib#42"]);

        let deps = index.dependencies(&key("api", 7)).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps.get("infra-lib"), Some(&PrNumber(42)));
    }

    #[test]
    fn later_declaration_for_same_repo_wins() {
        let mut index = CacheIndex::new();
        index.set_dependencies(&key("api", 7), ["web#1", "web#2"]);

        let deps = index.dependencies(&key("api", 7)).unwrap();
        assert_eq!(deps.get("web"), Some(&PrNumber(2)));
        assert!(index.dependents(&key("web", 1)).is_none());
        assert!(index.reverse_index_is_consistent());
    }

    #[test]
    fn remove_dependencies_keeps_other_dependents() {
        let mut index = CacheIndex::new();
        index.set_dependencies(&key("api", 7), ["infra-lib#42"]);
        index.set_dependencies(&key("web", 9), ["infra-lib#42"]);
        index.remove_dependencies(&key("api", 7));

        let dependents = index.dependents(&key("infra-lib", 42)).unwrap();
        assert_eq!(dependents.len(), 1);
        assert!(dependents.contains(&key("web", 9)));
        assert!(index.dependencies(&key("api", 7)).is_none());
    }

    proptest! {
        #[test]
        fn reverse_index_stays_symmetric(ops in prop::collection::vec(arb_index_op(), 0..40)) {
            let mut index = CacheIndex::new();
            for op in ops {
                match op {
                    IndexOp::AddBranch(k, b) => index.add_branch(&k, b),
                    IndexOp::RemoveBranch(k) => index.remove_branch(&k),
                    IndexOp::SetDependencies(k, deps) => index.set_dependencies(&k, deps),
                    IndexOp::RemoveDependencies(k) => index.remove_dependencies(&k),
                }
                prop_assert!(index.reverse_index_is_consistent());
            }
        }
    }
}
