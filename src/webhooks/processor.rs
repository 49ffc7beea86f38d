//! Turns a parsed pull request event into a cache mutation.
//!
//! Processing is split in two. [`plan`] is pure: it checks the preconditions,
//! reads the action and extracts dependency declarations. [`process_event`]
//! then applies the planned mutation in one critical section, so the body
//! parsing never runs under the cache lock.
//!
//! Preconditions are checked in order, and the first failure wins:
//!
//! 1. the event names a repository and a number
//! 2. the description is non-empty (this drops `closed` events for pull
//!    requests without a description too)
//! 3. the repository passes the filter

use std::fmt;

use tracing::{debug, info};

use crate::cache::{CacheMutation, DependencyCache};
use crate::declarations::parse_dependencies;
use crate::filter::RepoFilter;
use crate::types::PrKey;

use super::events::{PrAction, PullRequestEvent};

/// Why an event left the cache untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The payload had no repository object or an empty repository name.
    MissingRepository,
    /// Neither `number` nor `pull_request.number` was present.
    MissingNumber,
    /// The pull request description is empty or `null`.
    EmptyBody,
    /// The repository is not included by the configured rules.
    Filtered,
    /// An action such as `labeled` or `synchronize`.
    UnhandledAction(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingRepository => f.write_str("no repository"),
            SkipReason::MissingNumber => f.write_str("no pull request number"),
            SkipReason::EmptyBody => f.write_str("empty description"),
            SkipReason::Filtered => f.write_str("repository not tracked"),
            SkipReason::UnhandledAction(action) => write!(f, "action {action:?} not handled"),
        }
    }
}

/// What to do with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Skip(SkipReason),
    Apply { key: PrKey, mutation: CacheMutation },
}

/// Decides how `event` changes the cache, without touching it.
pub fn plan(event: &PullRequestEvent, filter: &RepoFilter) -> Decision {
    let Some(repo) = event.repo.as_deref() else {
        return Decision::Skip(SkipReason::MissingRepository);
    };
    let Some(number) = event.number else {
        return Decision::Skip(SkipReason::MissingNumber);
    };
    if event.body.is_empty() {
        return Decision::Skip(SkipReason::EmptyBody);
    }
    if !filter.is_included(repo) {
        return Decision::Skip(SkipReason::Filtered);
    }

    let key = PrKey::new(repo, number);
    let mutation = match &event.action {
        PrAction::Opened | PrAction::Reopened => CacheMutation::Upsert {
            branch: event.head_branch.clone(),
            dependencies: parse_dependencies(&event.body),
        },
        PrAction::Edited => CacheMutation::Replace {
            branch: event.head_branch.clone(),
            dependencies: parse_dependencies(&event.body),
        },
        PrAction::Closed => CacheMutation::Remove,
        PrAction::Other(action) => {
            return Decision::Skip(SkipReason::UnhandledAction(action.clone()));
        }
    };

    Decision::Apply { key, mutation }
}

/// Plans and applies one event. Returns the decision for logging and tests.
pub fn process_event(
    cache: &DependencyCache,
    filter: &RepoFilter,
    event: &PullRequestEvent,
) -> Decision {
    let decision = plan(event, filter);
    match &decision {
        Decision::Apply { key, mutation } => {
            cache.apply(key, mutation);
            info!(
                pr = %key,
                action = %event.action,
                branch = %event.head_branch,
                "Updated dependency cache"
            );
        }
        Decision::Skip(SkipReason::Filtered) => {
            info!(
                repo = event.repo.as_deref().unwrap_or_default(),
                action = %event.action,
                "Pull request event rejected by repository rules"
            );
        }
        Decision::Skip(reason) => {
            debug!(action = %event.action, %reason, "Ignoring pull request event");
        }
    }
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::RepoRule;
    use crate::types::PrNumber;
    use proptest::prelude::*;

    fn allow_all() -> RepoFilter {
        RepoFilter::new(&[RepoRule::literal("*")], &[])
    }

    fn event(action: &str, repo: &str, number: u64, branch: &str, body: &str) -> PullRequestEvent {
        PullRequestEvent {
            action: PrAction::from_wire(action),
            repo: Some(repo.to_string()).filter(|r| !r.is_empty()),
            number: Some(PrNumber(number)),
            head_branch: branch.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn opened_records_branch_and_dependencies() {
        let cache = DependencyCache::new();
        let e = event(
            "opened",
            "api",
            7,
            "feature/login",
            "DependsOn:infra-lib#42\r\nsome text",
        );

        let decision = process_event(&cache, &allow_all(), &e);
        assert!(matches!(decision, Decision::Apply { .. }));

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.branch("api", 7), Some("feature/login"));
        assert_eq!(
            snapshot.dependencies("api", 7).unwrap().get("infra-lib"),
            Some(&PrNumber(42))
        );
    }

    #[test]
    fn reopened_behaves_like_opened() {
        let e = event("reopened", "api", 7, "b", "DependsOn:web#1");
        assert_eq!(
            plan(&e, &allow_all()),
            Decision::Apply {
                key: PrKey::new("api", 7),
                mutation: CacheMutation::Upsert {
                    branch: "b".to_string(),
                    dependencies: vec!["web#1".to_string()],
                },
            }
        );
    }

    #[test]
    fn edited_without_declarations_clears_dependencies() {
        let cache = DependencyCache::new();
        let filter = allow_all();
        process_event(&cache, &filter, &event("opened", "api", 7, "b", "DependsOn:infra-lib#42"));
        process_event(&cache, &filter, &event("edited", "api", 7, "b2", "no deps here"));

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.branch("api", 7), Some("b2"));
        assert!(snapshot.dependencies("api", 7).unwrap().is_empty());
    }

    #[test]
    fn closed_removes_everything() {
        let cache = DependencyCache::new();
        let filter = allow_all();
        process_event(&cache, &filter, &event("opened", "api", 7, "b", "DependsOn:infra-lib#42"));
        process_event(&cache, &filter, &event("closed", "api", 7, "b", "DependsOn:infra-lib#42"));

        let snapshot = cache.snapshot();
        assert!(snapshot.branch("api", 7).is_none());
        assert!(snapshot.dependencies("api", 7).is_none());
        assert!(snapshot.dependents.is_empty());
    }

    #[test]
    fn closed_with_empty_body_is_dropped() {
        let cache = DependencyCache::new();
        let filter = allow_all();
        process_event(&cache, &filter, &event("opened", "api", 7, "b", "DependsOn:web#1"));

        let decision = process_event(&cache, &filter, &event("closed", "api", 7, "b", ""));
        assert_eq!(decision, Decision::Skip(SkipReason::EmptyBody));
        assert_eq!(cache.snapshot().branch("api", 7), Some("b"));
    }

    #[test]
    fn excluded_repository_is_filtered() {
        let cache = DependencyCache::new();
        let filter = RepoFilter::new(&[RepoRule::literal("*")], &[RepoRule::literal("api")]);

        let decision = process_event(&cache, &filter, &event("opened", "api", 7, "b", "DependsOn:web#1"));
        assert_eq!(decision, Decision::Skip(SkipReason::Filtered));
        assert!(cache.is_empty());
    }

    #[test]
    fn preconditions_are_checked_in_order() {
        let excluded = RepoFilter::new(&[], &[]);

        let mut e = event("opened", "", 7, "b", "");
        e.number = None;
        assert_eq!(plan(&e, &excluded), Decision::Skip(SkipReason::MissingRepository));

        e.repo = Some("api".to_string());
        assert_eq!(plan(&e, &excluded), Decision::Skip(SkipReason::MissingNumber));

        e.number = Some(PrNumber(7));
        assert_eq!(plan(&e, &excluded), Decision::Skip(SkipReason::EmptyBody));

        e.body = "text".to_string();
        assert_eq!(plan(&e, &excluded), Decision::Skip(SkipReason::Filtered));
    }

    #[test]
    fn other_actions_are_ignored() {
        let e = event("synchronize", "api", 7, "b", "DependsOn:web#1");
        assert_eq!(
            plan(&e, &allow_all()),
            Decision::Skip(SkipReason::UnhandledAction("synchronize".to_string()))
        );
    }

    proptest! {
        #[test]
        fn filtered_repositories_never_change_the_cache(
            action in prop_oneof![Just("opened"), Just("reopened"), Just("edited"), Just("closed")],
            number in 1u64..100,
        ) {
            let cache = DependencyCache::new();
            let filter = RepoFilter::new(&[RepoRule::literal("web")], &[]);
            process_event(&cache, &filter, &event(action, "api", number, "b", "DependsOn:web#1"));
            prop_assert!(cache.is_empty());
        }
    }
}
