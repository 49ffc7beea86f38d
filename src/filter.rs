//! Repository include/exclude rules.
//!
//! A repository is tracked when at least one include rule matches it and no
//! exclude rule does. Rules come from the config file and are compiled once.
//!
//! | Rule | Matches |
//! |------|---------|
//! | `{ "name": "*" }` | every repository |
//! | `{ "name": "api" }` | exactly `api` |
//! | `{ "name": "^svc-", "regexp": true }` | any name the regex finds a match in |
//!
//! A rule whose regex does not compile matches nothing. An invalid exclude
//! rule therefore excludes nothing and an invalid include rule includes nothing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One include or exclude rule as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRule {
    pub name: String,

    /// Treat `name` as a regular expression instead of a literal.
    #[serde(default)]
    pub regexp: bool,
}

impl RepoRule {
    pub fn literal(name: impl Into<String>) -> Self {
        RepoRule {
            name: name.into(),
            regexp: false,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        RepoRule {
            name: pattern.into(),
            regexp: true,
        }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Any,
    Literal(String),
    Pattern(Regex),
    Never,
}

impl Matcher {
    fn compile(rule: &RepoRule) -> Self {
        if !rule.regexp {
            return if rule.name == "*" {
                Matcher::Any
            } else {
                Matcher::Literal(rule.name.clone())
            };
        }

        match Regex::new(&rule.name) {
            Ok(re) => Matcher::Pattern(re),
            Err(e) => {
                warn!(pattern = %rule.name, error = %e, "Invalid repository regex, rule will never match");
                Matcher::Never
            }
        }
    }

    fn matches(&self, repo: &str) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Literal(name) => name == repo,
            Matcher::Pattern(re) => re.is_match(repo),
            Matcher::Never => false,
        }
    }
}

/// Compiled include/exclude rule lists.
#[derive(Debug, Clone)]
pub struct RepoFilter {
    include: Vec<Matcher>,
    exclude: Vec<Matcher>,
}

impl RepoFilter {
    pub fn new(include: &[RepoRule], exclude: &[RepoRule]) -> Self {
        RepoFilter {
            include: include.iter().map(Matcher::compile).collect(),
            exclude: exclude.iter().map(Matcher::compile).collect(),
        }
    }

    /// Returns true if `repo` should be tracked.
    pub fn is_included(&self, repo: &str) -> bool {
        self.include.iter().any(|m| m.matches(repo)) && !self.exclude.iter().any(|m| m.matches(repo))
    }
}
