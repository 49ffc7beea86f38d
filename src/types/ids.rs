//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of a pull request number with other
//! integers, and give the `repo#number` notation used in dependency
//! declarations a single parsing point.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A pull request number within a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrNumber(pub u64);

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for PrNumber {
    fn from(n: u64) -> Self {
        PrNumber(n)
    }
}

/// Error returned when a `repo#number` reference cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pull request reference: {0:?}")]
pub struct InvalidPrKey(pub String);

/// Identifies a pull request by repository name and number.
///
/// All repositories live under the single configured owner, so the owner is
/// not part of the key. The textual form is `repo#number`, which is also the
/// form dependency declarations use.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrKey {
    pub repo: String,
    pub number: PrNumber,
}

impl PrKey {
    pub fn new(repo: impl Into<String>, number: impl Into<PrNumber>) -> Self {
        PrKey {
            repo: repo.into(),
            number: number.into(),
        }
    }
}

impl fmt::Display for PrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.repo, self.number)
    }
}

impl FromStr for PrKey {
    type Err = InvalidPrKey;

    /// Parses `repo#number`.
    ///
    /// The repository part must be non-empty and the number part must be a
    /// base-10 integer. Nothing else is validated here; the strict character
    /// rules for declarations live in the declaration parser.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (repo, number) = s.split_once('#').ok_or_else(|| InvalidPrKey(s.to_string()))?;
        if repo.is_empty() {
            return Err(InvalidPrKey(s.to_string()));
        }
        let number: u64 = number.parse().map_err(|_| InvalidPrKey(s.to_string()))?;
        Ok(PrKey::new(repo, number))
    }
}

/// A GitHub webhook delivery ID. Only used to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeliveryId(pub String);

impl DeliveryId {
    pub fn new(s: impl Into<String>) -> Self {
        DeliveryId(s.into())
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
