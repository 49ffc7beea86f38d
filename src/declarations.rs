//! Parser for dependency declarations in pull request descriptions.
//!
//! A pull request declares that it depends on another pull request by putting
//! a line of exactly this shape in its description:
//!
//! ```text
//! DependsOn:infra-lib#42
//! ```
//!
//! The repository name is 3 to 40 characters of `[a-z0-9-_]` and the number is
//! 1 to 10 digits. The whole line must match: leading text, trailing text and
//! trailing whitespace all disqualify it. Everything else in the description is
//! ignored.
//!
//! # Example
//!
//! ```
//! use pullrequestd::declarations::parse_dependencies;
//!
//! let body = "Fixes the build.\r\nDependsOn:infra-lib#42\r\nDependsOn:web#7";
//! assert_eq!(parse_dependencies(body), vec!["infra-lib#42", "web#7"]);
//! ```

use std::sync::LazyLock;

use regex::Regex;

const DECLARATION_PATTERN: &str = r"^DependsOn:([a-z0-9\-_]{3,40}#[0-9]{1,10})$";

static DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DECLARATION_PATTERN).expect("declaration pattern is valid"));

/// Extracts `repo#number` references from a pull request body.
///
/// Lines are split on `\n` and `\r\n`. References are returned in the order
/// they appear, duplicates included.
pub fn parse_dependencies(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| DECLARATION.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
