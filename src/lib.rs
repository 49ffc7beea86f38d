//! pullrequestd - a cache of cross-repository pull request dependencies.
//!
//! Pull requests declare `DependsOn:<repo>#<number>` lines in their
//! descriptions. The daemon loads every open pull request of the configured
//! owner at startup, keeps the cache current from `pull_request` webhooks, and
//! serves the whole cache as JSON.

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod declarations;
pub mod filter;
pub mod github;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
