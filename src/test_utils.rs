//! Shared test utilities and arbitrary generators for property-based testing.

use crate::types::{PrKey, PrNumber};
use proptest::prelude::*;

/// A small repository alphabet so generated keys collide often.
pub fn arb_repo() -> impl Strategy<Value = String> {
    prop_oneof![Just("api"), Just("web"), Just("infra-lib"), Just("docs")].prop_map(String::from)
}

pub fn arb_pr_number() -> impl Strategy<Value = PrNumber> {
    (1u64..6).prop_map(PrNumber)
}

pub fn arb_pr_key() -> impl Strategy<Value = PrKey> {
    (arb_repo(), arb_pr_number()).prop_map(|(repo, number)| PrKey { repo, number })
}

pub fn arb_branch_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9/-]{0,20}".prop_map(String::from)
}

/// A dependency string, occasionally malformed.
pub fn arb_dependency() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => arb_pr_key().prop_map(|k| format!("{}#{}", k.repo, k.number.0)),
        1 => arb_repo().prop_map(|r| format!("{r}#x")),
        1 => arb_repo(),
    ]
}

/// One primitive cache operation.
#[derive(Debug, Clone)]
pub enum IndexOp {
    AddBranch(PrKey, String),
    RemoveBranch(PrKey),
    SetDependencies(PrKey, Vec<String>),
    RemoveDependencies(PrKey),
}

pub fn arb_index_op() -> impl Strategy<Value = IndexOp> {
    prop_oneof![
        (arb_pr_key(), arb_branch_name()).prop_map(|(k, b)| IndexOp::AddBranch(k, b)),
        arb_pr_key().prop_map(IndexOp::RemoveBranch),
        (arb_pr_key(), prop::collection::vec(arb_dependency(), 0..4))
            .prop_map(|(k, d)| IndexOp::SetDependencies(k, d)),
        arb_pr_key().prop_map(IndexOp::RemoveDependencies),
    ]
}

/// Builds a `pull_request` webhook payload.
pub fn pull_request_payload(
    action: &str,
    repo: &str,
    number: u64,
    branch: &str,
    body: Option<&str>,
) -> serde_json::Value {
    serde_json::json!({
        "action": action,
        "number": number,
        "pull_request": {
            "number": number,
            "head": { "ref": branch, "sha": "1234567890abcdef1234567890abcdef12345678" },
            "body": body,
        },
        "repository": {
            "name": repo,
            "owner": { "login": "acme" }
        }
    })
}
