//! Query sanitization
//!
//! Two query keys are operation-reserved and must never leak into a request:
//! `policy` (a filter handled elsewhere) and `token` (carried as a header on
//! self-lookup, never as a query-string parameter). Sanitization returns a
//! new map and never mutates its input; the reference implementation deleted
//! `policy` from the caller's own object, which was a latent bug.

use serde_json::{Map, Value};

/// Filter key stripped unconditionally from every query.
pub const POLICY_FILTER_KEY: &str = "policy";

/// Credential key consumed by self-lookup header resolution.
pub const TOKEN_QUERY_KEY: &str = "token";

/// Returns a copy of `query` without the reserved keys. Absent keys are a
/// no-op; all other entries are preserved with unchanged values.
pub fn sanitize(query: &Map<String, Value>) -> Map<String, Value> {
    let mut cleaned = query.clone();
    cleaned.remove(POLICY_FILTER_KEY);
    cleaned.remove(TOKEN_QUERY_KEY);
    cleaned
}

/// The credential carried under the reserved `token` key, if any.
pub fn token_of(query: &Map<String, Value>) -> Option<String> {
    query
        .get(TOKEN_QUERY_KEY)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}
