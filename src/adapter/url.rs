//! URL construction for the token endpoint family
//!
//! All URLs are agent-relative (`acl/...`); the transport prefixes the agent
//! address and API version. Two classification predicates are exposed for
//! the response layer, which must tell self/clone/fetch-one responses apart
//! from batch responses by URL alone.

use serde_json::{Map, Value};

use super::protocol::{TokenSnapshot, DATACENTER_PARAM};
use super::query::sanitize;
use crate::error::AdapterError;

pub const TOKENS_PATH: &str = "acl/tokens";
pub const TOKEN_PATH: &str = "acl/token";
pub const SELF_PATH: &str = "acl/token/self";

/// Join a root path, extra segments and a query map into a relative URL.
/// Segments and parameter values are percent-encoded; `null` and composite
/// parameter values are skipped.
pub fn append_url(root: &str, segments: &[&str], params: &Map<String, Value>) -> String {
    let mut url = root.to_string();
    for segment in segments {
        url.push('/');
        url.push_str(&urlencoding::encode(segment));
    }

    let query_string: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some(format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&value)
            ))
        })
        .collect();

    if !query_string.is_empty() {
        url.push('?');
        url.push_str(&query_string.join("&"));
    }
    url
}

/// `acl/tokens` with the sanitized list filters.
pub fn url_for_query(query: &Map<String, Value>) -> String {
    append_url(TOKENS_PATH, &[], &sanitize(query))
}

/// `acl/token/{id}`. The id is taken from the query, used in the path and
/// removed from the query string. Fails before any network call when absent.
pub fn url_for_query_record(query: &Map<String, Value>) -> Result<String, AdapterError> {
    let id = query
        .get("id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or(AdapterError::MissingId)?;

    let mut params = sanitize(query);
    params.remove("id");
    Ok(append_url(TOKEN_PATH, &[id.as_str()], &params))
}

/// `acl/token/self`; the credential travels as a header, never a parameter.
pub fn url_for_query_self(query: &Map<String, Value>) -> String {
    append_url(SELF_PATH, &[], &sanitize(query))
}

/// `acl/token?dc=...`
pub fn url_for_create(snapshot: &TokenSnapshot) -> String {
    append_url(TOKEN_PATH, &[], &datacenter_params(snapshot))
}

/// `acl/token/{accessor_id}?dc=...`
pub fn url_for_update(snapshot: &TokenSnapshot) -> String {
    append_url(
        TOKEN_PATH,
        &[snapshot.accessor_id.as_str()],
        &datacenter_params(snapshot),
    )
}

/// `acl/token/{accessor_id}?dc=...`
pub fn url_for_delete(snapshot: &TokenSnapshot) -> String {
    url_for_update(snapshot)
}

/// `acl/token/{accessor_id}/clone?dc=...`
pub fn url_for_clone(snapshot: &TokenSnapshot) -> String {
    append_url(
        TOKEN_PATH,
        &[snapshot.accessor_id.as_str(), "clone"],
        &datacenter_params(snapshot),
    )
}

fn datacenter_params(snapshot: &TokenSnapshot) -> Map<String, Value> {
    let mut params = Map::new();
    if !snapshot.datacenter.is_empty() {
        params.insert(
            DATACENTER_PARAM.to_string(),
            Value::String(snapshot.datacenter.clone()),
        );
    }
    params
}

/// The path portion of a URL: query string, scheme/host and the API-version
/// prefix stripped, so both adapter-built relative URLs and absolute request
/// URLs classify identically.
pub fn path_of(url: &str) -> &str {
    let mut path = url.split(['?', '#']).next().unwrap_or(url);
    if let Some(idx) = path.find("://") {
        let host_and_path = &path[idx + 3..];
        path = host_and_path.split_once('/').map(|(_, p)| p).unwrap_or("");
    }
    let path = path.trim_start_matches('/');
    path.strip_prefix("v1/").unwrap_or(path)
}

/// True when the URL addresses the clone endpoint (last segment `clone`).
pub fn is_clone_url(url: &str) -> bool {
    path_of(url).rsplit('/').next() == Some("clone")
}

/// True when the URL is the self-lookup endpoint.
pub fn is_self_url(url: &str) -> bool {
    path_of(url) == SELF_PATH
}

/// True when the URL addresses a single token by id.
pub fn is_query_record_url(url: &str) -> bool {
    let path = path_of(url);
    path.starts_with("acl/token/") && !is_self_url(url) && !is_clone_url(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn snapshot() -> TokenSnapshot {
        TokenSnapshot {
            accessor_id: "ABC123".to_string(),
            datacenter: "dc1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_url_for_query() {
        let url = url_for_query(&query(json!({"dc": "dc1", "policy": "p", "token": "t"})));
        assert_eq!(url, "acl/tokens?dc=dc1");
    }

    #[test]
    fn test_url_for_query_without_params() {
        assert_eq!(url_for_query(&Map::new()), "acl/tokens");
    }

    #[test]
    fn test_url_for_query_record() {
        let url = url_for_query_record(&query(json!({"id": "ABC123", "dc": "dc1"}))).unwrap();
        assert_eq!(url, "acl/token/ABC123?dc=dc1");
    }

    #[test]
    fn test_url_for_query_record_requires_id() {
        let err = url_for_query_record(&query(json!({"dc": "dc1"}))).unwrap_err();
        assert!(matches!(err, AdapterError::MissingId));
    }

    #[test]
    fn test_url_for_query_self() {
        let url = url_for_query_self(&query(json!({"token": "secret", "dc": "dc1"})));
        assert_eq!(url, "acl/token/self?dc=dc1");
    }

    #[test]
    fn test_write_urls_carry_datacenter_once() {
        let snap = snapshot();
        for url in [
            url_for_create(&snap),
            url_for_update(&snap),
            url_for_delete(&snap),
            url_for_clone(&snap),
        ] {
            assert_eq!(url.matches("dc=dc1").count(), 1, "url: {}", url);
        }
    }

    #[test]
    fn test_write_urls_skip_empty_datacenter() {
        let snap = TokenSnapshot {
            accessor_id: "ABC123".to_string(),
            ..Default::default()
        };
        assert_eq!(url_for_create(&snap), "acl/token");
        assert_eq!(url_for_clone(&snap), "acl/token/ABC123/clone");
    }

    #[test]
    fn test_url_shapes() {
        let snap = snapshot();
        assert_eq!(url_for_create(&snap), "acl/token?dc=dc1");
        assert_eq!(url_for_update(&snap), "acl/token/ABC123?dc=dc1");
        assert_eq!(url_for_clone(&snap), "acl/token/ABC123/clone?dc=dc1");
    }

    #[test]
    fn test_append_url_encodes_segments_and_params() {
        let url = append_url(
            TOKEN_PATH,
            &["a b"],
            &query(json!({"ns": "team/ops"})),
        );
        assert_eq!(url, "acl/token/a%20b?ns=team%2Fops");
    }

    #[test]
    fn test_clone_url_predicate() {
        assert!(is_clone_url("acl/token/ABC123/clone?dc=dc1"));
        assert!(is_clone_url("http://localhost:8500/v1/acl/token/ABC123/clone"));
        assert!(!is_clone_url("acl/token/ABC123"));
        assert!(!is_clone_url("acl/tokens"));
    }

    #[test]
    fn test_self_url_predicate() {
        assert!(is_self_url("acl/token/self?dc=dc1"));
        assert!(is_self_url("/v1/acl/token/self"));
        assert!(is_self_url("http://localhost:8500/v1/acl/token/self"));
        assert!(!is_self_url("acl/token/selfish"));
        assert!(!is_self_url("acl/tokens"));
    }

    #[test]
    fn test_query_record_url_predicate() {
        assert!(is_query_record_url("acl/token/ABC123?dc=dc1"));
        assert!(!is_query_record_url("acl/token/ABC123/clone"));
        assert!(!is_query_record_url("acl/token/self"));
        assert!(!is_query_record_url("acl/tokens?dc=dc1"));
    }
}
