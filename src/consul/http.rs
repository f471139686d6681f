//! Lightweight Consul HTTP transport
//!
//! A thin seam between the adapter and the network. The adapter only needs
//! `method, url, headers, body -> status, headers, payload`; everything else
//! (TLS, retries, timeouts) belongs to the transport implementation.

use std::collections::HashMap;
use std::future::Future;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, trace};

const DEFAULT_ADDR: &str = "http://127.0.0.1:8500";
const API_VERSION: &str = "v1";

/// Raw result of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    /// Parsed JSON body; `Value::Null` for empty bodies, `Value::String`
    /// when the body is not valid JSON.
    pub payload: Value,
}

/// One HTTP exchange, single attempt. Implementations own all resilience
/// concerns (timeouts, retry, backoff); the adapter performs none.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<&Value>,
    ) -> impl Future<Output = Result<TransportResponse>> + Send;
}

/// Default `reqwest`-backed transport.
///
/// URLs produced by the adapter are agent-relative (`acl/tokens?...`); this
/// client prefixes them with the agent address and API version.
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(addr: impl Into<String>) -> Self {
        let addr = addr.into();
        Self {
            client: Client::new(),
            base_url: format!("{}/{}", addr.trim_end_matches('/'), API_VERSION),
        }
    }

    /// Build a client from `CONSUL_HTTP_ADDR`, falling back to the local
    /// agent's default address.
    pub fn from_env() -> Self {
        let addr =
            std::env::var("CONSUL_HTTP_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        Self::new(addr)
    }

    fn endpoint(&self, url: &str) -> String {
        format!("{}/{}", self.base_url, url.trim_start_matches('/'))
    }
}

impl Transport for HttpClient {
    async fn execute(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<&Value>,
    ) -> Result<TransportResponse> {
        let endpoint = self.endpoint(url);
        debug!("{} {}", method, endpoint);
        if let Some(body) = body {
            trace!("request body: {}", body);
        }

        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|_| anyhow!("invalid http method: {}", method))?;

        let mut request = self.client.request(method, &endpoint);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();

        let mut response_headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                response_headers.insert(name.to_string(), value.to_string());
            }
        }

        let text = response.text().await?;
        trace!("response status={} body={}", status, text);

        let payload = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(TransportResponse {
            status,
            headers: response_headers,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_and_path() {
        let client = HttpClient::new("http://10.0.0.1:8500/");
        assert_eq!(
            client.endpoint("acl/tokens?dc=dc1"),
            "http://10.0.0.1:8500/v1/acl/tokens?dc=dc1"
        );
        assert_eq!(
            client.endpoint("/acl/token/self"),
            "http://10.0.0.1:8500/v1/acl/token/self"
        );
    }
}
