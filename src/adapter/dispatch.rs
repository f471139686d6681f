//! Operation dispatch
//!
//! Resolves an operation descriptor into a concrete request tuple
//! `{method, url, headers, body}` and runs the full pipeline against the
//! transport: resolve, execute, classify, normalize. Method, header, URL and
//! body resolution are each one total match over the operation enum; there
//! is no override chaining and no shared mutable state.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use super::protocol::{
    Operation, OperationDescriptor, RequestParts, TokenCache, TokenRecord, TokenSerializer,
    TokenSnapshot, TOKEN_HEADER,
};
use super::query::token_of;
use super::request::build_payload;
use super::response::{handle_operation_response, handle_response, NormalizedResponse};
use super::url::{
    url_for_clone, url_for_create, url_for_delete, url_for_query, url_for_query_record,
    url_for_query_self, url_for_update,
};
use crate::consul::http::Transport;
use crate::error::AdapterError;

/// HTTP method per operation. Consul's ACL API takes writes as PUT, clone
/// included.
pub fn method_for(operation: Operation) -> &'static str {
    match operation {
        Operation::Query | Operation::QueryRecord | Operation::QuerySelf => "GET",
        Operation::CreateRecord
        | Operation::UpdateRecord
        | Operation::CloneRecord => "PUT",
        Operation::DeleteRecord => "DELETE",
    }
}

/// Request headers per operation. Self-lookup authenticates with the
/// credential carried under the reserved `token` query key; everything else
/// uses default headers.
pub fn headers_for(
    operation: Operation,
    query: &Map<String, Value>,
) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    match operation {
        Operation::QuerySelf => {
            if let Some(token) = token_of(query) {
                headers.insert(TOKEN_HEADER.to_string(), token);
            }
        }
        Operation::Query
        | Operation::QueryRecord
        | Operation::CreateRecord
        | Operation::UpdateRecord
        | Operation::DeleteRecord
        | Operation::CloneRecord => {}
    }
    headers
}

/// The token adapter façade. Owns no persistent state of its own; the cache
/// is only read, synchronously, while naming a clone.
pub struct TokenAdapter<T> {
    transport: T,
    serializer: TokenSerializer,
    cache: Box<dyn TokenCache>,
}

impl<T: Transport> TokenAdapter<T> {
    pub fn new(transport: T, cache: Box<dyn TokenCache>) -> Self {
        Self {
            transport,
            serializer: TokenSerializer,
            cache,
        }
    }

    /// Resolve a descriptor into the request tuple, performing no I/O.
    /// Precondition failures (missing id, missing snapshot) surface here.
    pub fn resolve(&self, descriptor: &OperationDescriptor) -> Result<RequestParts, AdapterError> {
        let operation = descriptor.operation;

        let url = match operation {
            Operation::Query => url_for_query(&descriptor.query),
            Operation::QueryRecord => {
                let mut query = descriptor.query.clone();
                if let Some(id) = &descriptor.id {
                    query
                        .entry("id".to_string())
                        .or_insert_with(|| Value::String(id.clone()));
                }
                url_for_query_record(&query)?
            }
            Operation::QuerySelf => url_for_query_self(&descriptor.query),
            Operation::CreateRecord => url_for_create(self.require_snapshot(descriptor)?),
            Operation::UpdateRecord => url_for_update(self.require_snapshot(descriptor)?),
            Operation::DeleteRecord => url_for_delete(self.require_snapshot(descriptor)?),
            Operation::CloneRecord => url_for_clone(self.require_snapshot(descriptor)?),
        };

        let body = build_payload(
            operation,
            descriptor.snapshot.as_ref(),
            &self.serializer,
            self.cache.as_ref(),
        )?;

        Ok(RequestParts {
            method: method_for(operation),
            url,
            headers: headers_for(operation, &descriptor.query),
            body,
        })
    }

    /// Full pipeline: resolve, execute one HTTP exchange, classify by URL
    /// and normalize. Single attempt; resilience belongs to the transport.
    pub async fn invoke(
        &self,
        descriptor: &OperationDescriptor,
    ) -> Result<NormalizedResponse, AdapterError> {
        let (status, url, payload) = self.exchange(descriptor).await?;
        handle_response(status, &url, payload)
    }

    /// Pipeline for the typed calls: the operation kind decides the expected
    /// shape, since the create URL carries no id segment and URL
    /// classification alone would read its single-object answer as a batch.
    async fn invoke_operation(
        &self,
        descriptor: &OperationDescriptor,
    ) -> Result<NormalizedResponse, AdapterError> {
        let (status, _, payload) = self.exchange(descriptor).await?;
        handle_operation_response(descriptor.operation, status, payload)
    }

    async fn exchange(
        &self,
        descriptor: &OperationDescriptor,
    ) -> Result<(u16, String, Value), AdapterError> {
        let parts = self.resolve(descriptor)?;
        debug!("{} {}", parts.method, parts.url);

        let response = self
            .transport
            .execute(parts.method, &parts.url, &parts.headers, parts.body.as_ref())
            .await
            .map_err(AdapterError::Transport)?;

        Ok((response.status, parts.url, response.payload))
    }

    /// List tokens matching a query.
    pub async fn list(&self, query: Map<String, Value>) -> Result<Vec<TokenRecord>, AdapterError> {
        let descriptor = OperationDescriptor::new(Operation::Query).with_query(query);
        match self.invoke_operation(&descriptor).await? {
            NormalizedResponse::Batch(records) => records
                .into_iter()
                .map(|record| serde_json::from_value(record).map_err(AdapterError::from))
                .collect(),
            other => Err(unexpected(Operation::Query, &other)),
        }
    }

    /// Fetch one token by id.
    pub async fn find(
        &self,
        id: impl Into<String>,
        query: Map<String, Value>,
    ) -> Result<TokenRecord, AdapterError> {
        let descriptor = OperationDescriptor::new(Operation::QueryRecord)
            .with_id(id)
            .with_query(query);
        self.single(descriptor).await
    }

    /// Fetch the token identified by the request credential itself. The
    /// credential travels under the reserved `token` query key and is sent
    /// as the `X-Consul-Token` header, never as a query parameter.
    pub async fn self_lookup(
        &self,
        query: Map<String, Value>,
    ) -> Result<TokenRecord, AdapterError> {
        let descriptor = OperationDescriptor::new(Operation::QuerySelf).with_query(query);
        self.single(descriptor).await
    }

    pub async fn create(&self, snapshot: TokenSnapshot) -> Result<TokenRecord, AdapterError> {
        let descriptor = OperationDescriptor::new(Operation::CreateRecord).with_snapshot(snapshot);
        self.single(descriptor).await
    }

    pub async fn update(&self, snapshot: TokenSnapshot) -> Result<TokenRecord, AdapterError> {
        let descriptor = OperationDescriptor::new(Operation::UpdateRecord).with_snapshot(snapshot);
        self.single(descriptor).await
    }

    /// Delete a token. The API answers with the literal boolean.
    pub async fn delete(&self, snapshot: TokenSnapshot) -> Result<bool, AdapterError> {
        let descriptor = OperationDescriptor::new(Operation::DeleteRecord).with_snapshot(snapshot);
        match self.invoke_operation(&descriptor).await? {
            NormalizedResponse::Boolean(ok) => Ok(ok),
            other => Err(unexpected(Operation::DeleteRecord, &other)),
        }
    }

    /// Create a copy of an existing token. The request body reinstates the
    /// source's `AccessorID` and proposes `"Duplicate of <name>"` as the new
    /// display name; the response is the freshly minted token.
    pub async fn clone_token(&self, snapshot: TokenSnapshot) -> Result<TokenRecord, AdapterError> {
        let descriptor = OperationDescriptor::new(Operation::CloneRecord).with_snapshot(snapshot);
        self.single(descriptor).await
    }

    async fn single(
        &self,
        descriptor: OperationDescriptor,
    ) -> Result<TokenRecord, AdapterError> {
        let operation = descriptor.operation;
        match self.invoke_operation(&descriptor).await? {
            NormalizedResponse::Single(record) => {
                serde_json::from_value(record).map_err(AdapterError::from)
            }
            other => Err(unexpected(operation, &other)),
        }
    }

    fn require_snapshot<'a>(
        &self,
        descriptor: &'a OperationDescriptor,
    ) -> Result<&'a TokenSnapshot, AdapterError> {
        descriptor
            .snapshot
            .as_ref()
            .ok_or(AdapterError::MissingSnapshot(descriptor.operation.as_str()))
    }
}

fn unexpected(operation: Operation, got: &NormalizedResponse) -> AdapterError {
    AdapterError::UnexpectedShape {
        operation: operation.as_str(),
        got: match got {
            NormalizedResponse::Boolean(_) => "boolean",
            NormalizedResponse::Single(_) => "single",
            NormalizedResponse::Batch(_) => "batch",
        },
    }
}
