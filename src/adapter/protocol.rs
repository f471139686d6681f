//! Shared adapter types: the operation enum and descriptor, the token
//! snapshot the adapter sends, the wire serializer and the record-cache
//! seam used for clone naming.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AdapterError;

/// Wire field names for the token resource.
pub const ACCESSOR_ID: &str = "AccessorID";
pub const SECRET_ID: &str = "SecretID";
pub const NAME: &str = "Name";
pub const POLICIES: &str = "Policies";

/// Query-string parameter selecting the target datacenter.
pub const DATACENTER_PARAM: &str = "dc";

/// Header carrying the credential for self-lookup.
pub const TOKEN_HEADER: &str = "X-Consul-Token";

/// Abstract record operations this adapter maps onto HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// List tokens matching a query.
    Query,
    /// Fetch one token by id.
    QueryRecord,
    /// Fetch the token identified by the request credential itself.
    QuerySelf,
    CreateRecord,
    UpdateRecord,
    DeleteRecord,
    /// Create a copy of an existing token.
    CloneRecord,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Query => "query",
            Operation::QueryRecord => "queryRecord",
            Operation::QuerySelf => "querySelf",
            Operation::CreateRecord => "createRecord",
            Operation::UpdateRecord => "updateRecord",
            Operation::DeleteRecord => "deleteRecord",
            Operation::CloneRecord => "cloneRecord",
        }
    }
}

/// A policy reference as held on a local token record.
///
/// `is_new` marks a locally-created placeholder that was never persisted;
/// such entries must never reach an outgoing payload. `extra` carries any
/// other serialized policy fields, all of which are stripped from outgoing
/// payloads as well (only `{ID, Name}` survives).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyRef {
    pub id: String,
    pub name: String,
    pub is_new: bool,
    pub extra: Map<String, Value>,
}

impl PolicyRef {
    pub fn saved(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_new: false,
            extra: Map::new(),
        }
    }

    /// The `{ID, Name}` projection sent on create/update.
    pub fn to_wire_ref(&self) -> Value {
        let mut wire = Map::new();
        wire.insert("ID".to_string(), Value::String(self.id.clone()));
        wire.insert("Name".to_string(), Value::String(self.name.clone()));
        Value::Object(wire)
    }

    /// The full serialized form (all fields, no local state).
    fn to_wire_full(&self) -> Value {
        let mut wire = self.extra.clone();
        wire.insert("ID".to_string(), Value::String(self.id.clone()));
        wire.insert("Name".to_string(), Value::String(self.name.clone()));
        Value::Object(wire)
    }
}

/// Point-in-time view of the token entity being sent.
///
/// `datacenter` is a routing attribute, not part of the entity body; it only
/// ever appears as the `dc` query parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenSnapshot {
    pub accessor_id: String,
    pub secret_id: String,
    pub name: String,
    pub datacenter: String,
    pub policies: Vec<PolicyRef>,
}

/// Serializes a token snapshot into its wire form.
///
/// `AccessorID` is server-assigned and never accepted on writes, so it is
/// stripped here; the clone path reinstates it explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSerializer;

impl TokenSerializer {
    pub fn serialize(&self, snapshot: &TokenSnapshot) -> Result<Value, AdapterError> {
        let mut body = Map::new();
        body.insert(
            SECRET_ID.to_string(),
            Value::String(snapshot.secret_id.clone()),
        );
        body.insert(NAME.to_string(), Value::String(snapshot.name.clone()));
        body.insert(
            POLICIES.to_string(),
            Value::Array(snapshot.policies.iter().map(|p| p.to_wire_full()).collect()),
        );
        Ok(Value::Object(body))
    }
}

/// Read-only view of the locally cached tokens, consulted synchronously
/// while building the clone payload's name. A point-in-time snapshot, not a
/// transaction; the server remains the arbiter of name collisions.
pub trait TokenCache: Send + Sync {
    fn peek_all(&self) -> Vec<TokenSnapshot>;
}

/// Cache for callers without a local record store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl TokenCache for NoCache {
    fn peek_all(&self) -> Vec<TokenSnapshot> {
        Vec::new()
    }
}

/// Display name for a cloned token. Fixed prefix, no disambiguation counter
/// against the haystack; repeated clones of the same source produce the same
/// proposed name and the server resolves any collision.
pub fn duplicate_name(_haystack: &[TokenSnapshot], original: &str) -> String {
    format!("Duplicate of {}", original)
}

/// Transient bundle describing one abstract operation. Created per call and
/// discarded after the HTTP exchange completes.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    pub operation: Operation,
    pub id: Option<String>,
    pub query: Map<String, Value>,
    pub snapshot: Option<TokenSnapshot>,
}

impl OperationDescriptor {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            id: None,
            query: Map::new(),
            snapshot: None,
        }
    }

    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = query;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_snapshot(mut self, snapshot: TokenSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}

/// Fully resolved request, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParts {
    pub method: &'static str,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

/// Deserialized record shape handed back to callers that want typing rather
/// than raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(rename = "AccessorID", default)]
    pub accessor_id: String,
    #[serde(rename = "SecretID", default)]
    pub secret_id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Policies", default)]
    pub policies: Vec<Value>,
}
