//! Request payload shaping
//!
//! Body construction per operation. Create and update send the serialized
//! token with its policy list filtered down to persisted `{ID, Name}` pairs;
//! self-lookup always sends an empty object; clone reinstates the
//! `AccessorID` the serializer strips and proposes a new display name from
//! the injected cache. Reads and deletes carry no body.

use serde_json::{json, Value};

use super::protocol::{
    duplicate_name, Operation, TokenCache, TokenSerializer, TokenSnapshot, ACCESSOR_ID, NAME,
    POLICIES,
};
use crate::error::AdapterError;

/// Build the body for `operation`, or `None` for body-less operations.
///
/// Performs no validation of its own; serializer failures propagate as-is.
pub fn build_payload(
    operation: Operation,
    snapshot: Option<&TokenSnapshot>,
    serializer: &TokenSerializer,
    cache: &dyn TokenCache,
) -> Result<Option<Value>, AdapterError> {
    match operation {
        Operation::Query | Operation::QueryRecord | Operation::DeleteRecord => Ok(None),

        // Read-only; no entity fields are ever sent.
        Operation::QuerySelf => Ok(Some(json!({}))),

        Operation::CreateRecord | Operation::UpdateRecord => {
            let snapshot = require_snapshot(operation, snapshot)?;
            let mut body = serializer.serialize(snapshot)?;
            body[POLICIES] = Value::Array(
                snapshot
                    .policies
                    .iter()
                    .filter(|policy| !policy.is_new)
                    .map(|policy| policy.to_wire_ref())
                    .collect(),
            );
            Ok(Some(body))
        }

        Operation::CloneRecord => {
            let snapshot = require_snapshot(operation, snapshot)?;
            let mut body = serializer.serialize(snapshot)?;
            // The serializer strips the AccessorID since the server never
            // accepts it on writes; the clone endpoint is the one place it
            // must come back, to identify which token to clone.
            body[ACCESSOR_ID] = Value::String(snapshot.accessor_id.clone());
            body[NAME] = Value::String(duplicate_name(&cache.peek_all(), &snapshot.name));
            Ok(Some(body))
        }
    }
}

fn require_snapshot<'a>(
    operation: Operation,
    snapshot: Option<&'a TokenSnapshot>,
) -> Result<&'a TokenSnapshot, AdapterError> {
    snapshot.ok_or(AdapterError::MissingSnapshot(operation.as_str()))
}
