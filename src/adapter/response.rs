//! Response shape classification and normalization
//!
//! The token endpoint family answers with three shapes: the literal boolean
//! `true` (existence/ACL check results), a single record (self, clone and
//! fetch-one) or a batch of records (list). Classification inspects the
//! payload and the request URL; normalization coalesces a `Policies` value
//! of `null` into an empty list on every record, since the API omits the
//! field for tokens without policies and consumers require a list.

use serde_json::{json, Value};

use super::protocol::{Operation, POLICIES};
use super::url::{is_clone_url, is_query_record_url, is_self_url};
use crate::error::AdapterError;

/// Payload shape of a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Boolean,
    Single,
    Batch,
}

/// Normalized payload handed back to the caller. Envelope wrapping of the
/// boolean result is the caller's convention; this layer only reports shape.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedResponse {
    Boolean(bool),
    Single(Value),
    Batch(Vec<Value>),
}

/// Decide the payload shape, first match wins:
/// 1. literal `true` payload, regardless of URL;
/// 2. self-, clone- or fetch-one-shaped request URL;
/// 3. batch otherwise.
pub fn classify(url: &str, payload: &Value) -> ResponseShape {
    if payload == &Value::Bool(true) {
        ResponseShape::Boolean
    } else if is_self_url(url) || is_clone_url(url) || is_query_record_url(url) {
        ResponseShape::Single
    } else {
        ResponseShape::Batch
    }
}

/// Decide the payload shape when the operation that triggered the request is
/// known. The boolean rule still wins; otherwise only list answers batch,
/// everything else answers one record. This covers create, whose URL carries
/// no id segment and therefore cannot be told apart from a list by URL.
pub fn shape_for(operation: Operation, payload: &Value) -> ResponseShape {
    if payload == &Value::Bool(true) {
        ResponseShape::Boolean
    } else {
        match operation {
            Operation::Query => ResponseShape::Batch,
            Operation::QueryRecord
            | Operation::QuerySelf
            | Operation::CreateRecord
            | Operation::UpdateRecord
            | Operation::DeleteRecord
            | Operation::CloneRecord => ResponseShape::Single,
        }
    }
}

/// Classify and normalize a response by request URL. Only success statuses
/// are shaped; anything else passes through unmodified on the error path.
pub fn handle_response(
    status: u16,
    url: &str,
    payload: Value,
) -> Result<NormalizedResponse, AdapterError> {
    if !(200..300).contains(&status) {
        return Err(AdapterError::Http { status, payload });
    }
    Ok(normalize(classify(url, &payload), payload))
}

/// Classify and normalize a response for a known operation kind.
pub fn handle_operation_response(
    operation: Operation,
    status: u16,
    payload: Value,
) -> Result<NormalizedResponse, AdapterError> {
    if !(200..300).contains(&status) {
        return Err(AdapterError::Http { status, payload });
    }
    Ok(normalize(shape_for(operation, &payload), payload))
}

fn normalize(shape: ResponseShape, payload: Value) -> NormalizedResponse {
    match shape {
        ResponseShape::Boolean => NormalizedResponse::Boolean(true),
        ResponseShape::Single => NormalizedResponse::Single(coalesce_policies(payload)),
        ResponseShape::Batch => {
            let records = match payload {
                Value::Array(items) => items,
                Value::Null => Vec::new(),
                other => vec![other],
            };
            NormalizedResponse::Batch(records.into_iter().map(coalesce_policies).collect())
        }
    }
}

/// The API may answer `Policies: null` (or omit the key) for a token with no
/// policies; downstream consumers require a list, never a null.
fn coalesce_policies(mut record: Value) -> Value {
    if let Some(object) = record.as_object_mut() {
        match object.get(POLICIES) {
            None | Some(Value::Null) => {
                object.insert(POLICIES.to_string(), json!([]));
            }
            Some(_) => {}
        }
    }
    record
}
