//! Crate error type.

use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the token adapter.
///
/// `MissingId` and `MissingSnapshot` are precondition failures raised before
/// any network I/O. `Http` carries a non-success response untouched for the
/// caller's error path; this layer adds no interpretation of error bodies.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Fetch-one was requested without an id.
    #[error("you must specify an id")]
    MissingId,

    /// An operation that sends or addresses an entity was given no snapshot.
    #[error("operation {0} requires an entity snapshot")]
    MissingSnapshot(&'static str),

    /// Non-success HTTP status; the payload is passed through unmodified.
    #[error("http status {status}")]
    Http { status: u16, payload: Value },

    /// A typed convenience call got a response shape it cannot represent.
    #[error("unexpected {got} response shape for {operation}")]
    UnexpectedShape {
        operation: &'static str,
        got: &'static str,
    },

    /// Entity serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The underlying transport failed before a status was obtained.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}
