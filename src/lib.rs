//! Data-access adapter for the Consul ACL token HTTP API.
//!
//! Translates abstract record operations (list, fetch-one, self-lookup,
//! create, update, delete, clone) into concrete HTTP requests, and raw HTTP
//! responses back into normalized record shapes. The transport, record cache
//! and schema validation are external collaborators behind small traits.

pub mod adapter;
pub mod consul;
pub mod error;

pub use adapter::dispatch::TokenAdapter;
pub use adapter::protocol::{
    NoCache, Operation, OperationDescriptor, PolicyRef, RequestParts, TokenCache, TokenRecord,
    TokenSerializer, TokenSnapshot,
};
pub use adapter::response::NormalizedResponse;
pub use consul::http::{HttpClient, Transport, TransportResponse};
pub use error::AdapterError;
