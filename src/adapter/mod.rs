//! The token adapter proper: query sanitization, URL construction, payload
//! building, response classification/normalization and operation dispatch.

pub mod dispatch;
pub mod protocol;
pub mod query;
pub mod request;
pub mod response;
pub mod url;

pub use dispatch::TokenAdapter;
pub use protocol::{Operation, OperationDescriptor, RequestParts};
pub use response::NormalizedResponse;
