//! RPC envelope types and parameter validation.

mod envelope;
mod response;
mod validation;

pub use envelope::{
    Endpoint, RpcEnvelope, RpcParams, RpcPayload, UNKNOWN_ENDPOINT, UnknownEndpointError,
};
pub use response::{ResponseEnvelope, ResponsePayload, SUCCESS_STATUS};
pub use validation::{ENDPOINT_FIELD, FieldName, USER_ID_FIELD};
pub(crate) use validation::user_validation_error;
