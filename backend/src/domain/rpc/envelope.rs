//! Inbound RPC envelope.
//!
//! ```text
//! { "payload": { "params": { "endpoint": "getUser", "userId": "..." } },
//!   "credential": "<token>" }
//! ```
//!
//! The envelope is deliberately lenient: missing sections deserialise to
//! empty defaults so that the router, not the decoder, decides how to answer
//! a malformed request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::validation::{
    ENDPOINT_FIELD, FieldName, invalid_type_error, invalid_uuid_error, missing_field_error,
};
use crate::domain::{Credential, Error, UserId};

/// Endpoint label echoed when the request names none.
pub const UNKNOWN_ENDPOINT: &str = "unknown";

/// The fixed set of operations the router dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Endpoint {
    /// `createUser`: open sign-up.
    CreateUser,
    /// `getAllUsers`: any authenticated caller.
    GetAllUsers,
    /// `getUser`: any authenticated caller.
    GetUser,
    /// `updateUser`: the target user or an admin.
    UpdateUser,
    /// `deleteUser`: the target user or an admin.
    DeleteUser,
}

impl Endpoint {
    /// Every endpoint, in dispatch-table order.
    pub const ALL: [Self; 5] = [
        Self::CreateUser,
        Self::GetAllUsers,
        Self::GetUser,
        Self::UpdateUser,
        Self::DeleteUser,
    ];

    /// Wire name of the endpoint.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateUser => "createUser",
            Self::GetAllUsers => "getAllUsers",
            Self::GetUser => "getUser",
            Self::UpdateUser => "updateUser",
            Self::DeleteUser => "deleteUser",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a name does not match any endpoint exactly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown endpoint: {0}")]
pub struct UnknownEndpointError(pub String);

impl FromStr for Endpoint {
    type Err = UnknownEndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|endpoint| endpoint.as_str() == s)
            .ok_or_else(|| UnknownEndpointError(s.to_owned()))
    }
}

/// Operation parameters, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RpcParams(Map<String, Value>);

impl RpcParams {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Raw endpoint name, when present as a string.
    pub fn endpoint_name(&self) -> Option<&str> {
        self.0.get(ENDPOINT_FIELD.as_str()).and_then(Value::as_str)
    }

    /// Read an optional string field. `null` counts as absent.
    pub fn optional_str(&self, field: FieldName) -> Result<Option<&str>, Error> {
        match self.0.get(field.as_str()) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(invalid_type_error(field, "string")),
        }
    }

    /// Read a required string field.
    pub fn required_str(&self, field: FieldName) -> Result<&str, Error> {
        self.optional_str(field)?
            .ok_or_else(|| missing_field_error(field))
    }

    /// Read an optional user identifier.
    pub fn optional_user_id(&self, field: FieldName) -> Result<Option<UserId>, Error> {
        self.optional_str(field)?
            .map(|raw| UserId::new(raw).map_err(|_| invalid_uuid_error(field)))
            .transpose()
    }

    /// Read a required user identifier.
    pub fn required_user_id(&self, field: FieldName) -> Result<UserId, Error> {
        self.optional_user_id(field)?
            .ok_or_else(|| missing_field_error(field))
    }
}

/// Transport payload wrapper around [`RpcParams`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcPayload {
    #[serde(default)]
    pub params: RpcParams,
}

/// Inbound request as handed to the router. Immutable once received.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RpcEnvelope {
    #[serde(default)]
    payload: RpcPayload,
    #[serde(default, alias = "apiToken")]
    credential: Option<Credential>,
}

impl RpcEnvelope {
    /// Build an envelope from parameters and an optional credential.
    ///
    /// # Examples
    /// ```
    /// use serde_json::json;
    /// use user_router::domain::rpc::RpcEnvelope;
    ///
    /// let envelope = RpcEnvelope::from_json(json!({ "endpoint": "getAllUsers" }), None);
    /// assert_eq!(envelope.endpoint_label(), "getAllUsers");
    /// ```
    pub fn new(params: RpcParams, credential: Option<Credential>) -> Self {
        Self {
            payload: RpcPayload { params },
            credential,
        }
    }

    /// Convenience constructor taking the params as a JSON object.
    ///
    /// Non-object values produce empty params.
    pub fn from_json(params: Value, credential: Option<Credential>) -> Self {
        let fields = match params {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        Self::new(RpcParams::new(fields), credential)
    }

    /// Replace the credential, typically with one taken from a transport header.
    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    /// Request parameters, including `endpoint`.
    pub fn params(&self) -> &RpcParams {
        &self.payload.params
    }

    /// Caller credential, if the transport supplied one.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Endpoint name to echo in the response, or `"unknown"`.
    pub fn endpoint_label(&self) -> &str {
        self.params().endpoint_name().unwrap_or(UNKNOWN_ENDPOINT)
    }

    /// Resolve the requested endpoint by exact name match.
    pub fn endpoint(&self) -> Result<Endpoint, Error> {
        let name = self
            .params()
            .endpoint_name()
            .ok_or_else(|| Error::unknown_endpoint("request does not name an endpoint"))?;
        name.parse()
            .map_err(|err: UnknownEndpointError| Error::unknown_endpoint(err.to_string()))
    }
}
