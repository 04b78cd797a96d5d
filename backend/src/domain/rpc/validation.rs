//! Parameter validation helpers shared by the gate and the handlers.
//!
//! Failures are `InvalidRequest` errors (envelope status 422) carrying
//! `{ "field", "code" }` details so callers can tell which input was wrong.

use serde_json::json;

use crate::domain::{Error, UserValidationError};

/// Validation error codes reported in error details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    MissingField,
    InvalidType,
    InvalidUuid,
    InvalidValue,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidType => "invalid_type",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for parameter names to keep call sites typo-resistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldName(&'static str);

impl FieldName {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Name of the endpoint selector inside `params`.
pub const ENDPOINT_FIELD: FieldName = FieldName::new("endpoint");
/// Name of the target user id inside `params`.
pub const USER_ID_FIELD: FieldName = FieldName::new("userId");

fn field_error(field: FieldName, message: String, code: ValidationCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        field,
        format!("missing required field: {name}"),
        ValidationCode::MissingField,
    )
}

pub(crate) fn invalid_type_error(field: FieldName, expected: &str) -> Error {
    let name = field.as_str();
    field_error(
        field,
        format!("{name} must be a {expected}"),
        ValidationCode::InvalidType,
    )
}

pub(crate) fn invalid_uuid_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        field,
        format!("{name} must be a valid UUID"),
        ValidationCode::InvalidUuid,
    )
}

/// Map a user validation failure onto the parameter that caused it.
pub(crate) fn user_validation_error(err: UserValidationError) -> Error {
    let field = match err {
        UserValidationError::EmptyId | UserValidationError::InvalidId => USER_ID_FIELD,
        UserValidationError::EmptyUsername
        | UserValidationError::UsernameTooShort { .. }
        | UserValidationError::UsernameTooLong { .. }
        | UserValidationError::UsernameInvalidCharacters => FieldName::new("username"),
        UserValidationError::EmptyPassword => FieldName::new("password"),
        UserValidationError::InvalidEmail => FieldName::new("email"),
    };
    field_error(field, err.to_string(), ValidationCode::InvalidValue)
}
