//! Uniform response envelope returned for every routed request.
//!
//! Success and failure share one shape so callers can branch on `success`
//! alone. Payload fields are flattened next to the status fields:
//!
//! ```json
//! { "success": true, "status": 200, "message": "", "endpoint": "getUser",
//!   "user": { "id": "...", "username": "..." } }
//! ```
//!
//! Failures may add `details` (for example `{ "field": "password", "code":
//! "missing_field" }`) and the `traceId` the error was raised under.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Error, User};

/// Status carried by every successful envelope.
pub const SUCCESS_STATUS: u16 = 200;

/// Data attached to a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    /// A freshly created account together with its login token.
    Account { user: User, token: String },
    User(User),
    Users(Vec<User>),
}

/// Outcome of routing one request.
///
/// ## Invariants
/// - `success` is true exactly when `status` is 200.
/// - A failure never carries a payload.
/// - `details` and `trace_id` are only ever set on failures.
/// - Payload users are [`User`] values, which cannot hold password material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    success: bool,
    status: u16,
    message: String,
    endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    users: Option<Vec<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    #[serde(default, rename = "traceId", skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
}

impl ResponseEnvelope {
    /// Build a success envelope with an empty message.
    pub fn success(endpoint: impl Into<String>, payload: Option<ResponsePayload>) -> Self {
        let mut envelope = Self {
            success: true,
            status: SUCCESS_STATUS,
            message: String::new(),
            endpoint: endpoint.into(),
            user: None,
            users: None,
            token: None,
            details: None,
            trace_id: None,
        };
        match payload {
            Some(ResponsePayload::Account { user, token }) => {
                envelope.user = Some(user);
                envelope.token = Some(token);
            }
            Some(ResponsePayload::User(user)) => envelope.user = Some(user),
            Some(ResponsePayload::Users(users)) => envelope.users = Some(users),
            None => {}
        }
        envelope
    }

    /// Build a failure envelope from a domain error.
    ///
    /// # Examples
    /// ```
    /// use user_router::domain::Error;
    /// use user_router::domain::rpc::ResponseEnvelope;
    ///
    /// let envelope = ResponseEnvelope::failure("getUser", &Error::forbidden("not yours"));
    /// assert!(!envelope.is_success());
    /// assert_eq!(envelope.status(), 403);
    /// assert_eq!(envelope.message(), "not yours");
    /// assert!(envelope.details().is_none());
    /// ```
    pub fn failure(endpoint: impl Into<String>, error: &Error) -> Self {
        Self {
            success: false,
            status: error.status(),
            message: error.message().to_owned(),
            endpoint: endpoint.into(),
            user: None,
            users: None,
            token: None,
            details: error.details().cloned(),
            trace_id: error.trace_id().map(str::to_owned),
        }
    }

    /// Fold a handler outcome into an envelope.
    pub fn from_outcome(
        endpoint: impl Into<String>,
        outcome: Result<Option<ResponsePayload>, Error>,
    ) -> Self {
        match outcome {
            Ok(payload) => Self::success(endpoint, payload),
            Err(error) => Self::failure(endpoint, &error),
        }
    }

    /// Whether the request succeeded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// HTTP-like status: 200 on success, the error's status otherwise.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Empty on success; the error message on failure.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Endpoint name echoed from the request, or `"unknown"`.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Single profile returned by `createUser`, `getUser` and `updateUser`.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Profiles returned by `getAllUsers`.
    pub fn users(&self) -> Option<&[User]> {
        self.users.as_deref()
    }

    /// Login token issued by `createUser`.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Structured failure details, such as the offending field.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Trace id the failure was raised under.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }
}
