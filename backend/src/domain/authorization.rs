//! Authorization gate guarding protected endpoints.
//!
//! Each endpoint declares an [`AccessPolicy`]. The gate resolves the caller
//! from the envelope credential and evaluates the policy before any handler
//! or user directory call is made; a rejection short-circuits the request.

use std::sync::Arc;

use tracing::debug;

use crate::domain::ports::IdentityResolver;
use crate::domain::rpc::{RpcEnvelope, USER_ID_FIELD};
use crate::domain::{Error, Identity, UserId};

/// Access requirement attached to an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// No credential needed.
    Open,
    /// Any resolved caller may proceed (`ensureUser`).
    AuthenticatedUser,
    /// Caller must be the target user or an admin (`ensureTargetUserOrAdmin`).
    TargetUserOrAdmin,
}

/// Reasons the gate refuses a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("a valid credential is required")]
    Unauthenticated,
    #[error("caller may only act on their own account")]
    Forbidden,
}

impl From<AuthorizationError> for Error {
    fn from(err: AuthorizationError) -> Self {
        match err {
            AuthorizationError::Unauthenticated => Error::unauthorized(err.to_string()),
            AuthorizationError::Forbidden => Error::forbidden(err.to_string()),
        }
    }
}

impl AccessPolicy {
    /// Whether the policy needs a resolved identity.
    pub const fn requires_identity(self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Whether the policy needs a target `userId`.
    pub const fn requires_target(self) -> bool {
        matches!(self, Self::TargetUserOrAdmin)
    }

    /// Evaluate the policy against an already resolved caller.
    ///
    /// # Examples
    /// ```
    /// use user_router::domain::authorization::{AccessPolicy, AuthorizationError};
    /// use user_router::domain::{Identity, Role, UserId};
    ///
    /// let caller = Identity::new(UserId::random(), Role::User);
    /// let other = UserId::random();
    /// assert_eq!(
    ///     AccessPolicy::TargetUserOrAdmin.evaluate(Some(&caller), Some(&other)),
    ///     Err(AuthorizationError::Forbidden),
    /// );
    /// ```
    pub fn evaluate(
        self,
        caller: Option<&Identity>,
        target: Option<&UserId>,
    ) -> Result<(), AuthorizationError> {
        match self {
            Self::Open => Ok(()),
            Self::AuthenticatedUser => caller
                .map(|_| ())
                .ok_or(AuthorizationError::Unauthenticated),
            Self::TargetUserOrAdmin => {
                let caller = caller.ok_or(AuthorizationError::Unauthenticated)?;
                match target {
                    _ if caller.is_admin() => Ok(()),
                    Some(target) if target == caller.user_id() => Ok(()),
                    _ => Err(AuthorizationError::Forbidden),
                }
            }
        }
    }
}

/// Resolves callers and applies access policies.
#[derive(Clone)]
pub struct AuthorizationGate {
    resolver: Arc<dyn IdentityResolver>,
}

impl AuthorizationGate {
    /// Gate that resolves credentials through `resolver`.
    pub fn new(resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { resolver }
    }

    /// Admit or reject a request under `policy`.
    ///
    /// Returns the resolved caller for protected endpoints and `None` for
    /// open ones. Order of checks: credential (401), target id shape (422),
    /// ownership (403).
    pub async fn admit(
        &self,
        policy: AccessPolicy,
        envelope: &RpcEnvelope,
    ) -> Result<Option<Identity>, Error> {
        if !policy.requires_identity() {
            return Ok(None);
        }

        let credential = envelope
            .credential()
            .filter(|credential| !credential.is_blank())
            .ok_or(AuthorizationError::Unauthenticated)?;
        let caller = self.resolver.resolve(credential).await.map_err(|err| {
            debug!(error = %err, "credential rejected");
            Error::from(err)
        })?;

        let target = if policy.requires_target() {
            Some(envelope.params().required_user_id(USER_ID_FIELD)?)
        } else {
            None
        };

        policy.evaluate(Some(&caller), target.as_ref())?;
        Ok(Some(caller))
    }
}
