//! Driven ports for caller identity: verifying tokens and minting them.

use async_trait::async_trait;

use crate::domain::{Credential, Error, Identity, UserId};

use super::define_port_error;

define_port_error! {
    /// Failures reported while resolving a caller identity.
    pub enum IdentityResolverError {
        /// Token is malformed, forged, or otherwise unverifiable.
        InvalidToken => "invalid credential" => Unauthorized,
        /// Token verified but names a user that no longer exists.
        UnknownUser => "credential refers to an unknown user" => Unauthorized,
        /// The backend needed to resolve the identity is unreachable.
        Unavailable { message: String } => "identity backend unavailable: {message}" => ServiceUnavailable,
    }
}

/// Turns an opaque caller credential into an [`Identity`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Verify `credential` and load the caller it represents.
    async fn resolve(&self, credential: &Credential) -> Result<Identity, IdentityResolverError>;
}

/// Issues credentials that a matching [`IdentityResolver`] accepts.
#[cfg_attr(test, mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    /// Mint a bearer token for `user_id`.
    fn issue(&self, user_id: &UserId) -> Result<String, Error>;
}
