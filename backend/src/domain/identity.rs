//! Caller identity primitives.
//!
//! A [`Credential`] arrives with the request envelope; the identity resolver
//! turns it into an [`Identity`] that lives for a single routed call.

use std::fmt;

use serde::Deserialize;
use zeroize::Zeroizing;

use crate::domain::{Role, UserId};

/// Opaque caller token as supplied by the transport.
///
/// The value is wiped on drop and never rendered by `Debug`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct Credential(Zeroizing<String>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// Raw token text, trimmed.
    pub fn expose(&self) -> &str {
        self.0.trim()
    }

    /// True when the token holds no characters once trimmed.
    pub fn is_blank(&self) -> bool {
        self.expose().is_empty()
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(Zeroizing::new(token))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Authenticated caller for the lifetime of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: UserId,
    role: Role,
}

impl Identity {
    /// Identity for `user_id` acting with `role`.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Caller's user id, compared against the target of owner-only endpoints.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Role loaded at resolution time.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the caller holds elevated privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("super-secret-token");
        assert!(!format!("{credential:?}").contains("super-secret-token"));
    }

    #[test]
    fn credential_blank_detection_trims() {
        assert!(Credential::new("   ").is_blank());
        assert_eq!(Credential::new(" abc ").expose(), "abc");
    }

    #[test]
    fn identity_reports_admin_role() {
        let admin = Identity::new(UserId::random(), Role::Admin);
        let user = Identity::new(UserId::random(), Role::User);
        assert!(admin.is_admin());
        assert!(!user.is_admin());
    }
}
