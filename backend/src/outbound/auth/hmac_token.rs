//! HMAC-SHA256 bearer tokens.
//!
//! Tokens have the form `<user-uuid>.<hex signature>` where the signature is
//! `HMAC_SHA256(secret, user-uuid)`. They carry no expiry; rotating the
//! secret invalidates every outstanding token.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::{
    IdentityResolver, IdentityResolverError, TokenIssuer, UserDirectory, UserDirectoryError,
};
use crate::domain::{Credential, Error, Identity, UserId};

type HmacSha256 = Hmac<Sha256>;

/// Length of a generated signing secret, in bytes.
pub const EPHEMERAL_SECRET_LEN: usize = 32;

/// Signs and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct HmacTokenAuthority {
    secret: Arc<Zeroizing<Vec<u8>>>,
}

impl HmacTokenAuthority {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Arc::new(Zeroizing::new(secret.into())),
        }
    }

    /// Authority with a random secret that lives only as long as the process.
    pub fn ephemeral() -> Self {
        Self::new(rand::random::<[u8; EPHEMERAL_SECRET_LEN]>().to_vec())
    }

    fn mac_for(&self, user_id: &str) -> Result<HmacSha256, hmac::digest::InvalidLength> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_slice())?;
        mac.update(user_id.as_bytes());
        Ok(mac)
    }

    /// Produce a token for `user_id`.
    pub fn sign(&self, user_id: &UserId) -> Result<String, Error> {
        let subject = user_id.to_string();
        let mac = self
            .mac_for(&subject)
            .map_err(|err| Error::internal(format!("token signing key rejected: {err}")))?;
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("{subject}.{signature}"))
    }

    /// Check a token's signature and return the user it names.
    ///
    /// # Examples
    /// ```
    /// use user_router::domain::UserId;
    /// use user_router::outbound::HmacTokenAuthority;
    ///
    /// let authority = HmacTokenAuthority::new(b"secret".to_vec());
    /// let id = UserId::random();
    /// let token = authority.sign(&id).unwrap();
    /// assert_eq!(authority.verify(&token).unwrap(), id);
    /// assert!(authority.verify("forged.token").is_err());
    /// ```
    pub fn verify(&self, token: &str) -> Result<UserId, IdentityResolverError> {
        let (subject, signature) = token
            .split_once('.')
            .ok_or_else(IdentityResolverError::invalid_token)?;
        let user_id = UserId::new(subject).map_err(|_| IdentityResolverError::invalid_token())?;
        let signature = hex::decode(signature).map_err(|_| IdentityResolverError::invalid_token())?;
        self.mac_for(subject)
            .map_err(|err| IdentityResolverError::unavailable(err.to_string()))?
            .verify_slice(&signature)
            .map_err(|_| IdentityResolverError::invalid_token())?;
        Ok(user_id)
    }
}

impl fmt::Debug for HmacTokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacTokenAuthority").finish_non_exhaustive()
    }
}

impl TokenIssuer for HmacTokenAuthority {
    fn issue(&self, user_id: &UserId) -> Result<String, Error> {
        self.sign(user_id)
    }
}

/// Resolves bearer tokens to identities, loading the caller's role from the
/// user directory so role changes and deletions take effect immediately.
#[derive(Clone)]
pub struct TokenIdentityResolver {
    authority: Arc<HmacTokenAuthority>,
    directory: Arc<dyn UserDirectory>,
}

impl TokenIdentityResolver {
    pub fn new(authority: Arc<HmacTokenAuthority>, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            authority,
            directory,
        }
    }
}

#[async_trait]
impl IdentityResolver for TokenIdentityResolver {
    async fn resolve(&self, credential: &Credential) -> Result<Identity, IdentityResolverError> {
        let user_id = self.authority.verify(credential.expose())?;
        let record = match self.directory.get_user(&user_id).await {
            Ok(record) => record,
            Err(UserDirectoryError::NotFound { .. }) => {
                debug!(user_id = %user_id, "token names a deleted user");
                return Err(IdentityResolverError::unknown_user());
            }
            Err(err) => return Err(IdentityResolverError::unavailable(err.to_string())),
        };
        Ok(Identity::new(user_id, record.profile.role()))
    }
}
