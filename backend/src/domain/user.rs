//! User data model.
//!
//! [`User`] is the public profile returned to callers and deliberately has no
//! secret fields. The user directory hands back [`UserRecord`], which also
//! carries the password hash and salt; handlers convert records into profiles
//! before anything is attached to a response.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

/// Validation errors raised while building user values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must not be empty")]
    EmptyId,
    #[error("user id must be a valid UUID")]
    InvalidId,
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("username must be at least {min} characters")]
    UsernameTooShort { min: usize },
    #[error("username must be at most {max} characters")]
    UsernameTooLong { max: usize },
    #[error("username may only contain letters, numbers, dots, dashes, or underscores")]
    UsernameInvalidCharacters,
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("email must be a valid address")]
    InvalidEmail,
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Minimum allowed length for a username.
pub const USERNAME_MIN: usize = 3;
/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 32;

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        Regex::new("^[A-Za-z0-9_.-]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

/// Unique login name, trimmed of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`].
    pub fn new(username: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let username = username.as_ref().trim();
        if username.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }

        let length = username.chars().count();
        if length < USERNAME_MIN {
            return Err(UserValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        if length > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username_regex().is_match(username) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }

        Ok(Self(username.to_owned()))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Privilege level of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Whether this role grants elevated privileges.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

fn validate_email(email: &str) -> Result<String, UserValidationError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_owned()),
        _ => Err(UserValidationError::InvalidEmail),
    }
}

/// Trimmed display name; blank input counts as absent.
fn normalise_name(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_owned())
}

fn validate_password(password: &str) -> Result<Zeroizing<String>, UserValidationError> {
    if password.is_empty() {
        return Err(UserValidationError::EmptyPassword);
    }
    Ok(Zeroizing::new(password.to_owned()))
}

/// Public user profile.
///
/// ## Invariants
/// - Never carries password material; serialising a `User` cannot leak
///   secrets regardless of what the directory stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct User {
    id: UserId,
    username: Username,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new profile created at `at`.
    pub fn new(id: UserId, username: Username, role: Role, at: DateTime<Utc>) -> Self {
        Self {
            id,
            username,
            email: None,
            name: None,
            role,
            created_at: at,
            updated_at: at,
        }
    }

    /// Attach an optional email address.
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Replace the privilege level.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Attach an optional display name.
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Apply the profile fields of a patch, stamping `updated_at`.
    pub fn apply_patch(&mut self, patch: &UserPatch, at: DateTime<Utc>) {
        if let Some(username) = &patch.username {
            self.username = username.clone();
        }
        if let Some(email) = &patch.email {
            self.email = Some(email.clone());
        }
        if let Some(name) = &patch.name {
            self.name = Some(name.clone());
        }
        self.updated_at = at;
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Stored user as returned by the user directory, secrets included.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub profile: User,
    pub password_hash: String,
    pub salt: String,
}

impl UserRecord {
    /// Drop the secret fields, keeping only the public profile.
    pub fn into_profile(self) -> User {
        self.profile
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("profile", &self.profile)
            .field("password_hash", &"<redacted>")
            .field("salt", &"<redacted>")
            .finish()
    }
}

impl From<UserRecord> for User {
    fn from(value: UserRecord) -> Self {
        value.into_profile()
    }
}

/// Validated signup request.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    username: Username,
    password: Zeroizing<String>,
    email: Option<String>,
    name: Option<String>,
}

impl NewUser {
    /// Validate raw signup inputs.
    ///
    /// # Examples
    /// ```
    /// use user_router::domain::NewUser;
    ///
    /// let user = NewUser::try_from_parts("supercoolname", "secret", None, None).unwrap();
    /// assert_eq!(user.username().as_ref(), "supercoolname");
    /// ```
    pub fn try_from_parts(
        username: &str,
        password: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<Self, UserValidationError> {
        Ok(Self {
            username: Username::new(username)?,
            password: validate_password(password)?,
            email: email.map(validate_email).transpose()?,
            name: name.and_then(normalise_name),
        })
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Partial update to a user. Absent fields are left untouched.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<Username>,
    pub password: Option<Zeroizing<String>>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl UserPatch {
    /// Validate raw patch inputs.
    pub fn try_from_parts(
        username: Option<&str>,
        password: Option<&str>,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<Self, UserValidationError> {
        Ok(Self {
            username: username.map(Username::new).transpose()?,
            password: password.map(validate_password).transpose()?,
            email: email.map(validate_email).transpose()?,
            name: name.and_then(normalise_name),
        })
    }

    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.email.is_none()
            && self.name.is_none()
    }
}

impl fmt::Debug for UserPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPatch")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("email", &self.email)
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests;
