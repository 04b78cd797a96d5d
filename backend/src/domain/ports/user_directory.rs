//! Driven port for the user-management collaborator.
//!
//! The router never touches storage directly. Every persistence concern
//! (uniqueness, password hashing, per-record atomicity) belongs to the
//! implementation behind this trait.

use async_trait::async_trait;

use crate::domain::{NewUser, UserId, UserPatch, UserRecord};

use super::define_port_error;

define_port_error! {
    /// Failures reported by user directory adapters.
    pub enum UserDirectoryError {
        /// No user exists with the requested identifier.
        NotFound { id: String } => "user not found: {id}" => NotFound,
        /// Another user already holds the requested username.
        UsernameTaken { username: String } => "username already taken: {username}" => Conflict,
        /// The directory refused the input.
        Rejected { message: String } => "{message}" => InvalidRequest,
        /// Backing storage failed while executing the operation.
        Storage { message: String } => "user directory failure: {message}" => OperationFailed,
    }
}

/// User-management operations the endpoint handlers delegate to.
///
/// Implementations must make each call atomic per user record; concurrent
/// updates to the same id must not corrupt state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Persist a new user with role [`Role::User`](crate::domain::Role::User).
    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord, UserDirectoryError>;

    /// Return every stored user.
    async fn get_all_users(&self) -> Result<Vec<UserRecord>, UserDirectoryError>;

    /// Fetch a single user.
    async fn get_user(&self, id: &UserId) -> Result<UserRecord, UserDirectoryError>;

    /// Apply `patch` to the user and return the stored result.
    async fn update_user(
        &self,
        id: &UserId,
        patch: UserPatch,
    ) -> Result<UserRecord, UserDirectoryError>;

    /// Remove the user.
    async fn delete_user(&self, id: &UserId) -> Result<(), UserDirectoryError>;
}
