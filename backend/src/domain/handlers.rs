//! Endpoint handlers for the user-management operations.
//!
//! Handlers run after the authorization gate has admitted the request. They
//! translate envelope params into validated domain values, delegate to the
//! [`UserDirectory`], and strip secret fields before anything reaches a
//! response. Every failure here surfaces with envelope status 422.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::ports::{TokenIssuer, UserDirectory};
use crate::domain::rpc::{
    FieldName, ResponsePayload, RpcEnvelope, RpcParams, USER_ID_FIELD, user_validation_error,
};
use crate::domain::{Error, Identity, NewUser, User, UserPatch};

/// Result produced by every handler.
pub type HandlerResult = Result<Option<ResponsePayload>, Error>;

const USERNAME_FIELD: FieldName = FieldName::new("username");
const PASSWORD_FIELD: FieldName = FieldName::new("password");
const EMAIL_FIELD: FieldName = FieldName::new("email");
const NAME_FIELD: FieldName = FieldName::new("name");

fn new_user_from(params: &RpcParams) -> Result<NewUser, Error> {
    let username = params.required_str(USERNAME_FIELD)?;
    let password = params.required_str(PASSWORD_FIELD)?;
    NewUser::try_from_parts(
        username,
        password,
        params.optional_str(EMAIL_FIELD)?,
        params.optional_str(NAME_FIELD)?,
    )
    .map_err(user_validation_error)
}

/// Collect the updatable fields. `endpoint`, `userId` and unrecognised keys
/// are ignored.
fn patch_from(params: &RpcParams) -> Result<UserPatch, Error> {
    let patch = UserPatch::try_from_parts(
        params.optional_str(USERNAME_FIELD)?,
        params.optional_str(PASSWORD_FIELD)?,
        params.optional_str(EMAIL_FIELD)?,
        params.optional_str(NAME_FIELD)?,
    )
    .map_err(user_validation_error)?;
    if patch.is_empty() {
        return Err(Error::invalid_request("update must change at least one field")
            .with_details(serde_json::json!({ "code": "empty_patch" })));
    }
    Ok(patch)
}

/// Handlers for the five user endpoints, sharing their collaborators.
#[derive(Clone)]
pub struct UserHandlers {
    directory: Arc<dyn UserDirectory>,
    tokens: Arc<dyn TokenIssuer>,
}

impl UserHandlers {
    /// Handlers backed by `directory`; `tokens` signs tokens for new accounts.
    pub fn new(directory: Arc<dyn UserDirectory>, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { directory, tokens }
    }

    /// Register a new account and issue its first token.
    pub async fn create_user(&self, envelope: &RpcEnvelope) -> HandlerResult {
        let new_user = new_user_from(envelope.params())?;
        let record = self.directory.create_user(new_user).await?;
        let user = record.into_profile();
        let token = self.tokens.issue(user.id())?;
        info!(user_id = %user.id(), "user created");
        Ok(Some(ResponsePayload::Account { user, token }))
    }

    /// List every user.
    pub async fn get_all_users(
        &self,
        _envelope: &RpcEnvelope,
        caller: Option<&Identity>,
    ) -> HandlerResult {
        let users: Vec<User> = self
            .directory
            .get_all_users()
            .await?
            .into_iter()
            .map(User::from)
            .collect();
        debug!(
            caller = ?caller.map(Identity::user_id),
            count = users.len(),
            "listed users"
        );
        Ok(Some(ResponsePayload::Users(users)))
    }

    /// Fetch one user by `userId`.
    pub async fn get_user(&self, envelope: &RpcEnvelope, caller: Option<&Identity>) -> HandlerResult {
        let user_id = envelope.params().required_user_id(USER_ID_FIELD)?;
        let user = self.directory.get_user(&user_id).await?.into_profile();
        debug!(caller = ?caller.map(Identity::user_id), user_id = %user_id, "fetched user");
        Ok(Some(ResponsePayload::User(user)))
    }

    /// Apply a partial update to the target user.
    pub async fn update_user(
        &self,
        envelope: &RpcEnvelope,
        caller: Option<&Identity>,
    ) -> HandlerResult {
        let params = envelope.params();
        let user_id = params.required_user_id(USER_ID_FIELD)?;
        let patch = patch_from(params)?;
        let user = self
            .directory
            .update_user(&user_id, patch)
            .await?
            .into_profile();
        info!(caller = ?caller.map(Identity::user_id), user_id = %user_id, "user updated");
        Ok(Some(ResponsePayload::User(user)))
    }

    /// Remove the target user. Success carries no payload.
    pub async fn delete_user(
        &self,
        envelope: &RpcEnvelope,
        caller: Option<&Identity>,
    ) -> HandlerResult {
        let user_id = envelope.params().required_user_id(USER_ID_FIELD)?;
        self.directory.delete_user(&user_id).await?;
        info!(caller = ?caller.map(Identity::user_id), user_id = %user_id, "user deleted");
        Ok(None)
    }
}
