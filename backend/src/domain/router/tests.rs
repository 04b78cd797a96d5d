//! Tests for the RPC router: dispatch, gating, and envelope conversion.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mockall::predicate::eq;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{
    IdentityResolverError, MockIdentityResolver, MockTokenIssuer, MockUserDirectory,
    UserDirectory, UserDirectoryError,
};
use crate::domain::{
    Credential, NewUser, Role, User, UserId, UserPatch, UserRecord, Username,
};

fn record(id: &UserId, username: &str) -> UserRecord {
    UserRecord {
        profile: User::new(
            id.clone(),
            Username::new(username).expect("valid username"),
            Role::User,
            Utc::now(),
        ),
        password_hash: "$argon2id$v=19$secret-hash".to_owned(),
        salt: "secret-salt".to_owned(),
    }
}

fn resolver_for(identity: Identity) -> MockIdentityResolver {
    let mut resolver = MockIdentityResolver::new();
    resolver
        .expect_resolve()
        .returning(move |_| Ok(identity.clone()));
    resolver
}

fn router_with(
    directory: impl UserDirectory + 'static,
    resolver: MockIdentityResolver,
    tokens: MockTokenIssuer,
) -> UserRouter {
    UserRouter::new(
        AuthorizationGate::new(Arc::new(resolver)),
        UserHandlers::new(Arc::new(directory), Arc::new(tokens)),
    )
}

fn request(params: Value) -> RpcEnvelope {
    RpcEnvelope::from_json(params, Some(Credential::new("token")))
}

fn assert_failure_shape(response: &ResponseEnvelope) {
    assert!(!response.is_success());
    assert!(!response.message().is_empty());
    assert!(response.user().is_none());
    assert!(response.users().is_none());
    assert!(response.token().is_none());
}

#[rstest]
#[case(Endpoint::CreateUser, AccessPolicy::Open)]
#[case(Endpoint::GetAllUsers, AccessPolicy::AuthenticatedUser)]
#[case(Endpoint::GetUser, AccessPolicy::AuthenticatedUser)]
#[case(Endpoint::UpdateUser, AccessPolicy::TargetUserOrAdmin)]
#[case(Endpoint::DeleteUser, AccessPolicy::TargetUserOrAdmin)]
fn dispatch_table_assigns_policies(#[case] endpoint: Endpoint, #[case] policy: AccessPolicy) {
    let router = router_with(
        MockUserDirectory::new(),
        MockIdentityResolver::new(),
        MockTokenIssuer::new(),
    );
    assert_eq!(router.policy(endpoint), Some(policy));
}

#[tokio::test]
async fn unknown_endpoint_echoes_name_with_500() {
    let router = router_with(
        MockUserDirectory::new(),
        MockIdentityResolver::new(),
        MockTokenIssuer::new(),
    );

    let response = router.route(&request(json!({ "endpoint": "dropTables" }))).await;

    assert_failure_shape(&response);
    assert_eq!(response.status(), 500);
    assert_eq!(response.endpoint(), "dropTables");
}

#[tokio::test]
async fn missing_endpoint_echoes_unknown() {
    let router = router_with(
        MockUserDirectory::new(),
        MockIdentityResolver::new(),
        MockTokenIssuer::new(),
    );

    let response = router.route(&request(json!({ "userId": "x" }))).await;

    assert_failure_shape(&response);
    assert_eq!(response.status(), 500);
    assert_eq!(response.endpoint(), "unknown");
}

#[tokio::test]
async fn create_user_without_password_is_unprocessable() {
    let mut directory = MockUserDirectory::new();
    directory.expect_create_user().times(0);
    let router = router_with(directory, MockIdentityResolver::new(), MockTokenIssuer::new());

    let response = router
        .route(&RpcEnvelope::from_json(
            json!({ "endpoint": "createUser", "username": "supercoolname" }),
            None,
        ))
        .await;

    assert_failure_shape(&response);
    assert_eq!(response.status(), 422);
    assert_eq!(response.endpoint(), "createUser");
    assert_eq!(
        response.details(),
        Some(&json!({ "field": "password", "code": "missing_field" }))
    );
    assert!(response.trace_id().is_some());

    let body = serde_json::to_value(&response).expect("envelope serialises");
    assert_eq!(body.pointer("/details/code"), Some(&json!("missing_field")));
}

#[tokio::test]
async fn create_user_needs_no_credential() {
    let id = UserId::random();
    let created = record(&id, "supercoolname");
    let mut directory = MockUserDirectory::new();
    directory
        .expect_create_user()
        .times(1)
        .return_once(move |_| Ok(created));
    let mut resolver = MockIdentityResolver::new();
    resolver.expect_resolve().times(0);
    let mut tokens = MockTokenIssuer::new();
    tokens.expect_issue().returning(|_| Ok("fresh-token".to_owned()));
    let router = router_with(directory, resolver, tokens);

    let response = router
        .route(&RpcEnvelope::from_json(
            json!({ "endpoint": "createUser", "username": "supercoolname", "password": "secret" }),
            None,
        ))
        .await;

    assert!(response.is_success());
    assert_eq!(response.status(), 200);
    assert_eq!(response.message(), "");
    assert_eq!(response.token(), Some("fresh-token"));
    assert_eq!(response.user().map(User::id), Some(&id));
}

#[tokio::test]
async fn get_all_users_with_invalid_credential_never_reaches_directory() {
    let mut directory = MockUserDirectory::new();
    directory.expect_get_all_users().times(0);
    let mut resolver = MockIdentityResolver::new();
    resolver
        .expect_resolve()
        .times(1)
        .returning(|_| Err(IdentityResolverError::invalid_token()));
    let router = router_with(directory, resolver, MockTokenIssuer::new());

    let response = router.route(&request(json!({ "endpoint": "getAllUsers" }))).await;

    assert_failure_shape(&response);
    assert_eq!(response.status(), 401);
    assert_eq!(response.endpoint(), "getAllUsers");
}

#[tokio::test]
async fn listed_users_never_expose_secrets() {
    let mut directory = MockUserDirectory::new();
    directory
        .expect_get_all_users()
        .returning(|| Ok(vec![record(&UserId::random(), "alpha")]));
    let router = router_with(
        directory,
        resolver_for(Identity::new(UserId::random(), Role::User)),
        MockTokenIssuer::new(),
    );

    let response = router.route(&request(json!({ "endpoint": "getAllUsers" }))).await;
    let value = serde_json::to_value(&response).expect("serialises");

    assert_eq!(response.status(), 200);
    let first = value.pointer("/users/0").and_then(Value::as_object).expect("user");
    assert!(!first.contains_key("password"));
    assert!(!first.contains_key("salt"));
    assert!(!value.to_string().contains("secret-hash"));
}

#[tokio::test]
async fn get_user_is_idempotent() {
    let id = UserId::random();
    let stored = record(&id, "supercoolname");
    let mut directory = MockUserDirectory::new();
    directory
        .expect_get_user()
        .with(eq(id.clone()))
        .times(2)
        .returning(move |_| Ok(stored.clone()));
    let router = router_with(
        directory,
        resolver_for(Identity::new(UserId::random(), Role::User)),
        MockTokenIssuer::new(),
    );
    let envelope = request(json!({ "endpoint": "getUser", "userId": id.to_string() }));

    let first = router.route(&envelope).await;
    let second = router.route(&envelope).await;

    assert!(first.is_success());
    assert_eq!(first, second);
}

#[rstest]
#[case("updateUser")]
#[case("deleteUser")]
#[tokio::test]
async fn acting_on_another_user_is_forbidden(#[case] endpoint: &str) {
    let mut directory = MockUserDirectory::new();
    directory.expect_update_user().times(0);
    directory.expect_delete_user().times(0);
    let router = router_with(
        directory,
        resolver_for(Identity::new(UserId::random(), Role::User)),
        MockTokenIssuer::new(),
    );

    let response = router
        .route(&request(json!({
            "endpoint": endpoint,
            "userId": UserId::random().to_string(),
            "username": "hijacked"
        })))
        .await;

    assert_failure_shape(&response);
    assert_eq!(response.status(), 403);
    assert_eq!(response.endpoint(), endpoint);
}

#[tokio::test]
async fn self_update_applies_patch() {
    let caller = Identity::new(UserId::random(), Role::User);
    let updated = record(caller.user_id(), "updatedcoolname");
    let mut directory = MockUserDirectory::new();
    directory
        .expect_update_user()
        .with(eq(caller.user_id().clone()), mockall::predicate::always())
        .times(1)
        .return_once(move |_, _| Ok(updated));
    let router = router_with(directory, resolver_for(caller.clone()), MockTokenIssuer::new());

    let response = router
        .route(&request(json!({
            "endpoint": "updateUser",
            "userId": caller.user_id().to_string(),
            "username": "updatedcoolname"
        })))
        .await;

    assert!(response.is_success());
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.user().map(|user| user.username().as_ref()),
        Some("updatedcoolname")
    );
}

#[tokio::test]
async fn admin_deletes_other_user_without_payload() {
    let target = UserId::random();
    let mut directory = MockUserDirectory::new();
    directory
        .expect_delete_user()
        .with(eq(target.clone()))
        .times(1)
        .returning(|_| Ok(()));
    let router = router_with(
        directory,
        resolver_for(Identity::new(UserId::random(), Role::Admin)),
        MockTokenIssuer::new(),
    );

    let response = router
        .route(&request(json!({ "endpoint": "deleteUser", "userId": target.to_string() })))
        .await;

    assert!(response.is_success());
    assert_eq!(response.status(), 200);
    let value = serde_json::to_value(&response).expect("serialises");
    assert_eq!(
        value,
        json!({ "success": true, "status": 200, "message": "", "endpoint": "deleteUser" })
    );
}

#[tokio::test]
async fn directory_failure_becomes_unprocessable() {
    let mut directory = MockUserDirectory::new();
    directory
        .expect_get_user()
        .returning(|id| Err(UserDirectoryError::not_found(id.to_string())));
    let router = router_with(
        directory,
        resolver_for(Identity::new(UserId::random(), Role::User)),
        MockTokenIssuer::new(),
    );
    let target = UserId::random();

    let response = router
        .route(&request(json!({ "endpoint": "getUser", "userId": target.to_string() })))
        .await;

    assert_failure_shape(&response);
    assert_eq!(response.status(), 422);
    assert_eq!(response.message(), format!("user not found: {target}"));
}

/// Directory whose calls never complete.
struct StallingDirectory;

#[async_trait]
impl UserDirectory for StallingDirectory {
    async fn create_user(&self, _new_user: NewUser) -> Result<UserRecord, UserDirectoryError> {
        std::future::pending().await
    }

    async fn get_all_users(&self) -> Result<Vec<UserRecord>, UserDirectoryError> {
        std::future::pending().await
    }

    async fn get_user(&self, _id: &UserId) -> Result<UserRecord, UserDirectoryError> {
        std::future::pending().await
    }

    async fn update_user(
        &self,
        _id: &UserId,
        _patch: UserPatch,
    ) -> Result<UserRecord, UserDirectoryError> {
        std::future::pending().await
    }

    async fn delete_user(&self, _id: &UserId) -> Result<(), UserDirectoryError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_directory_times_out_with_503() {
    let router = router_with(
        StallingDirectory,
        resolver_for(Identity::new(UserId::random(), Role::User)),
        MockTokenIssuer::new(),
    )
    .with_handler_timeout(Duration::from_millis(250));

    let response = router.route(&request(json!({ "endpoint": "getAllUsers" }))).await;

    assert_failure_shape(&response);
    assert_eq!(response.status(), 503);
    assert_eq!(response.endpoint(), "getAllUsers");
}

/// Directory that panics on listing.
struct PanickingDirectory;

#[async_trait]
impl UserDirectory for PanickingDirectory {
    async fn create_user(&self, _new_user: NewUser) -> Result<UserRecord, UserDirectoryError> {
        Err(UserDirectoryError::storage("unused"))
    }

    async fn get_all_users(&self) -> Result<Vec<UserRecord>, UserDirectoryError> {
        panic!("directory exploded")
    }

    async fn get_user(&self, _id: &UserId) -> Result<UserRecord, UserDirectoryError> {
        Err(UserDirectoryError::storage("unused"))
    }

    async fn update_user(
        &self,
        _id: &UserId,
        _patch: UserPatch,
    ) -> Result<UserRecord, UserDirectoryError> {
        Err(UserDirectoryError::storage("unused"))
    }

    async fn delete_user(&self, _id: &UserId) -> Result<(), UserDirectoryError> {
        Err(UserDirectoryError::storage("unused"))
    }
}

#[tokio::test]
async fn handler_panic_becomes_internal_error() {
    let router = router_with(
        PanickingDirectory,
        resolver_for(Identity::new(UserId::random(), Role::User)),
        MockTokenIssuer::new(),
    );

    let response = router.route(&request(json!({ "endpoint": "getAllUsers" }))).await;

    assert_failure_shape(&response);
    assert_eq!(response.status(), 500);
    assert_eq!(response.message(), "internal error");
}
