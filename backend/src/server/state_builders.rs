//! Builders wiring adapters into the router from settings.

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultClock;
use tracing::{info, warn};

use user_router::ServerSettings;
use user_router::domain::NewUser;
use user_router::domain::authorization::AuthorizationGate;
use user_router::domain::handlers::UserHandlers;
use user_router::domain::router::UserRouter;
use user_router::outbound::{HmacTokenAuthority, InMemoryUserDirectory, TokenIdentityResolver};

fn token_authority(settings: &ServerSettings) -> HmacTokenAuthority {
    match settings.token_secret() {
        Some(secret) => HmacTokenAuthority::new(secret.as_bytes().to_vec()),
        None => {
            warn!("no token secret configured; issued tokens will not survive a restart");
            HmacTokenAuthority::ephemeral()
        }
    }
}

/// Build the router and its adapters, seeding the admin account if one is
/// configured.
///
/// # Errors
/// Fails when the admin credentials are invalid or cannot be stored.
pub async fn build_router(settings: &ServerSettings) -> Result<UserRouter> {
    let directory = Arc::new(InMemoryUserDirectory::new(Arc::new(DefaultClock)));
    if let Some((username, password)) = settings.admin_credentials() {
        let admin = NewUser::try_from_parts(username, password, None, None)
            .wrap_err("invalid admin credentials")?;
        let seeded = directory
            .seed_admin(admin)
            .await
            .wrap_err("failed to seed admin user")?;
        info!(user_id = %seeded.id(), "admin account ready");
    }

    let authority = Arc::new(token_authority(settings));
    let resolver = Arc::new(TokenIdentityResolver::new(
        Arc::clone(&authority),
        directory.clone(),
    ));
    let router = UserRouter::new(
        AuthorizationGate::new(resolver),
        UserHandlers::new(directory, authority),
    )
    .with_handler_timeout(settings.handler_timeout());
    Ok(router)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use serde_json::json;
    use user_router::domain::rpc::RpcEnvelope;

    fn settings(admin: Option<(&str, &str)>) -> ServerSettings {
        ServerSettings {
            host: None,
            port: None,
            token_secret: Some("test-secret".to_owned()),
            handler_timeout_ms: None,
            admin_username: admin.map(|(username, _)| username.to_owned()),
            admin_password: admin.map(|(_, password)| password.to_owned()),
            pretty_logs: false,
        }
    }

    #[tokio::test]
    async fn tokens_signed_with_configured_secret_are_accepted() {
        let router = build_router(&settings(None)).await.expect("router builds");
        let created = router
            .route(&RpcEnvelope::from_json(
                json!({ "endpoint": "createUser", "username": "supercoolname", "password": "pw" }),
                None,
            ))
            .await;
        let token = created.token().expect("token issued").to_owned();
        let expected = HmacTokenAuthority::new(b"test-secret".to_vec())
            .sign(created.user().expect("user").id())
            .expect("token signs");
        assert_eq!(token, expected);
    }

    #[tokio::test]
    async fn invalid_admin_credentials_fail_startup() {
        let result = build_router(&settings(Some(("x", "pw")))).await;
        assert!(result.is_err());
    }
}
