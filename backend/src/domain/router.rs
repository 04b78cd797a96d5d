//! RPC router for the user-management endpoints.
//!
//! The router owns a fixed dispatch table mapping each [`Endpoint`] to an
//! [`AccessPolicy`] and a handler. For every request it:
//!
//! 1. resolves the endpoint by exact name (unknown names fail with 500),
//! 2. runs the [`AuthorizationGate`] for the endpoint's policy,
//! 3. invokes the handler,
//!
//! and folds the outcome into a [`ResponseEnvelope`]. Steps 2 and 3 share a
//! single deadline; exceeding it yields 503. A panic in either step is
//! contained and reported as 500. `route` never fails.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{error, info, warn};

use crate::domain::authorization::{AccessPolicy, AuthorizationGate};
use crate::domain::handlers::{HandlerResult, UserHandlers};
use crate::domain::rpc::{Endpoint, ResponseEnvelope, RpcEnvelope};
use crate::domain::{Error, Identity, TraceId};

/// Deadline applied to the gate and handler when none is configured.
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(5);

type HandlerFn = for<'a> fn(
    &'a UserHandlers,
    &'a RpcEnvelope,
    Option<&'a Identity>,
) -> BoxFuture<'a, HandlerResult>;

#[derive(Clone, Copy)]
struct Route {
    policy: AccessPolicy,
    handler: HandlerFn,
}

fn create_user<'a>(
    handlers: &'a UserHandlers,
    envelope: &'a RpcEnvelope,
    _caller: Option<&'a Identity>,
) -> BoxFuture<'a, HandlerResult> {
    handlers.create_user(envelope).boxed()
}

fn get_all_users<'a>(
    handlers: &'a UserHandlers,
    envelope: &'a RpcEnvelope,
    caller: Option<&'a Identity>,
) -> BoxFuture<'a, HandlerResult> {
    handlers.get_all_users(envelope, caller).boxed()
}

fn get_user<'a>(
    handlers: &'a UserHandlers,
    envelope: &'a RpcEnvelope,
    caller: Option<&'a Identity>,
) -> BoxFuture<'a, HandlerResult> {
    handlers.get_user(envelope, caller).boxed()
}

fn update_user<'a>(
    handlers: &'a UserHandlers,
    envelope: &'a RpcEnvelope,
    caller: Option<&'a Identity>,
) -> BoxFuture<'a, HandlerResult> {
    handlers.update_user(envelope, caller).boxed()
}

fn delete_user<'a>(
    handlers: &'a UserHandlers,
    envelope: &'a RpcEnvelope,
    caller: Option<&'a Identity>,
) -> BoxFuture<'a, HandlerResult> {
    handlers.delete_user(envelope, caller).boxed()
}

fn route_for(endpoint: Endpoint) -> Route {
    match endpoint {
        Endpoint::CreateUser => Route {
            policy: AccessPolicy::Open,
            handler: create_user,
        },
        Endpoint::GetAllUsers => Route {
            policy: AccessPolicy::AuthenticatedUser,
            handler: get_all_users,
        },
        Endpoint::GetUser => Route {
            policy: AccessPolicy::AuthenticatedUser,
            handler: get_user,
        },
        Endpoint::UpdateUser => Route {
            policy: AccessPolicy::TargetUserOrAdmin,
            handler: update_user,
        },
        Endpoint::DeleteUser => Route {
            policy: AccessPolicy::TargetUserOrAdmin,
            handler: delete_user,
        },
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Dispatches user-management RPC envelopes.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use user_router::domain::authorization::AuthorizationGate;
/// use user_router::domain::handlers::UserHandlers;
/// use user_router::domain::router::UserRouter;
/// use user_router::domain::rpc::RpcEnvelope;
/// use user_router::outbound::{HmacTokenAuthority, InMemoryUserDirectory, TokenIdentityResolver};
///
/// # async fn demo() {
/// let directory = Arc::new(InMemoryUserDirectory::default());
/// let tokens = Arc::new(HmacTokenAuthority::new(b"secret".to_vec()));
/// let resolver = Arc::new(TokenIdentityResolver::new(tokens.clone(), directory.clone()));
/// let router = UserRouter::new(
///     AuthorizationGate::new(resolver),
///     UserHandlers::new(directory, tokens),
/// );
/// let response = router
///     .route(&RpcEnvelope::from_json(serde_json::json!({ "endpoint": "getAllUsers" }), None))
///     .await;
/// assert_eq!(response.status(), 401);
/// # }
/// ```
#[derive(Clone)]
pub struct UserRouter {
    routes: BTreeMap<Endpoint, Route>,
    gate: AuthorizationGate,
    handlers: UserHandlers,
    handler_timeout: Duration,
}

impl UserRouter {
    /// Build the dispatch table over `handlers`, guarded by `gate`, with the
    /// default handler timeout.
    pub fn new(gate: AuthorizationGate, handlers: UserHandlers) -> Self {
        let routes = Endpoint::ALL
            .into_iter()
            .map(|endpoint| (endpoint, route_for(endpoint)))
            .collect();
        Self {
            routes,
            gate,
            handlers,
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
        }
    }

    /// Override the deadline shared by the gate and the handler.
    pub fn with_handler_timeout(mut self, handler_timeout: Duration) -> Self {
        self.handler_timeout = handler_timeout;
        self
    }

    /// Access policy guarding `endpoint`.
    pub fn policy(&self, endpoint: Endpoint) -> Option<AccessPolicy> {
        self.routes.get(&endpoint).map(|route| route.policy)
    }

    /// Route one request and always produce an envelope.
    ///
    /// Runs inside the caller's [`TraceId`] scope when one exists, otherwise
    /// in a fresh one.
    pub async fn route(&self, envelope: &RpcEnvelope) -> ResponseEnvelope {
        let trace_id = TraceId::current_or_generate();
        TraceId::scope(trace_id, self.route_in_scope(envelope, trace_id)).await
    }

    async fn route_in_scope(&self, envelope: &RpcEnvelope, trace_id: TraceId) -> ResponseEnvelope {
        let endpoint = envelope.endpoint_label();
        let started = Instant::now();
        let outcome = self.dispatch(envelope).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &outcome {
            Ok(_) => info!(%trace_id, endpoint, elapsed_ms, "rpc request succeeded"),
            Err(err) if err.status() >= 500 => error!(
                %trace_id,
                endpoint,
                elapsed_ms,
                status = err.status(),
                code = ?err.code(),
                error = %err,
                details = ?err.details(),
                "rpc request failed"
            ),
            Err(err) => warn!(
                %trace_id,
                endpoint,
                elapsed_ms,
                status = err.status(),
                code = ?err.code(),
                error = %err,
                details = ?err.details(),
                "rpc request rejected"
            ),
        }

        ResponseEnvelope::from_outcome(endpoint, outcome)
    }

    async fn dispatch(&self, envelope: &RpcEnvelope) -> HandlerResult {
        let endpoint = envelope.endpoint()?;
        let route = *self
            .routes
            .get(&endpoint)
            .ok_or_else(|| Error::unknown_endpoint(format!("unknown endpoint: {endpoint}")))?;

        let work = async {
            let caller = self.gate.admit(route.policy, envelope).await?;
            (route.handler)(&self.handlers, envelope, caller.as_ref()).await
        };

        match tokio::time::timeout(self.handler_timeout, AssertUnwindSafe(work).catch_unwind())
            .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(payload)) => {
                error!(endpoint = %endpoint, panic = panic_message(payload.as_ref()), "handler panicked");
                Err(Error::internal("internal error"))
            }
            Err(_) => Err(Error::service_unavailable(format!(
                "{endpoint} did not complete within {}ms",
                self.handler_timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
mod tests;
