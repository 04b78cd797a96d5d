//! Health probes for the user router.
//!
//! Readiness needs two startup steps: the router has been wired (including
//! seeding the configured admin account) and the HTTP listener is bound.
//! The readiness body reports each step so a stuck rollout shows which one
//! is missing:
//!
//! ```json
//! { "ready": false, "router": true, "listener": false }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;

/// Startup progress shared between `main` and the probe handlers.
#[derive(Debug, Default)]
pub struct HealthState {
    router: AtomicBool,
    listener: AtomicBool,
}

/// Readiness report returned by `GET /health/ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub ready: bool,
    pub router: bool,
    pub listener: bool,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the router and its adapters are built and the admin
    /// account, if any, is seeded.
    pub fn mark_router_ready(&self) {
        self.router.store(true, Ordering::Release);
    }

    /// Record that the HTTP listener is bound.
    pub fn mark_listener_bound(&self) {
        self.listener.store(true, Ordering::Release);
    }

    pub fn readiness(&self) -> Readiness {
        let router = self.router.load(Ordering::Acquire);
        let listener = self.listener.load(Ordering::Acquire);
        Readiness {
            ready: router && listener,
            router,
            listener,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.readiness().ready
    }
}

/// Readiness probe: 200 once the router is wired and the listener bound,
/// 503 with the pending step otherwise.
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    let readiness = state.readiness();
    let mut response = if readiness.ready {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(readiness)
}

/// Liveness probe: 200 whenever the process can answer.
#[get("/health/live")]
pub async fn live() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}
