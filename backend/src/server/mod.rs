//! Server construction and middleware wiring.

mod state_builders;

pub use state_builders::build_router;

use std::net::ToSocketAddrs;
use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use user_router::Trace;
use user_router::domain::router::UserRouter;
use user_router::inbound::http::health::{HealthState, live, ready};
use user_router::inbound::http::rpc::rpc;
use user_router::inbound::http::state::HttpState;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(rpc)
        .service(ready)
        .service(live)
}

/// Construct an Actix HTTP server serving `router`.
///
/// Records the bound listener on `health_state`; readiness also needs the
/// router to have been marked ready by the caller.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    router: UserRouter,
    bind_addr: impl ToSocketAddrs,
) -> std::io::Result<Server> {
    let http_state = web::Data::new(HttpState::new(Arc::new(router)));
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || build_app(server_health_state.clone(), http_state.clone()))
        .bind(bind_addr)?
        .run();

    health_state.mark_listener_bound();
    Ok(server)
}
