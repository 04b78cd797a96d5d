//! User router entry-point: loads settings, wires adapters, and serves
//! `POST /rpc` alongside the health probes.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use user_router::ServerSettings;
use user_router::inbound::http::health::HealthState;

use server::{build_router, create_server};

fn init_tracing(pretty: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let result = if pretty {
        fmt().with_env_filter(filter).try_init()
    } else {
        fmt().with_env_filter(filter).json().try_init()
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let settings = ServerSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    init_tracing(settings.pretty_logs);

    let health_state = web::Data::new(HealthState::new());
    let router = build_router(&settings).await?;
    health_state.mark_router_ready();
    let bind_addr = (settings.host().to_owned(), settings.port());
    info!(host = %bind_addr.0, port = bind_addr.1, "starting user router");

    let server = create_server(health_state, router, bind_addr)
        .wrap_err("failed to start HTTP server")?;
    server.await.wrap_err("HTTP server terminated with an error")?;
    Ok(())
}
