//! Backend entry-point: loads settings, migrates the database and serves the
//! REST API, WebSocket relay and maintenance scheduler.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig as _;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use podium::inbound::http::health::HealthState;
use podium::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use podium::settings::PodiumSettings;
use server::{Running, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let runtime = PodiumSettings::load()
        .map_err(|err| eyre!("failed to load configuration: {err}"))?
        .validate()
        .wrap_err("invalid configuration")?;
    info!(config = ?runtime, "configuration loaded");

    run_migrations(runtime.database_url.to_string())
        .await
        .wrap_err("failed to apply database migrations")?;

    let pool = DbPool::new(
        PoolConfig::new(runtime.database_url.as_str()).with_max_size(runtime.db_max_connections),
    )
    .await
    .wrap_err("failed to build database pool")?;

    let health_state = web::Data::new(HealthState::new());
    let Running { server, jobs } =
        create_server(health_state, ServerConfig::new(runtime, pool))
            .wrap_err("failed to start HTTP server")?;

    let result = server.await.wrap_err("HTTP server stopped with an error");
    for job in jobs {
        job.abort();
    }
    result
}
