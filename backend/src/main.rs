//! Backend entry-point: loads settings, applies migrations and serves the
//! tracker.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use covid_tracker::inbound::http::health::HealthState;
use covid_tracker::outbound::persistence::run_pending_migrations;

use server::{AppSettings, ServerConfig, create_server};

async fn apply_migrations(database_url: &str) -> Result<()> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&url))
        .await
        .wrap_err("migration task panicked")?
        .wrap_err("failed to apply database migrations")?;
    info!(applied, "database schema is current");
    Ok(())
}

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

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| eyre!("failed to load configuration: {e}"))?;
    let config = ServerConfig::from_settings(&settings).wrap_err("invalid configuration")?;

    if let Some(url) = config.database_url() {
        apply_migrations(url).await?;
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)
        .await
        .wrap_err("failed to start server")?;
    server.await.wrap_err("server terminated with an error")
}
