//! Backend entry-point: loads configuration, wires adapters into the HTTP
//! state and serves the REST API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use routeshare::inbound::http::health::HealthState;
use routeshare::inbound::http::session_config::{BuildMode, key_fingerprint, session_settings};
use routeshare::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use routeshare::settings::AppSettings;

use server::{ServerConfig, build_http_state, create_server};

async fn connect_database(settings: &AppSettings) -> Result<Option<DbPool>> {
    let Some(url) = settings.database_url() else {
        return Ok(None);
    };
    let config = PoolConfig::new(url);
    run_migrations(url)
        .await
        .wrap_err_with(|| format!("running migrations against {}", config.redacted_url()))?;
    let redacted = config.redacted_url();
    let pool = DbPool::new(config)
        .await
        .wrap_err_with(|| format!("connecting to {redacted}"))?;
    Ok(Some(pool))
}

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

    let settings = AppSettings::load().map_err(|error| eyre!("loading configuration: {error}"))?;
    let session = session_settings(&settings.session_toggles(), BuildMode::from_debug_assertions())
        .wrap_err("resolving session settings")?;
    info!(fingerprint = %key_fingerprint(&session.key), "session key loaded");

    let bind_addr = settings.bind_addr()?;
    let pool = connect_database(&settings).await?;
    let http_state = build_http_state(&settings, pool)?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state,
        ServerConfig::new(session, bind_addr),
        http_state,
    )?;
    info!(%bind_addr, "listening");
    server.await?;
    Ok(())
}
