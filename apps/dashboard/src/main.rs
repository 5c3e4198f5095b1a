mod config;
mod http;
mod web;

use anyhow::{Context, Result};
use config::{BackendKind, Config};
use std::sync::Arc;
use thermoview_engine::sim::{HouseProfile, SimulatedBackend};
use thermoview_engine::{
    DashboardSession, HvacBackend, LocationId, PollScheduler, SessionConfig,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let backend: Arc<dyn HvacBackend> = match &config.backend {
        BackendKind::Simulated => {
            tracing::info!("using the built-in simulated collaborator");
            Arc::new(SimulatedBackend::new(HouseProfile::default(), 22.0))
        }
        BackendKind::Http { base_url } => {
            tracing::info!(%base_url, "using HTTP collaborators");
            Arc::new(http::HttpBackend::new(base_url.clone()).context("building HTTP client")?)
        }
    };

    let session = Arc::new(DashboardSession::new(
        backend,
        config.location.clone().map(LocationId::new),
        SessionConfig {
            debounce: config.debounce,
            ..SessionConfig::default()
        },
    ));
    if session.location().is_none() {
        tracing::warn!("no location configured; polling is disabled");
    }

    let scheduler = PollScheduler::start(Arc::clone(&session), config.intervals);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "dashboard listening");

    axum::serve(listener, web::router(Arc::clone(&session)))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("serving dashboard")?;

    scheduler.shutdown().await;
    session.teardown().await;
    Ok(())
}
