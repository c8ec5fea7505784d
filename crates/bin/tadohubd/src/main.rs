//! # tadohubd — tadohub daemon
//!
//! Composition root that wires all adapters together and starts the add-on.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Construct the Home Assistant client and file-backed schedule store
//! - Construct application services, injecting adapters via port traits
//! - Prime the zone cache and start the WebSocket state listener
//! - Build the axum router, bind to a TCP port, and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use tadohub_adapter_hass::{HassClient, HassConfig, StateChangedListener};
use tadohub_adapter_http_axum::state::AppState;
use tadohub_adapter_storage_file::FileScheduleRepository;
use tadohub_app::event_bus::InProcessEventBus;
use tadohub_app::services::schedule_service::ScheduleService;
use tadohub_app::services::sync_service::SyncService;
use tadohub_app::services::zone_service::{AwaySettings, ZoneService};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    if config.homeassistant.token.is_empty() {
        tracing::warn!("no Home Assistant token configured, API calls will be rejected");
    }

    // Home Assistant gateway
    let hass_config = HassConfig {
        base_url: config.homeassistant.base_url.clone(),
        token: config.homeassistant.token.clone(),
        timeout: Duration::from_secs(config.homeassistant.timeout_secs),
        max_retries: config.homeassistant.max_retries,
    };
    let hass = Arc::new(HassClient::new(hass_config.clone())?);

    // Schedule store
    let repo = FileScheduleRepository::new(&config.schedules.path, config.schedules.backup);

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(256));

    // Services
    let zone_service = Arc::new(ZoneService::new(
        Arc::clone(&hass),
        Arc::clone(&event_bus),
        config.homeassistant.auto_discover,
        AwaySettings {
            temperature: config.away.temperature,
            mode: config.away.mode,
        },
    ));
    let schedule_service = Arc::new(ScheduleService::new(repo, Arc::clone(&event_bus)));
    let sync_service = Arc::new(SyncService::new(
        Arc::clone(&hass),
        config.homeassistant.entity_prefix.clone(),
    ));

    // Prime the cache; an unreachable instance is not fatal, the listener
    // fills the cache once the connection comes up.
    match zone_service.refresh_zones().await {
        Ok(zones) => tracing::info!(count = zones.len(), "initial zone refresh complete"),
        Err(err) => {
            tracing::warn!(error = %err, "initial zone refresh failed, starting with an empty cache");
        }
    }

    // Background state listener
    let listener = StateChangedListener::new(&hass_config, Arc::clone(&zone_service));
    let listener_task = tokio::spawn(listener.run());

    // HTTP
    let state = AppState::from_arcs(zone_service, schedule_service, sync_service, event_bus);
    let app = tadohub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    tracing::info!(%bind_addr, "tadohubd listening");

    let tcp = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    axum::serve(tcp, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    listener_task.abort();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
