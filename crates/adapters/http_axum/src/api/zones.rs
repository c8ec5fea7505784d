//! Zone endpoints: listing, climate commands, and manual synchronisation.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use tadohub_app::ports::{EventPublisher, HomeAssistant, ScheduleRepository};
use tadohub_domain::event::{Event, EventType};
use tadohub_domain::sync::SyncReport;
use tadohub_domain::zone::{HvacMode, Zone, ZoneId};

use crate::error::ApiError;
use crate::state::AppState;

fn parse_zone_id(raw: &str) -> Result<ZoneId, ApiError> {
    raw.parse::<ZoneId>()
        .map_err(|err| ApiError::from(tadohub_domain::error::TadoHubError::from(err)))
}

/// `GET /api/zones` — all known zones, ordered by id.
pub async fn list<H, R, EP>(State(state): State<AppState<H, R, EP>>) -> Json<Vec<Zone>>
where
    H: HomeAssistant + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    Json(state.zone_service.list_zones().await)
}

/// `GET /api/zones/{id}` — one zone from the cache.
pub async fn get<H, R, EP>(
    State(state): State<AppState<H, R, EP>>,
    Path(id): Path<String>,
) -> Result<Json<Zone>, ApiError>
where
    H: HomeAssistant + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let id = parse_zone_id(&id)?;
    Ok(Json(state.zone_service.get_zone(&id).await?))
}

#[derive(Deserialize)]
pub struct SetTemperatureBody {
    /// Requested setpoint in °C.
    pub target: f64,
}

/// `POST /api/zones/{id}/temperature` — validate and forward a setpoint.
pub async fn set_temperature<H, R, EP>(
    State(state): State<AppState<H, R, EP>>,
    Path(id): Path<String>,
    Json(body): Json<SetTemperatureBody>,
) -> Result<Json<Zone>, ApiError>
where
    H: HomeAssistant + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let id = parse_zone_id(&id)?;
    let zone = state.zone_service.set_temperature(&id, body.target).await?;
    Ok(Json(zone))
}

#[derive(Deserialize)]
pub struct SetModeBody {
    pub mode: HvacMode,
}

/// `POST /api/zones/{id}/mode` — switch between auto, heat, and off.
pub async fn set_mode<H, R, EP>(
    State(state): State<AppState<H, R, EP>>,
    Path(id): Path<String>,
    Json(body): Json<SetModeBody>,
) -> Result<Json<Zone>, ApiError>
where
    H: HomeAssistant + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let id = parse_zone_id(&id)?;
    let zone = state.zone_service.set_mode(&id, body.mode).await?;
    Ok(Json(zone))
}

/// `POST /api/zones/{id}/sync` — reconcile installed automations with the
/// zone's schedule. Responds 200 when converged, 502 when the pass failed
/// or was cut short; the body carries the full report either way.
pub async fn sync<H, R, EP>(
    State(state): State<AppState<H, R, EP>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<SyncReport>), ApiError>
where
    H: HomeAssistant + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let id = parse_zone_id(&id)?;
    let zone = state.zone_service.get_zone(&id).await?;
    let schedule = state.schedule_service.schedule_for(&id).await?;
    let report = state.sync_service.synchronize(&zone, &schedule).await;

    let event = Event::new(
        EventType::SyncCompleted,
        Some(id),
        serde_json::to_value(&report).unwrap_or_default(),
    );
    if let Err(err) = state.event_bus.publish(event).await {
        tracing::warn!(error = %err, "failed to publish sync report");
    }

    let status = if report.outcome.is_converged() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(report)))
}
