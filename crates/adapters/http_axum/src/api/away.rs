//! Whole-home away/home switching.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use tadohub_app::ports::{EventPublisher, HomeAssistant, ScheduleRepository};
use tadohub_domain::zone::{Presence, Zone};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SetPresenceBody {
    pub mode: Presence,
}

/// `POST /api/away-home/set` — apply the away preset to every zone, or
/// restore schedule-following mode when the household returns.
pub async fn set<H, R, EP>(
    State(state): State<AppState<H, R, EP>>,
    Json(body): Json<SetPresenceBody>,
) -> Result<Json<Vec<Zone>>, ApiError>
where
    H: HomeAssistant + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let zones = state.zone_service.set_presence(body.mode).await?;
    Ok(Json(zones))
}
