//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod away;
#[allow(clippy::missing_errors_doc)]
pub mod schedules;
pub mod sse;
#[allow(clippy::missing_errors_doc)]
pub mod zones;

use axum::Router;
use axum::routing::{get, post, put};

use tadohub_app::ports::{EventPublisher, HomeAssistant, ScheduleRepository};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<H, R, EP>() -> Router<AppState<H, R, EP>>
where
    H: HomeAssistant + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        // Zones
        .route("/zones", get(zones::list::<H, R, EP>))
        .route("/zones/{id}", get(zones::get::<H, R, EP>))
        .route(
            "/zones/{id}/temperature",
            post(zones::set_temperature::<H, R, EP>),
        )
        .route("/zones/{id}/mode", post(zones::set_mode::<H, R, EP>))
        .route("/zones/{id}/sync", post(zones::sync::<H, R, EP>))
        // Schedules
        .route(
            "/schedules",
            get(schedules::list::<H, R, EP>).post(schedules::create::<H, R, EP>),
        )
        .route(
            "/schedules/{entry_id}",
            put(schedules::update::<H, R, EP>).delete(schedules::delete::<H, R, EP>),
        )
        // Presence
        .route("/away-home/set", post(away::set::<H, R, EP>))
        // Live updates
        .route("/events/stream", get(sse::stream::<H, R, EP>))
}
