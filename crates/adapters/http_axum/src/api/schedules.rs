//! Schedule endpoints: the zone → entries mapping and entry CRUD.
//!
//! Times cross the API as `HH:MM` strings, matching what thermostat
//! front-ends send, and are parsed into the domain representation here.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use tadohub_app::ports::{EventPublisher, HomeAssistant, ScheduleRepository};
use tadohub_domain::error::{NotFoundError, TadoHubError};
use tadohub_domain::id::EntryId;
use tadohub_domain::schedule::ScheduleEntry;
use tadohub_domain::time::{TimeOfDay, Weekday};
use tadohub_domain::zone::ZoneId;

use crate::error::ApiError;
use crate::state::AppState;

/// Wire representation of one schedule entry.
#[derive(Serialize)]
pub struct EntryView {
    pub id: EntryId,
    pub slot: u32,
    pub days: Vec<Weekday>,
    pub start: String,
    pub end: String,
    pub target: f64,
}

impl From<&ScheduleEntry> for EntryView {
    fn from(entry: &ScheduleEntry) -> Self {
        Self {
            id: entry.id,
            slot: entry.slot,
            days: entry.days.iter().copied().collect(),
            start: entry.start.to_string(),
            end: entry.end.to_string(),
            target: entry.target,
        }
    }
}

fn parse_time(raw: &str) -> Result<TimeOfDay, ApiError> {
    raw.parse::<TimeOfDay>()
        .map_err(|err| ApiError::from(TadoHubError::from(err)))
}

fn parse_entry_id(raw: &str) -> Result<EntryId, ApiError> {
    raw.parse::<EntryId>().map_err(|_| {
        ApiError::from(TadoHubError::from(NotFoundError {
            entity: "ScheduleEntry",
            id: raw.to_string(),
        }))
    })
}

/// `GET /api/schedules` — every zone's entries, ordered by slot.
pub async fn list<H, R, EP>(
    State(state): State<AppState<H, R, EP>>,
) -> Result<Json<BTreeMap<ZoneId, Vec<EntryView>>>, ApiError>
where
    H: HomeAssistant + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let book = state.schedule_service.list().await?;
    let view = book
        .zones()
        .iter()
        .map(|(zone, schedule)| {
            let entries = schedule.entries().iter().map(EntryView::from).collect();
            (zone.clone(), entries)
        })
        .collect();
    Ok(Json(view))
}

#[derive(Deserialize)]
pub struct CreateEntryBody {
    pub zone_id: String,
    pub days: Vec<Weekday>,
    /// `HH:MM`, inclusive.
    pub start: String,
    /// `HH:MM`, exclusive.
    pub end: String,
    pub target: f64,
}

/// `POST /api/schedules` — add an entry to a zone's schedule.
pub async fn create<H, R, EP>(
    State(state): State<AppState<H, R, EP>>,
    Json(body): Json<CreateEntryBody>,
) -> Result<(StatusCode, Json<EntryView>), ApiError>
where
    H: HomeAssistant + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let zone = body
        .zone_id
        .parse::<ZoneId>()
        .map_err(|err| ApiError::from(TadoHubError::from(err)))?;
    let entry = ScheduleEntry::builder()
        .days(body.days)
        .start(parse_time(&body.start)?)
        .end(parse_time(&body.end)?)
        .target(body.target)
        .build()?;

    let saved = state.schedule_service.upsert_entry(zone, entry).await?;
    Ok((StatusCode::CREATED, Json(EntryView::from(&saved))))
}

#[derive(Deserialize)]
pub struct UpdateEntryBody {
    pub days: Vec<Weekday>,
    pub start: String,
    pub end: String,
    pub target: f64,
}

/// `PUT /api/schedules/{entry_id}` — replace an entry in place.
///
/// The entry keeps its zone and slot, so the derived automation name is
/// stable across edits.
pub async fn update<H, R, EP>(
    State(state): State<AppState<H, R, EP>>,
    Path(entry_id): Path<String>,
    Json(body): Json<UpdateEntryBody>,
) -> Result<Json<EntryView>, ApiError>
where
    H: HomeAssistant + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let id = parse_entry_id(&entry_id)?;
    let book = state.schedule_service.list().await?;
    let zone = book
        .zone_of(id)
        .cloned()
        .ok_or_else(|| {
            ApiError::from(TadoHubError::from(NotFoundError {
                entity: "ScheduleEntry",
                id: entry_id.clone(),
            }))
        })?;

    let entry = ScheduleEntry::builder()
        .id(id)
        .days(body.days)
        .start(parse_time(&body.start)?)
        .end(parse_time(&body.end)?)
        .target(body.target)
        .build()?;

    let saved = state.schedule_service.upsert_entry(zone, entry).await?;
    Ok(Json(EntryView::from(&saved)))
}

/// `DELETE /api/schedules/{entry_id}` — remove an entry wherever it lives.
pub async fn delete<H, R, EP>(
    State(state): State<AppState<H, R, EP>>,
    Path(entry_id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    H: HomeAssistant + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let id = parse_entry_id(&entry_id)?;
    state.schedule_service.remove_entry(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
