//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`TadoHubError`] via `#[from]`. Adapters map transport failures into
//! [`HomeAssistantError`] or [`StorageError`] so that callers only ever see
//! the domain taxonomy.

use crate::id::EntryId;

/// Umbrella error for all domain operations.
#[derive(Debug, thiserror::Error)]
pub enum TadoHubError {
    /// A domain invariant was violated by user input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced object does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A schedule entry intersects an existing one.
    #[error(transparent)]
    Overlap(#[from] OverlappingEntry),

    /// An entity snapshot could not be turned into a zone.
    #[error(transparent)]
    Snapshot(#[from] MalformedSnapshot),

    /// The Home Assistant API rejected or failed a call.
    #[error(transparent)]
    HomeAssistant(#[from] HomeAssistantError),

    /// The schedule file could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Input validation failures.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("target temperature {value}°C outside safe range {min}..{max}°C")]
    TemperatureOutOfRange { value: f64, min: f64, max: f64 },

    #[error("unknown mode: {0}")]
    UnknownMode(String),

    #[error("schedule entry has an empty day set")]
    EmptyDaySet,

    #[error("schedule entry start must be before end")]
    StartNotBeforeEnd,

    #[error("invalid time of day: {0}")]
    InvalidTimeOfDay(String),

    #[error("zone id must not be empty")]
    EmptyZoneId,
}

/// A referenced object does not exist.
#[derive(Debug, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    /// Kind of object, e.g. `"Zone"` or `"ScheduleEntry"`.
    pub entity: &'static str,
    pub id: String,
}

/// A schedule entry intersects an existing entry on a shared day.
#[derive(Debug, thiserror::Error)]
#[error("schedule entry overlaps existing entry {conflicting}")]
pub struct OverlappingEntry {
    /// Identity of the entry already occupying the time range.
    pub conflicting: EntryId,
}

/// An entity snapshot is missing required attributes or carries
/// non-numeric values where numbers are expected.
#[derive(Debug, thiserror::Error)]
#[error("malformed snapshot for {entity_id}: {reason}")]
pub struct MalformedSnapshot {
    pub entity_id: String,
    pub reason: String,
}

/// Failures talking to the Home Assistant API.
#[derive(Debug, thiserror::Error)]
pub enum HomeAssistantError {
    /// 401/403 — bad or missing token. Never retried silently.
    #[error("unauthorized: Home Assistant rejected the access token")]
    Unauthorized,

    /// Network failure or timeout after bounded retries.
    #[error("Home Assistant unreachable: {0}")]
    Unreachable(String),

    /// The requested entity does not exist on the Home Assistant side.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// A service call returned a non-success status.
    #[error("service call {service} failed with status {status}")]
    ServiceCallFailed { service: String, status: u16 },

    /// A response body could not be decoded.
    #[error("invalid response from Home Assistant: {0}")]
    InvalidResponse(String),
}

/// Failures reading or writing the schedule file.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read schedule file")]
    Read(#[source] std::io::Error),

    #[error("failed to write schedule file")]
    Write(#[source] std::io::Error),

    #[error("schedule file is corrupt")]
    Corrupt(#[source] serde_json::Error),
}
