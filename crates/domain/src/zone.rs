//! Zone — a heating area backed by one Home Assistant climate entity.
//!
//! Zones are rebuilt from entity snapshots on every refresh or state-changed
//! event; they carry no identity beyond their slug and are never persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MalformedSnapshot, ValidationError};
use crate::snapshot::EntitySnapshot;

/// Default safe temperature range, used when the entity does not report
/// its own `min_temp`/`max_temp` attributes.
pub const DEFAULT_MIN_TEMP: f64 = 5.0;
pub const DEFAULT_MAX_TEMP: f64 = 30.0;

/// Stable zone identifier derived from the climate entity id.
///
/// `climate.tado_living_room` becomes `living_room`: the domain prefix and
/// a leading `tado_` are stripped, anything but lowercase alphanumerics and
/// underscores is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    /// Derive the slug for an entity id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyZoneId`] when nothing remains after
    /// stripping.
    pub fn from_entity_id(entity_id: &str) -> Result<Self, ValidationError> {
        let object = entity_id.strip_prefix("climate.").unwrap_or(entity_id);
        let object = object.strip_prefix("tado_").unwrap_or(object);
        let slug: String = object
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        if slug.is_empty() {
            return Err(ValidationError::EmptyZoneId);
        }
        Ok(Self(slug))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ZoneId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_entity_id(s)
    }
}

/// Operating mode of a climate entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacMode {
    /// Follow the installed schedule.
    Auto,
    /// Hold the current target temperature.
    Heat,
    Off,
}

impl HvacMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Heat => "heat",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HvacMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "heat" => Ok(Self::Heat),
            "off" => Ok(Self::Off),
            other => Err(ValidationError::UnknownMode(other.to_string())),
        }
    }
}

/// Whole-home presence state driven by the away/home endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Away,
    Home,
}

/// In-memory view of one heating zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    /// Backing entity, e.g. `climate.tado_living_room`.
    pub entity_id: String,
    pub name: String,
    pub current_temperature: Option<f64>,
    pub target_temperature: f64,
    pub mode: HvacMode,
    pub away: bool,
    /// Safe setpoint range reported by the entity.
    pub min_temp: f64,
    pub max_temp: f64,
}

impl Zone {
    /// Pure transformation from a Home Assistant entity snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedSnapshot`] when the target temperature is absent
    /// or non-numeric, or the state is not a recognised mode. Callers skip
    /// such entities instead of failing the whole listing.
    pub fn from_snapshot(snapshot: &EntitySnapshot) -> Result<Self, MalformedSnapshot> {
        let malformed = |reason: &str| MalformedSnapshot {
            entity_id: snapshot.entity_id.clone(),
            reason: reason.to_string(),
        };

        let id = ZoneId::from_entity_id(&snapshot.entity_id)
            .map_err(|_| malformed("entity id yields an empty zone slug"))?;

        let mode = snapshot
            .state
            .parse::<HvacMode>()
            .map_err(|_| malformed(&format!("unrecognised mode {:?}", snapshot.state)))?;

        let target_temperature = snapshot
            .number_attr("temperature")
            .ok_or_else(|| malformed("missing or non-numeric temperature attribute"))?;

        let name = snapshot
            .string_attr("friendly_name")
            .map_or_else(|| id.as_str().to_string(), ToString::to_string);

        Ok(Self {
            id,
            entity_id: snapshot.entity_id.clone(),
            name,
            current_temperature: snapshot.number_attr("current_temperature"),
            target_temperature,
            mode,
            away: snapshot.string_attr("preset_mode") == Some("away"),
            min_temp: snapshot.number_attr("min_temp").unwrap_or(DEFAULT_MIN_TEMP),
            max_temp: snapshot.number_attr("max_temp").unwrap_or(DEFAULT_MAX_TEMP),
        })
    }

    /// Check a requested setpoint against this zone's safe range.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TemperatureOutOfRange`] when outside
    /// `min_temp..=max_temp`.
    pub fn validate_target(&self, value: f64) -> Result<(), ValidationError> {
        if value < self.min_temp || value > self.max_temp || !value.is_finite() {
            return Err(ValidationError::TemperatureOutOfRange {
                value,
                min: self.min_temp,
                max: self.max_temp,
            });
        }
        Ok(())
    }
}
