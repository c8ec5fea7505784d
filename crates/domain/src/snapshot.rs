//! Entity snapshot — the raw state payload Home Assistant reports for one
//! entity, as returned by `/api/states` and carried in `state_changed`
//! events.

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// One entity's state as reported by Home Assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Full entity id, e.g. `climate.tado_living_room`.
    pub entity_id: String,
    /// Raw state string, e.g. `heat`, `auto`, `off`, `unavailable`.
    pub state: String,
    /// Free-form attribute object.
    #[serde(default)]
    pub attributes: serde_json::Value,
    #[serde(default)]
    pub last_changed: Option<Timestamp>,
    #[serde(default)]
    pub last_updated: Option<Timestamp>,
}

impl EntitySnapshot {
    /// Whether this snapshot belongs to a climate entity.
    #[must_use]
    pub fn is_climate(&self) -> bool {
        self.entity_id.starts_with("climate.")
    }

    /// The part of the entity id after the domain, e.g. `tado_living_room`.
    #[must_use]
    pub fn object_id(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map_or(self.entity_id.as_str(), |(_, object)| object)
    }

    /// Fetch a numeric attribute.
    #[must_use]
    pub fn number_attr(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(serde_json::Value::as_f64)
    }

    /// Fetch a string attribute.
    #[must_use]
    pub fn string_attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(serde_json::Value::as_str)
    }
}
