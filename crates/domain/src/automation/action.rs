//! Action — the service call performed when a schedule automation fires.

use serde::{Deserialize, Serialize};

use crate::zone::HvacMode;

/// A climate service call against one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// `climate.set_temperature`
    SetTemperature {
        entity_id: String,
        temperature: f64,
    },
    /// `climate.set_hvac_mode`
    SetHvacMode { entity_id: String, mode: HvacMode },
}

impl Action {
    /// Render as a Home Assistant `action:` clause.
    #[must_use]
    pub fn to_config(&self) -> serde_json::Value {
        match self {
            Self::SetTemperature {
                entity_id,
                temperature,
            } => serde_json::json!({
                "service": "climate.set_temperature",
                "target": { "entity_id": entity_id },
                "data": { "temperature": temperature },
            }),
            Self::SetHvacMode { entity_id, mode } => serde_json::json!({
                "service": "climate.set_hvac_mode",
                "target": { "entity_id": entity_id },
                "data": { "hvac_mode": mode.as_str() },
            }),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetTemperature {
                entity_id,
                temperature,
            } => write!(f, "set_temperature({entity_id}, {temperature}°C)"),
            Self::SetHvacMode { entity_id, mode } => {
                write!(f, "set_hvac_mode({entity_id}, {mode})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_set_temperature_clause() {
        let action = Action::SetTemperature {
            entity_id: "climate.tado_living_room".to_string(),
            temperature: 20.0,
        };
        let config = action.to_config();
        assert_eq!(config["service"], "climate.set_temperature");
        assert_eq!(config["target"]["entity_id"], "climate.tado_living_room");
        assert_eq!(config["data"]["temperature"], 20.0);
    }

    #[test]
    fn should_render_set_hvac_mode_clause() {
        let action = Action::SetHvacMode {
            entity_id: "climate.tado_kitchen".to_string(),
            mode: HvacMode::Off,
        };
        let config = action.to_config();
        assert_eq!(config["service"], "climate.set_hvac_mode");
        assert_eq!(config["data"]["hvac_mode"], "off");
    }

    #[test]
    fn should_display_actions() {
        let action = Action::SetTemperature {
            entity_id: "climate.x".to_string(),
            temperature: 18.5,
        };
        assert_eq!(action.to_string(), "set_temperature(climate.x, 18.5°C)");
    }

    #[test]
    fn should_roundtrip_actions_through_serde_json() {
        let actions = vec![
            Action::SetTemperature {
                entity_id: "climate.x".to_string(),
                temperature: 18.5,
            },
            Action::SetHvacMode {
                entity_id: "climate.x".to_string(),
                mode: HvacMode::Auto,
            },
        ];
        for action in &actions {
            let json = serde_json::to_string(action).unwrap();
            let parsed: Action = serde_json::from_str(&json).unwrap();
            assert_eq!(&parsed, action);
        }
    }
}
