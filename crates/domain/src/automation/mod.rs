//! Automation descriptors — the Home Assistant automation derived from one
//! schedule entry.
//!
//! Descriptors are never edited independently; they are recomputed from the
//! schedule on every synchronization pass. The derivation is deterministic:
//! an unchanged entry always renders to a byte-identical config, which is
//! what makes repeated sync runs converge instead of churn.

mod action;
mod trigger;

pub use action::Action;
pub use trigger::TimeTrigger;

use serde::{Deserialize, Serialize};

use crate::schedule::ScheduleEntry;
use crate::zone::{Zone, ZoneId};

/// Derived definition of one installed schedule automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationDescriptor {
    /// Reserved name, `{prefix}_{zone}_sched_{slot}`. Doubles as the
    /// automation config id on the Home Assistant side.
    pub name: String,
    /// One clause per selected day, all at the entry's start time.
    pub triggers: Vec<TimeTrigger>,
    pub action: Action,
}

impl AutomationDescriptor {
    /// Derive the descriptor for one schedule entry of a zone.
    ///
    /// The entry's end time plays no role here; the next entry's start
    /// naturally supersedes the target, and the end only matters for the
    /// store's overlap validation.
    #[must_use]
    pub fn for_entry(prefix: &str, zone: &Zone, entry: &ScheduleEntry) -> Self {
        Self {
            name: Self::name_for(prefix, &zone.id, entry.slot),
            triggers: entry
                .days
                .iter()
                .map(|day| TimeTrigger {
                    day: *day,
                    at: entry.start,
                })
                .collect(),
            action: Action::SetTemperature {
                entity_id: zone.entity_id.clone(),
                temperature: entry.target,
            },
        }
    }

    /// The reserved automation name for a zone slot.
    #[must_use]
    pub fn name_for(prefix: &str, zone: &ZoneId, slot: u32) -> String {
        format!("{prefix}_{zone}_sched_{slot}")
    }

    /// The reserved name prefix covering every slot of a zone.
    #[must_use]
    pub fn zone_prefix(prefix: &str, zone: &ZoneId) -> String {
        format!("{prefix}_{zone}_sched_")
    }

    /// Render the full Home Assistant automation config body.
    ///
    /// Day order follows the entry's ordered day set, so the output is
    /// stable across runs.
    #[must_use]
    pub fn to_config(&self) -> serde_json::Value {
        let weekdays: Vec<&str> = self
            .triggers
            .iter()
            .map(|trigger| trigger.day.as_str())
            .collect();
        serde_json::json!({
            "alias": self.name,
            "description": "Managed by tadohub; do not edit by hand.",
            "trigger": self
                .triggers
                .iter()
                .map(TimeTrigger::to_config)
                .collect::<Vec<_>>(),
            "condition": [{
                "condition": "time",
                "weekday": weekdays,
            }],
            "action": [self.action.to_config()],
            "mode": "single",
        })
    }
}
