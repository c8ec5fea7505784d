//! Trigger — the time clause that fires a schedule automation.

use serde::{Deserialize, Serialize};

use crate::time::{TimeOfDay, Weekday};

/// One time-of-day trigger clause, scoped to a single weekday.
///
/// Home Assistant time triggers fire every day; the descriptor pairs the
/// trigger list with a weekday condition so the automation only acts on
/// the selected days. The day is kept on the clause as its trigger id to
/// make the rendered config deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTrigger {
    pub day: Weekday,
    pub at: TimeOfDay,
}

impl TimeTrigger {
    /// Render as a Home Assistant `trigger:` clause.
    #[must_use]
    pub fn to_config(&self) -> serde_json::Value {
        serde_json::json!({
            "platform": "time",
            "at": self.at.hhmmss(),
            "id": self.day.as_str(),
        })
    }
}

impl std::fmt::Display for TimeTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "time({} {})", self.day, self.at)
    }
}
