//! Sync plan — the pure diff between installed and desired automations.
//!
//! The application layer reads the observed set, derives the desired set
//! from the schedule, asks [`SyncPlan::diff`] what to do, and applies the
//! steps in fail-safe order: creates and updates strictly before deletes,
//! so an interrupted run leaves the zone with at least as many controlling
//! automations as before, never fewer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::automation::AutomationDescriptor;
use crate::zone::ZoneId;

/// An automation currently installed in Home Assistant, identified by its
/// reserved name, with its current config body for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledAutomation {
    pub name: String,
    pub config: serde_json::Value,
}

/// The steps needed to make the installed set equal to the desired set.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    /// Desired descriptors with no installed counterpart.
    pub creates: Vec<AutomationDescriptor>,
    /// Desired descriptors whose installed config differs. Applied as a
    /// wholesale replace, since that is how Home Assistant stores them.
    pub updates: Vec<AutomationDescriptor>,
    /// Installed names with no desired counterpart.
    pub deletes: Vec<String>,
}

impl SyncPlan {
    /// Diff observed against desired by name.
    ///
    /// Creates and updates keep the desired order; deletes come out in
    /// name order. Re-running the diff on converged sets yields an empty
    /// plan, which is the idempotence fast path.
    #[must_use]
    pub fn diff(observed: &[InstalledAutomation], desired: &[AutomationDescriptor]) -> Self {
        let installed: BTreeMap<&str, &InstalledAutomation> = observed
            .iter()
            .map(|automation| (automation.name.as_str(), automation))
            .collect();

        let mut plan = Self::default();
        for descriptor in desired {
            match installed.get(descriptor.name.as_str()) {
                None => plan.creates.push(descriptor.clone()),
                Some(existing) if existing.config != descriptor.to_config() => {
                    plan.updates.push(descriptor.clone());
                }
                Some(_) => {}
            }
        }

        let wanted: std::collections::BTreeSet<&str> = desired
            .iter()
            .map(|descriptor| descriptor.name.as_str())
            .collect();
        plan.deletes = installed
            .keys()
            .filter(|name| !wanted.contains(*name))
            .map(ToString::to_string)
            .collect();

        plan
    }

    /// True when observed already equals desired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// Which apply step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
}

/// One descriptor that could not be applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedStep {
    pub name: String,
    pub operation: SyncOperation,
    /// Underlying failure, detailed enough to retry intelligently.
    pub detail: String,
}

/// Result of one synchronization pass for a zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Desired equals observed; zero API calls were made.
    NoChangeNeeded,
    /// Every step applied.
    Applied {
        created: Vec<String>,
        updated: Vec<String>,
        deleted: Vec<String>,
    },
    /// A step failed; the remaining steps were skipped.
    PartialFailure {
        succeeded: Vec<String>,
        failed: Vec<FailedStep>,
    },
    /// The observed set could not even be read.
    Aborted { detail: String },
}

impl SyncOutcome {
    /// Whether the installed set is known to match the schedule.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::NoChangeNeeded | Self::Applied { .. })
    }
}

/// Per-zone sync report returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub zone: ZoneId,
    #[serde(flatten)]
    pub outcome: SyncOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduleEntry;
    use crate::snapshot::EntitySnapshot;
    use crate::time::Weekday;
    use crate::zone::Zone;

    fn zone() -> Zone {
        let snapshot = EntitySnapshot {
            entity_id: "climate.tado_living_room".to_string(),
            state: "auto".to_string(),
            attributes: serde_json::json!({"temperature": 20.0}),
            last_changed: None,
            last_updated: None,
        };
        Zone::from_snapshot(&snapshot).unwrap()
    }

    fn descriptor(slot: u32, start: &str, target: f64) -> AutomationDescriptor {
        let entry = ScheduleEntry::builder()
            .slot(slot)
            .days([Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri])
            .start(start.parse().unwrap())
            .end("23:00".parse().unwrap())
            .target(target)
            .build()
            .unwrap();
        AutomationDescriptor::for_entry("tado_local", &zone(), &entry)
    }

    fn installed(descriptor: &AutomationDescriptor) -> InstalledAutomation {
        InstalledAutomation {
            name: descriptor.name.clone(),
            config: descriptor.to_config(),
        }
    }

    #[test]
    fn should_produce_empty_plan_when_sets_match() {
        let desired = vec![descriptor(0, "06:00", 20.0), descriptor(1, "08:00", 18.0)];
        let observed: Vec<_> = desired.iter().map(installed).collect();

        let plan = SyncPlan::diff(&observed, &desired);
        assert!(plan.is_empty());
    }

    #[test]
    fn should_create_missing_descriptors() {
        let desired = vec![descriptor(0, "06:00", 20.0), descriptor(1, "08:00", 18.0)];
        let observed = vec![installed(&desired[0])];

        let plan = SyncPlan::diff(&observed, &desired);
        assert_eq!(plan.creates.len(), 1);
        assert_eq!(plan.creates[0].name, "tado_local_living_room_sched_1");
        assert!(plan.updates.is_empty());
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn should_update_when_config_differs() {
        let old = descriptor(0, "06:00", 20.0);
        let new = descriptor(0, "06:00", 19.0);
        let observed = vec![installed(&old)];

        let plan = SyncPlan::diff(&observed, std::slice::from_ref(&new));
        assert!(plan.creates.is_empty());
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].name, new.name);
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn should_delete_orphaned_automations() {
        let keep = descriptor(1, "08:00", 18.0);
        let orphan = descriptor(0, "06:00", 20.0);
        let observed = vec![installed(&orphan), installed(&keep)];

        let plan = SyncPlan::diff(&observed, std::slice::from_ref(&keep));
        assert!(plan.creates.is_empty());
        assert!(plan.updates.is_empty());
        assert_eq!(plan.deletes, vec!["tado_local_living_room_sched_0"]);
    }

    #[test]
    fn should_combine_create_update_and_delete_in_one_plan() {
        let unchanged = descriptor(0, "06:00", 20.0);
        let changed_old = descriptor(1, "08:00", 18.0);
        let changed_new = descriptor(1, "08:00", 17.5);
        let brand_new = descriptor(2, "22:00", 16.0);
        let orphan = descriptor(9, "12:00", 21.0);

        let observed = vec![installed(&unchanged), installed(&changed_old), installed(&orphan)];
        let desired = vec![unchanged.clone(), changed_new.clone(), brand_new.clone()];

        let plan = SyncPlan::diff(&observed, &desired);
        assert_eq!(plan.creates.len(), 1);
        assert_eq!(plan.creates[0].name, brand_new.name);
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].name, changed_new.name);
        assert_eq!(plan.deletes, vec![orphan.name.clone()]);
    }

    #[test]
    fn should_report_converged_outcomes() {
        assert!(SyncOutcome::NoChangeNeeded.is_converged());
        assert!(
            SyncOutcome::Applied {
                created: vec![],
                updated: vec![],
                deleted: vec![]
            }
            .is_converged()
        );
        assert!(
            !SyncOutcome::Aborted {
                detail: "unreachable".to_string()
            }
            .is_converged()
        );
    }

    #[test]
    fn should_serialize_report_with_flattened_outcome() {
        let report = SyncReport {
            zone: "living_room".parse().unwrap(),
            outcome: SyncOutcome::NoChangeNeeded,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["zone"], "living_room");
        assert_eq!(json["outcome"], "no_change_needed");
    }
}
