//! Sync service — reconciles installed automations with a zone's schedule.
//!
//! Runs to completion inside the triggering request: the apply order
//! (creates and updates strictly before deletes) and the synchronous
//! partial-failure report both depend on it.

use tadohub_domain::automation::AutomationDescriptor;
use tadohub_domain::schedule::Schedule;
use tadohub_domain::sync::{FailedStep, SyncOperation, SyncOutcome, SyncPlan, SyncReport};
use tadohub_domain::zone::Zone;

use crate::ports::HomeAssistant;

/// Application service for the automation reconciliation pass.
pub struct SyncService<H> {
    hass: H,
    entity_prefix: String,
}

impl<H: HomeAssistant> SyncService<H> {
    /// Create a new service writing automations under `entity_prefix`.
    pub fn new(hass: H, entity_prefix: impl Into<String>) -> Self {
        Self {
            hass,
            entity_prefix: entity_prefix.into(),
        }
    }

    /// Make the installed automations for `zone` match `schedule`.
    ///
    /// Never touches the schedule store; automations are a derived,
    /// retryable projection, so every outcome (including failure) leaves
    /// re-invocation safe.
    #[tracing::instrument(skip(self, schedule), fields(zone = %zone.id))]
    pub async fn synchronize(&self, zone: &Zone, schedule: &Schedule) -> SyncReport {
        let outcome = self.run(zone, schedule).await;
        match &outcome {
            SyncOutcome::NoChangeNeeded => tracing::debug!("automations already converged"),
            SyncOutcome::Applied {
                created,
                updated,
                deleted,
            } => tracing::info!(
                created = created.len(),
                updated = updated.len(),
                deleted = deleted.len(),
                "automations synchronized"
            ),
            SyncOutcome::PartialFailure { succeeded, failed } => tracing::warn!(
                succeeded = succeeded.len(),
                failed = failed.len(),
                "synchronization stopped on failure"
            ),
            SyncOutcome::Aborted { detail } => {
                tracing::warn!(detail, "synchronization aborted");
            }
        }
        SyncReport {
            zone: zone.id.clone(),
            outcome,
        }
    }

    async fn run(&self, zone: &Zone, schedule: &Schedule) -> SyncOutcome {
        let zone_prefix = AutomationDescriptor::zone_prefix(&self.entity_prefix, &zone.id);
        let observed = match self.hass.list_automations(&zone_prefix).await {
            Ok(observed) => observed,
            Err(err) => {
                return SyncOutcome::Aborted {
                    detail: err.to_string(),
                };
            }
        };

        let desired: Vec<AutomationDescriptor> = schedule
            .entries()
            .iter()
            .map(|entry| AutomationDescriptor::for_entry(&self.entity_prefix, zone, entry))
            .collect();

        let plan = SyncPlan::diff(&observed, &desired);
        if plan.is_empty() {
            return SyncOutcome::NoChangeNeeded;
        }

        let mut succeeded: Vec<String> = Vec::new();
        let mut created: Vec<String> = Vec::new();
        let mut updated: Vec<String> = Vec::new();
        let mut deleted: Vec<String> = Vec::new();

        // Creates and updates first, deletes last: an interrupted run may
        // leave extra automations behind but never fewer than before.
        let steps = plan
            .creates
            .iter()
            .map(|d| (SyncOperation::Create, d.name.clone(), Some(d.to_config())))
            .chain(
                plan.updates
                    .iter()
                    .map(|d| (SyncOperation::Update, d.name.clone(), Some(d.to_config()))),
            )
            .chain(
                plan.deletes
                    .iter()
                    .map(|name| (SyncOperation::Delete, name.clone(), None)),
            );

        for (operation, name, config) in steps {
            let result = match config {
                Some(config) => self.hass.upsert_automation(&name, config).await,
                None => self.hass.delete_automation(&name).await,
            };
            match result {
                Ok(()) => {
                    match operation {
                        SyncOperation::Create => created.push(name.clone()),
                        SyncOperation::Update => updated.push(name.clone()),
                        SyncOperation::Delete => deleted.push(name.clone()),
                    }
                    succeeded.push(name);
                }
                Err(err) => {
                    // Abort the remaining steps; the diff makes a retry
                    // converge instead of duplicate.
                    return SyncOutcome::PartialFailure {
                        succeeded,
                        failed: vec![FailedStep {
                            name,
                            operation,
                            detail: err.to_string(),
                        }],
                    };
                }
            }
        }

        if let Err(err) = self.hass.reload_automations().await {
            tracing::warn!(%err, "automation reload failed after sync");
        }

        SyncOutcome::Applied {
            created,
            updated,
            deleted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::future::Future;
    use std::sync::Mutex;
    use tadohub_domain::error::{HomeAssistantError, TadoHubError};
    use tadohub_domain::schedule::ScheduleEntry;
    use tadohub_domain::snapshot::EntitySnapshot;
    use tadohub_domain::sync::InstalledAutomation;
    use tadohub_domain::time::Weekday;

    /// Fake Home Assistant holding an automation table.
    #[derive(Default)]
    struct FakeHass {
        automations: Mutex<BTreeMap<String, serde_json::Value>>,
        api_calls: Mutex<usize>,
        fail_on: Option<String>,
        fail_listing: bool,
    }

    impl FakeHass {
        fn with_installed(descriptors: &[AutomationDescriptor]) -> Self {
            let fake = Self::default();
            {
                let mut table = fake.automations.lock().unwrap();
                for descriptor in descriptors {
                    table.insert(descriptor.name.clone(), descriptor.to_config());
                }
            }
            fake
        }

        fn installed_names(&self) -> Vec<String> {
            self.automations.lock().unwrap().keys().cloned().collect()
        }
    }

    impl HomeAssistant for FakeHass {
        fn get_states(
            &self,
        ) -> impl Future<Output = Result<Vec<EntitySnapshot>, TadoHubError>> + Send {
            async { Ok(vec![]) }
        }

        fn get_state(
            &self,
            entity_id: &str,
        ) -> impl Future<Output = Result<EntitySnapshot, TadoHubError>> + Send {
            let entity_id = entity_id.to_string();
            async move { Err(HomeAssistantError::EntityNotFound(entity_id).into()) }
        }

        fn call_service(
            &self,
            _domain: &str,
            _service: &str,
            _data: serde_json::Value,
        ) -> impl Future<Output = Result<(), TadoHubError>> + Send {
            async { Ok(()) }
        }

        fn list_automations(
            &self,
            prefix: &str,
        ) -> impl Future<Output = Result<Vec<InstalledAutomation>, TadoHubError>> + Send {
            *self.api_calls.lock().unwrap() += 1;
            let result = if self.fail_listing {
                Err(HomeAssistantError::Unreachable("connection refused".to_string()).into())
            } else {
                Ok(self
                    .automations
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|(name, _)| name.starts_with(prefix))
                    .map(|(name, config)| InstalledAutomation {
                        name: name.clone(),
                        config: config.clone(),
                    })
                    .collect())
            };
            async { result }
        }

        fn upsert_automation(
            &self,
            config_id: &str,
            config: serde_json::Value,
        ) -> impl Future<Output = Result<(), TadoHubError>> + Send {
            *self.api_calls.lock().unwrap() += 1;
            let result = if self.fail_on.as_deref() == Some(config_id) {
                Err(HomeAssistantError::ServiceCallFailed {
                    service: "config/automation".to_string(),
                    status: 500,
                }
                .into())
            } else {
                self.automations
                    .lock()
                    .unwrap()
                    .insert(config_id.to_string(), config);
                Ok(())
            };
            async { result }
        }

        fn delete_automation(
            &self,
            config_id: &str,
        ) -> impl Future<Output = Result<(), TadoHubError>> + Send {
            *self.api_calls.lock().unwrap() += 1;
            let result = if self.fail_on.as_deref() == Some(config_id) {
                Err(HomeAssistantError::ServiceCallFailed {
                    service: "config/automation".to_string(),
                    status: 500,
                }
                .into())
            } else {
                self.automations.lock().unwrap().remove(config_id);
                Ok(())
            };
            async { result }
        }

        fn reload_automations(&self) -> impl Future<Output = Result<(), TadoHubError>> + Send {
            async { Ok(()) }
        }
    }

    fn living_room() -> Zone {
        let snapshot = EntitySnapshot {
            entity_id: "climate.tado_living_room".to_string(),
            state: "auto".to_string(),
            attributes: serde_json::json!({"temperature": 20.0}),
            last_changed: None,
            last_updated: None,
        };
        Zone::from_snapshot(&snapshot).unwrap()
    }

    fn weekday_entry(start: &str, end: &str, target: f64) -> ScheduleEntry {
        ScheduleEntry::builder()
            .days([Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri])
            .start(start.parse().unwrap())
            .end(end.parse().unwrap())
            .target(target)
            .build()
            .unwrap()
    }

    fn two_entry_schedule() -> Schedule {
        let mut schedule = Schedule::default();
        schedule.upsert(weekday_entry("06:00", "08:00", 20.0)).unwrap();
        schedule.upsert(weekday_entry("08:00", "22:00", 18.0)).unwrap();
        schedule
    }

    #[tokio::test]
    async fn should_install_one_automation_per_entry() {
        let svc = SyncService::new(FakeHass::default(), "tado_local");
        let report = svc.synchronize(&living_room(), &two_entry_schedule()).await;

        match report.outcome {
            SyncOutcome::Applied { created, .. } => {
                assert_eq!(
                    created,
                    vec![
                        "tado_local_living_room_sched_0",
                        "tado_local_living_room_sched_1"
                    ]
                );
            }
            other => panic!("expected Applied, got {other:?}"),
        }
        assert_eq!(
            svc.hass.installed_names(),
            vec![
                "tado_local_living_room_sched_0",
                "tado_local_living_room_sched_1"
            ]
        );
    }

    #[tokio::test]
    async fn should_report_no_change_and_issue_no_writes_when_converged() {
        let zone = living_room();
        let schedule = two_entry_schedule();
        let desired: Vec<AutomationDescriptor> = schedule
            .entries()
            .iter()
            .map(|entry| AutomationDescriptor::for_entry("tado_local", &zone, entry))
            .collect();

        let svc = SyncService::new(FakeHass::with_installed(&desired), "tado_local");
        let report = svc.synchronize(&zone, &schedule).await;

        assert!(matches!(report.outcome, SyncOutcome::NoChangeNeeded));
        // Only the listing read, no writes.
        assert_eq!(*svc.hass.api_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn should_delete_only_the_removed_entry_automation() {
        let zone = living_room();
        let mut schedule = two_entry_schedule();
        let desired: Vec<AutomationDescriptor> = schedule
            .entries()
            .iter()
            .map(|entry| AutomationDescriptor::for_entry("tado_local", &zone, entry))
            .collect();

        let first = schedule.entries()[0].id;
        schedule.remove(first).unwrap();

        let svc = SyncService::new(FakeHass::with_installed(&desired), "tado_local");
        let report = svc.synchronize(&zone, &schedule).await;

        match report.outcome {
            SyncOutcome::Applied {
                created,
                updated,
                deleted,
            } => {
                assert!(created.is_empty());
                assert!(updated.is_empty());
                assert_eq!(deleted, vec!["tado_local_living_room_sched_0"]);
            }
            other => panic!("expected Applied, got {other:?}"),
        }
        assert_eq!(
            svc.hass.installed_names(),
            vec!["tado_local_living_room_sched_1"]
        );
    }

    #[tokio::test]
    async fn should_update_changed_entry_in_place() {
        let zone = living_room();
        let mut schedule = two_entry_schedule();
        let desired: Vec<AutomationDescriptor> = schedule
            .entries()
            .iter()
            .map(|entry| AutomationDescriptor::for_entry("tado_local", &zone, entry))
            .collect();

        let mut edited = schedule.entries()[1].clone();
        edited.target = 17.0;
        schedule.upsert(edited).unwrap();

        let svc = SyncService::new(FakeHass::with_installed(&desired), "tado_local");
        let report = svc.synchronize(&zone, &schedule).await;

        match report.outcome {
            SyncOutcome::Applied {
                created,
                updated,
                deleted,
            } => {
                assert!(created.is_empty());
                assert_eq!(updated, vec!["tado_local_living_room_sched_1"]);
                assert!(deleted.is_empty());
            }
            other => panic!("expected Applied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_abort_when_observed_set_unreadable() {
        let hass = FakeHass {
            fail_listing: true,
            ..FakeHass::default()
        };
        let svc = SyncService::new(hass, "tado_local");
        let report = svc.synchronize(&living_room(), &two_entry_schedule()).await;

        match report.outcome {
            SyncOutcome::Aborted { detail } => assert!(detail.contains("unreachable")),
            other => panic!("expected Aborted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_stop_on_first_failure_and_report_both_sides() {
        let hass = FakeHass {
            fail_on: Some("tado_local_living_room_sched_1".to_string()),
            ..FakeHass::default()
        };
        let svc = SyncService::new(hass, "tado_local");
        let report = svc.synchronize(&living_room(), &two_entry_schedule()).await;

        match report.outcome {
            SyncOutcome::PartialFailure { succeeded, failed } => {
                assert_eq!(succeeded, vec!["tado_local_living_room_sched_0"]);
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].name, "tado_local_living_room_sched_1");
                assert_eq!(failed[0].operation, SyncOperation::Create);
                assert!(failed[0].detail.contains("500"));
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_never_delete_before_creating() {
        // Orphan installed, new entry desired, and the delete is rigged to
        // fail: the create must land first, leaving extras rather than a
        // gap.
        let zone = living_room();
        let orphan = {
            let entry = weekday_entry("12:00", "13:00", 21.0);
            let mut schedule = Schedule::default();
            let entry = schedule.upsert(entry).unwrap();
            let mut orphan = AutomationDescriptor::for_entry("tado_local", &zone, &entry);
            orphan.name = "tado_local_living_room_sched_9".to_string();
            orphan
        };

        let hass = FakeHass::with_installed(std::slice::from_ref(&orphan));
        let hass = FakeHass {
            fail_on: Some(orphan.name.clone()),
            automations: hass.automations,
            ..FakeHass::default()
        };

        let mut schedule = Schedule::default();
        schedule.upsert(weekday_entry("06:00", "08:00", 20.0)).unwrap();

        let svc = SyncService::new(hass, "tado_local");
        let report = svc.synchronize(&zone, &schedule).await;

        match report.outcome {
            SyncOutcome::PartialFailure { succeeded, failed } => {
                assert_eq!(succeeded, vec!["tado_local_living_room_sched_0"]);
                assert_eq!(failed[0].operation, SyncOperation::Delete);
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
        // Both the new automation and the orphan are installed; never fewer.
        assert_eq!(svc.hass.installed_names().len(), 2);
    }

    #[tokio::test]
    async fn should_rerun_to_convergence_after_partial_failure() {
        let hass = FakeHass {
            fail_on: Some("tado_local_living_room_sched_1".to_string()),
            ..FakeHass::default()
        };
        let svc = SyncService::new(hass, "tado_local");
        let zone = living_room();
        let schedule = two_entry_schedule();

        let first = svc.synchronize(&zone, &schedule).await;
        assert!(matches!(first.outcome, SyncOutcome::PartialFailure { .. }));

        // The blocking failure clears; the retry only applies the missing
        // descriptor.
        let retry_hass = FakeHass {
            automations: Mutex::new(svc.hass.automations.lock().unwrap().clone()),
            ..FakeHass::default()
        };
        let retry_svc = SyncService::new(retry_hass, "tado_local");
        let second = retry_svc.synchronize(&zone, &schedule).await;

        match second.outcome {
            SyncOutcome::Applied { created, .. } => {
                assert_eq!(created, vec!["tado_local_living_room_sched_1"]);
            }
            other => panic!("expected Applied, got {other:?}"),
        }
        assert!(matches!(
            retry_svc.synchronize(&zone, &schedule).await.outcome,
            SyncOutcome::NoChangeNeeded
        ));
    }
}
