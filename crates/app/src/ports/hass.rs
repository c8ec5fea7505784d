//! Home Assistant gateway port — state reads, service calls, and
//! automation configuration.

use std::future::Future;

use tadohub_domain::error::TadoHubError;
use tadohub_domain::snapshot::EntitySnapshot;
use tadohub_domain::sync::InstalledAutomation;

/// Outbound gateway to a Home Assistant instance.
///
/// Every call carries the configured bearer token and a bounded timeout.
/// Implementations map 401/403 to `Unauthorized` and surface it without
/// retrying; timeouts map to `Unreachable` after a small bounded retry.
pub trait HomeAssistant {
    /// Fetch all entity states.
    fn get_states(&self)
    -> impl Future<Output = Result<Vec<EntitySnapshot>, TadoHubError>> + Send;

    /// Fetch one entity's state.
    fn get_state(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<EntitySnapshot, TadoHubError>> + Send;

    /// Invoke `{domain}.{service}` with a JSON payload.
    fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: serde_json::Value,
    ) -> impl Future<Output = Result<(), TadoHubError>> + Send;

    /// List installed automations whose reserved name starts with `prefix`,
    /// including their current config bodies.
    fn list_automations(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<InstalledAutomation>, TadoHubError>> + Send;

    /// Create or wholesale-replace the automation with the given config id.
    fn upsert_automation(
        &self,
        config_id: &str,
        config: serde_json::Value,
    ) -> impl Future<Output = Result<(), TadoHubError>> + Send;

    /// Delete the automation with the given config id.
    fn delete_automation(
        &self,
        config_id: &str,
    ) -> impl Future<Output = Result<(), TadoHubError>> + Send;

    /// Ask Home Assistant to reload automations from config.
    fn reload_automations(&self) -> impl Future<Output = Result<(), TadoHubError>> + Send;
}

impl<T: HomeAssistant + Send + Sync> HomeAssistant for std::sync::Arc<T> {
    fn get_states(
        &self,
    ) -> impl Future<Output = Result<Vec<EntitySnapshot>, TadoHubError>> + Send {
        (**self).get_states()
    }

    fn get_state(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<EntitySnapshot, TadoHubError>> + Send {
        (**self).get_state(entity_id)
    }

    fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: serde_json::Value,
    ) -> impl Future<Output = Result<(), TadoHubError>> + Send {
        (**self).call_service(domain, service, data)
    }

    fn list_automations(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<InstalledAutomation>, TadoHubError>> + Send {
        (**self).list_automations(prefix)
    }

    fn upsert_automation(
        &self,
        config_id: &str,
        config: serde_json::Value,
    ) -> impl Future<Output = Result<(), TadoHubError>> + Send {
        (**self).upsert_automation(config_id, config)
    }

    fn delete_automation(
        &self,
        config_id: &str,
    ) -> impl Future<Output = Result<(), TadoHubError>> + Send {
        (**self).delete_automation(config_id)
    }

    fn reload_automations(&self) -> impl Future<Output = Result<(), TadoHubError>> + Send {
        (**self).reload_automations()
    }
}
