//! REST client for the Home Assistant HTTP API.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use tadohub_app::ports::HomeAssistant;
use tadohub_domain::error::{HomeAssistantError, TadoHubError};
use tadohub_domain::snapshot::EntitySnapshot;
use tadohub_domain::sync::InstalledAutomation;

/// Connection settings for one Home Assistant instance.
#[derive(Debug, Clone)]
pub struct HassConfig {
    /// Base URL, e.g. `http://homeassistant:8123`.
    pub base_url: String,
    /// Long-lived access token sent as a bearer token on every request.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How many times a timed-out or refused request is retried before it
    /// surfaces as unreachable. Auth failures are never retried.
    pub max_retries: u32,
}

impl HassConfig {
    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url.trim_end_matches('/'))
    }

    /// The WebSocket endpoint derived from the base URL.
    #[must_use]
    pub fn websocket_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let ws = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{base}")
        };
        format!("{ws}/api/websocket")
    }
}

/// [`HomeAssistant`] implementation over the REST API.
pub struct HassClient {
    config: HassConfig,
    http: reqwest::Client,
}

impl HassClient {
    /// Build a client with the configured timeout baked in.
    ///
    /// # Errors
    ///
    /// Returns [`TadoHubError::HomeAssistant`] when the underlying HTTP
    /// client cannot be constructed.
    pub fn new(config: HassConfig) -> Result<Self, TadoHubError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| HomeAssistantError::Unreachable(err.to_string()))?;
        Ok(Self { config, http })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(self.config.api_url(path))
            .bearer_auth(&self.config.token)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(self.config.api_url(path))
            .bearer_auth(&self.config.token)
    }

    fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .delete(self.config.api_url(path))
            .bearer_auth(&self.config.token)
    }

    /// Send a request, retrying timeouts and refused connections with a
    /// doubling delay. 401/403 responses short-circuit to `Unauthorized`.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, TadoHubError> {
        let mut delay = Duration::from_millis(250);
        let mut attempt = 0u32;
        loop {
            let cloned = request.try_clone().ok_or_else(|| {
                HomeAssistantError::InvalidResponse("request body is not clonable".to_string())
            })?;
            match cloned.send().await {
                Ok(response) => {
                    if matches!(
                        response.status(),
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
                    ) {
                        return Err(HomeAssistantError::Unauthorized.into());
                    }
                    return Ok(response);
                }
                Err(err)
                    if (err.is_timeout() || err.is_connect())
                        && attempt < self.config.max_retries =>
                {
                    attempt += 1;
                    tracing::debug!(attempt, error = %err, "request failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(err) => {
                    return Err(HomeAssistantError::Unreachable(err.to_string()).into());
                }
            }
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TadoHubError> {
        response
            .json()
            .await
            .map_err(|err| HomeAssistantError::InvalidResponse(err.to_string()).into())
    }

    /// Fetch one automation's stored config, or `None` when it no longer
    /// exists. The config id Home Assistant embeds in the body is dropped
    /// so stored configs compare equal to freshly rendered ones.
    async fn fetch_automation_config(
        &self,
        config_id: &str,
    ) -> Result<Option<serde_json::Value>, TadoHubError> {
        let response = self
            .send(self.get(&format!("config/automation/config/{config_id}")))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(HomeAssistantError::InvalidResponse(format!(
                "automation config fetch returned {}",
                response.status()
            ))
            .into());
        }
        let mut config: serde_json::Value = Self::decode(response).await?;
        if let Some(object) = config.as_object_mut() {
            object.remove("id");
        }
        Ok(Some(config))
    }
}

impl HomeAssistant for HassClient {
    async fn get_states(&self) -> Result<Vec<EntitySnapshot>, TadoHubError> {
        let response = self.send(self.get("states")).await?;
        if !response.status().is_success() {
            return Err(HomeAssistantError::InvalidResponse(format!(
                "state listing returned {}",
                response.status()
            ))
            .into());
        }
        Self::decode(response).await
    }

    async fn get_state(&self, entity_id: &str) -> Result<EntitySnapshot, TadoHubError> {
        let response = self.send(self.get(&format!("states/{entity_id}"))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(HomeAssistantError::EntityNotFound(entity_id.to_string()).into());
        }
        if !response.status().is_success() {
            return Err(HomeAssistantError::InvalidResponse(format!(
                "state fetch returned {}",
                response.status()
            ))
            .into());
        }
        Self::decode(response).await
    }

    #[tracing::instrument(skip(self, data))]
    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: serde_json::Value,
    ) -> Result<(), TadoHubError> {
        let response = self
            .send(self.post(&format!("services/{domain}/{service}")).json(&data))
            .await?;
        if !response.status().is_success() {
            return Err(HomeAssistantError::ServiceCallFailed {
                service: format!("{domain}.{service}"),
                status: response.status().as_u16(),
            }
            .into());
        }
        Ok(())
    }

    async fn list_automations(
        &self,
        prefix: &str,
    ) -> Result<Vec<InstalledAutomation>, TadoHubError> {
        let mut installed = Vec::new();
        for snapshot in self.get_states().await? {
            if !snapshot.entity_id.starts_with("automation.") {
                continue;
            }
            let Some(name) = snapshot.string_attr("friendly_name") else {
                continue;
            };
            if !name.starts_with(prefix) {
                continue;
            }
            // UI- and config-API-managed automations carry their config id
            // as an attribute; YAML-only ones do not and cannot be edited.
            let Some(config_id) = snapshot.string_attr("id") else {
                tracing::warn!(entity = %snapshot.entity_id, "automation has no config id, skipping");
                continue;
            };
            if let Some(config) = self.fetch_automation_config(config_id).await? {
                installed.push(InstalledAutomation {
                    name: name.to_string(),
                    config,
                });
            }
        }
        Ok(installed)
    }

    #[tracing::instrument(skip(self, config))]
    async fn upsert_automation(
        &self,
        config_id: &str,
        config: serde_json::Value,
    ) -> Result<(), TadoHubError> {
        let response = self
            .send(
                self.post(&format!("config/automation/config/{config_id}"))
                    .json(&config),
            )
            .await?;
        if !response.status().is_success() {
            return Err(HomeAssistantError::ServiceCallFailed {
                service: "config.automation_upsert".to_string(),
                status: response.status().as_u16(),
            }
            .into());
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_automation(&self, config_id: &str) -> Result<(), TadoHubError> {
        let response = self
            .send(self.delete(&format!("config/automation/config/{config_id}")))
            .await?;
        // Already gone is as good as deleted.
        if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }
        Err(HomeAssistantError::ServiceCallFailed {
            service: "config.automation_delete".to_string(),
            status: response.status().as_u16(),
        }
        .into())
    }

    async fn reload_automations(&self) -> Result<(), TadoHubError> {
        self.call_service("automation", "reload", serde_json::json!({}))
            .await
    }
}
