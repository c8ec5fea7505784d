//! WebSocket listener for `state_changed` events.
//!
//! Keeps the zone cache warm between full refreshes. The connection is
//! re-established with a doubling backoff capped at one minute; a malformed
//! frame is logged and skipped, never fatal.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use tadohub_app::ports::{EventPublisher, HomeAssistant};
use tadohub_app::services::zone_service::ZoneService;
use tadohub_domain::error::{HomeAssistantError, TadoHubError};
use tadohub_domain::snapshot::EntitySnapshot;

use crate::client::HassConfig;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Background task feeding Home Assistant state changes into the zone cache.
pub struct StateChangedListener<H, EP> {
    ws_url: String,
    token: String,
    zones: Arc<ZoneService<H, EP>>,
}

impl<H, EP> StateChangedListener<H, EP>
where
    H: HomeAssistant + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    pub fn new(config: &HassConfig, zones: Arc<ZoneService<H, EP>>) -> Self {
        Self {
            ws_url: config.websocket_url(),
            token: config.token.clone(),
            zones,
        }
    }

    /// Run the listener until the task is aborted, reconnecting on every
    /// failure or clean close.
    pub async fn run(self) {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match self.connect_and_listen().await {
                Ok(()) => {
                    tracing::info!("event stream closed, reconnecting");
                    backoff = INITIAL_BACKOFF;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "event stream failed, reconnecting");
                }
            }
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    async fn connect_and_listen(&self) -> Result<(), TadoHubError> {
        let (mut ws, _) = connect_async(self.ws_url.as_str())
            .await
            .map_err(|err| HomeAssistantError::Unreachable(err.to_string()))?;

        while let Some(frame) = ws.next().await {
            let frame = frame.map_err(|err| HomeAssistantError::Unreachable(err.to_string()))?;
            let Message::Text(text) = frame else {
                continue;
            };
            let message: serde_json::Value = match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unparsable frame");
                    continue;
                }
            };

            match message.get("type").and_then(serde_json::Value::as_str) {
                Some("auth_required") => {
                    let auth = serde_json::json!({
                        "type": "auth",
                        "access_token": self.token,
                    });
                    send_json(&mut ws, &auth).await?;
                }
                Some("auth_ok") => {
                    tracing::info!("authenticated, subscribing to state changes");
                    send_json(&mut ws, &subscribe_message(1)).await?;
                }
                Some("auth_invalid") => {
                    return Err(HomeAssistantError::Unauthorized.into());
                }
                Some("event") => {
                    if let Some(snapshot) = state_changed_snapshot(&message) {
                        self.zones.apply_snapshot(&snapshot).await;
                    }
                }
                // result acks and pongs
                _ => {}
            }
        }
        Ok(())
    }
}

async fn send_json<S>(ws: &mut S, payload: &serde_json::Value) -> Result<(), TadoHubError>
where
    S: SinkExt<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    ws.send(Message::text(payload.to_string()))
        .await
        .map_err(|err| HomeAssistantError::Unreachable(err.to_string()).into())
}

fn subscribe_message(id: u64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "type": "subscribe_events",
        "event_type": "state_changed",
    })
}

/// Extract the new state carried by a `state_changed` event frame, if any.
/// Deletion events carry `new_state: null` and are ignored here; the next
/// full refresh drops the zone.
fn state_changed_snapshot(message: &serde_json::Value) -> Option<EntitySnapshot> {
    let new_state = message.get("event")?.get("data")?.get("new_state")?;
    if new_state.is_null() {
        return None;
    }
    match serde_json::from_value(new_state.clone()) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            tracing::warn!(error = %err, "skipping malformed state_changed payload");
            None
        }
    }
}
