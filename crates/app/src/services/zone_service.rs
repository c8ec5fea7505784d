//! Zone service — the in-memory zone cache and climate commands.
//!
//! The cache is rebuilt from Home Assistant on refresh and kept current by
//! the state-changed listener feeding [`ZoneService::apply_snapshot`]. It
//! is the only state the background task mutates.

use std::collections::HashMap;

use tokio::sync::RwLock;

use tadohub_domain::error::{NotFoundError, TadoHubError};
use tadohub_domain::event::{Event, EventType};
use tadohub_domain::snapshot::EntitySnapshot;
use tadohub_domain::zone::{HvacMode, Presence, Zone, ZoneId};

use crate::ports::{EventPublisher, HomeAssistant};

/// Away preset applied to every zone when the household leaves.
#[derive(Debug, Clone, Copy)]
pub struct AwaySettings {
    /// Target temperature while away, in °C.
    pub temperature: f64,
    pub mode: HvacMode,
}

impl Default for AwaySettings {
    fn default() -> Self {
        Self {
            temperature: 16.0,
            mode: HvacMode::Auto,
        }
    }
}

/// Application service owning the in-memory zone cache.
pub struct ZoneService<H, EP> {
    hass: H,
    publisher: EP,
    auto_discover: bool,
    away: AwaySettings,
    cache: RwLock<HashMap<ZoneId, Zone>>,
}

impl<H: HomeAssistant, EP: EventPublisher> ZoneService<H, EP> {
    /// Create a new service with an empty cache.
    pub fn new(hass: H, publisher: EP, auto_discover: bool, away: AwaySettings) -> Self {
        Self {
            hass,
            publisher,
            auto_discover,
            away,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Whether a snapshot belongs to an entity we treat as a zone.
    ///
    /// With auto-discovery every climate entity qualifies; without it only
    /// Tado-named climate entities are picked up.
    fn is_zone_entity(&self, snapshot: &EntitySnapshot) -> bool {
        snapshot.is_climate() && (self.auto_discover || snapshot.object_id().starts_with("tado"))
    }

    /// Rebuild the cache from a full state listing.
    ///
    /// Malformed snapshots are logged and skipped, never fatal.
    ///
    /// # Errors
    ///
    /// Propagates Home Assistant failures from the state listing itself.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_zones(&self) -> Result<Vec<Zone>, TadoHubError> {
        let snapshots = self.hass.get_states().await?;
        let mut zones = HashMap::new();
        for snapshot in snapshots
            .iter()
            .filter(|snapshot| self.is_zone_entity(snapshot))
        {
            match Zone::from_snapshot(snapshot) {
                Ok(zone) => {
                    zones.insert(zone.id.clone(), zone);
                }
                Err(err) => {
                    tracing::warn!(entity_id = %snapshot.entity_id, %err, "skipping malformed zone snapshot");
                }
            }
        }

        let listing = sorted(zones.values().cloned());
        *self.cache.write().await = zones;
        tracing::debug!(count = listing.len(), "zone cache refreshed");
        Ok(listing)
    }

    /// All known zones, ordered by id.
    pub async fn list_zones(&self) -> Vec<Zone> {
        sorted(self.cache.read().await.values().cloned())
    }

    /// Look up one zone.
    ///
    /// # Errors
    ///
    /// Returns [`TadoHubError::NotFound`] when the zone is unknown.
    pub async fn get_zone(&self, id: &ZoneId) -> Result<Zone, TadoHubError> {
        self.cache.read().await.get(id).cloned().ok_or_else(|| {
            NotFoundError {
                entity: "Zone",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Set a zone's target temperature, fire-and-confirm.
    ///
    /// # Errors
    ///
    /// Returns [`TadoHubError::Validation`] when the value is outside the
    /// zone's safe range, [`TadoHubError::NotFound`] for unknown zones, or
    /// the Home Assistant failure from the service call.
    #[tracing::instrument(skip(self))]
    pub async fn set_temperature(&self, id: &ZoneId, target: f64) -> Result<Zone, TadoHubError> {
        let mut zone = self.get_zone(id).await?;
        zone.validate_target(target)?;

        self.hass
            .call_service(
                "climate",
                "set_temperature",
                serde_json::json!({
                    "entity_id": zone.entity_id,
                    "temperature": target,
                }),
            )
            .await?;

        zone.target_temperature = target;
        self.store_and_announce(zone.clone()).await?;
        Ok(zone)
    }

    /// Set a zone's operating mode, fire-and-confirm.
    ///
    /// # Errors
    ///
    /// Returns [`TadoHubError::NotFound`] for unknown zones or the Home
    /// Assistant failure from the service call.
    #[tracing::instrument(skip(self))]
    pub async fn set_mode(&self, id: &ZoneId, mode: HvacMode) -> Result<Zone, TadoHubError> {
        let mut zone = self.get_zone(id).await?;

        self.hass
            .call_service(
                "climate",
                "set_hvac_mode",
                serde_json::json!({
                    "entity_id": zone.entity_id,
                    "hvac_mode": mode.as_str(),
                }),
            )
            .await?;

        zone.mode = mode;
        self.store_and_announce(zone.clone()).await?;
        Ok(zone)
    }

    /// Apply the away preset to every known zone, or bring them home.
    ///
    /// Away sets the configured away mode and temperature; home restores
    /// `auto` so the installed schedule automations reassert targets.
    ///
    /// # Errors
    ///
    /// Propagates the first Home Assistant failure; already-applied zones
    /// keep their new state, so a retry converges.
    #[tracing::instrument(skip(self))]
    pub async fn set_presence(&self, presence: Presence) -> Result<Vec<Zone>, TadoHubError> {
        let ids: Vec<ZoneId> = self.cache.read().await.keys().cloned().collect();
        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            let zone = match presence {
                Presence::Away => {
                    self.set_mode(&id, self.away.mode).await?;
                    self.set_temperature(&id, self.away.temperature).await?
                }
                Presence::Home => self.set_mode(&id, HvacMode::Auto).await?,
            };
            updated.push(zone);
        }
        Ok(sorted(updated))
    }

    /// Feed one state-changed snapshot from the background listener.
    ///
    /// Non-zone entities are ignored. A zone whose snapshot turned
    /// malformed is dropped from the cache (and announced), matching the
    /// skip-not-crash rule for listings.
    pub async fn apply_snapshot(&self, snapshot: &EntitySnapshot) {
        if !self.is_zone_entity(snapshot) {
            return;
        }
        match Zone::from_snapshot(snapshot) {
            Ok(zone) => {
                if let Err(err) = self.store_and_announce(zone).await {
                    tracing::warn!(%err, "failed to publish zone update");
                }
            }
            Err(err) => {
                tracing::warn!(entity_id = %snapshot.entity_id, %err, "zone snapshot became malformed");
                if let Ok(id) = ZoneId::from_entity_id(&snapshot.entity_id)
                    && self.cache.write().await.remove(&id).is_some()
                {
                    let event = Event::new(EventType::ZoneRemoved, Some(id), serde_json::json!({}));
                    if let Err(err) = self.publisher.publish(event).await {
                        tracing::warn!(%err, "failed to publish zone removal");
                    }
                }
            }
        }
    }

    async fn store_and_announce(&self, zone: Zone) -> Result<(), TadoHubError> {
        let event = Event::new(
            EventType::ZoneUpdated,
            Some(zone.id.clone()),
            serde_json::to_value(&zone).unwrap_or_default(),
        );
        self.cache.write().await.insert(zone.id.clone(), zone);
        self.publisher.publish(event).await
    }
}

fn sorted(zones: impl IntoIterator<Item = Zone>) -> Vec<Zone> {
    let mut zones: Vec<Zone> = zones.into_iter().collect();
    zones.sort_by(|a, b| a.id.cmp(&b.id));
    zones
}
