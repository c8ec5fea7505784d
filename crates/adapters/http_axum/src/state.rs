//! Shared application state for axum handlers.

use std::sync::Arc;

use tadohub_app::event_bus::InProcessEventBus;
use tadohub_app::ports::{EventPublisher, HomeAssistant, ScheduleRepository};
use tadohub_app::services::schedule_service::ScheduleService;
use tadohub_app::services::sync_service::SyncService;
use tadohub_app::services::zone_service::ZoneService;

/// Application state shared across all axum handlers.
///
/// Generic over the Home Assistant gateway, schedule repository, and event
/// publisher to avoid dynamic dispatch. `Clone` is implemented manually so
/// the underlying types themselves do not need to be `Clone` — only the
/// `Arc` wrappers are cloned.
pub struct AppState<H, R, EP> {
    /// Zone cache and climate commands.
    pub zone_service: Arc<ZoneService<H, EP>>,
    /// Schedule CRUD over the persisted book.
    pub schedule_service: Arc<ScheduleService<R, EP>>,
    /// Automation reconciliation.
    pub sync_service: Arc<SyncService<H>>,
    /// Broadcast bus backing the SSE stream.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<H, R, EP> Clone for AppState<H, R, EP> {
    fn clone(&self) -> Self {
        Self {
            zone_service: Arc::clone(&self.zone_service),
            schedule_service: Arc::clone(&self.schedule_service),
            sync_service: Arc::clone(&self.sync_service),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<H, R, EP> AppState<H, R, EP>
where
    H: HomeAssistant + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    /// Create a new application state from service instances.
    pub fn new(
        zone_service: ZoneService<H, EP>,
        schedule_service: ScheduleService<R, EP>,
        sync_service: SyncService<H>,
        event_bus: Arc<InProcessEventBus>,
    ) -> Self {
        Self {
            zone_service: Arc::new(zone_service),
            schedule_service: Arc::new(schedule_service),
            sync_service: Arc::new(sync_service),
            event_bus,
        }
    }

    /// Create a new application state from pre-wrapped `Arc` services.
    ///
    /// Use this when services need to be shared with background tasks
    /// before constructing the HTTP state.
    pub fn from_arcs(
        zone_service: Arc<ZoneService<H, EP>>,
        schedule_service: Arc<ScheduleService<R, EP>>,
        sync_service: Arc<SyncService<H>>,
        event_bus: Arc<InProcessEventBus>,
    ) -> Self {
        Self {
            zone_service,
            schedule_service,
            sync_service,
            event_bus,
        }
    }
}
