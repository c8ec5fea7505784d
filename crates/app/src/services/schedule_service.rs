//! Schedule service — CRUD over the persisted schedule book.
//!
//! Mutations run load-modify-save under one async mutex so at most one
//! write is in flight; reads skip the lock entirely because the repository
//! replaces the file atomically.

use tokio::sync::Mutex;

use tadohub_domain::error::TadoHubError;
use tadohub_domain::event::{Event, EventType};
use tadohub_domain::id::EntryId;
use tadohub_domain::schedule::{Schedule, ScheduleBook, ScheduleEntry};
use tadohub_domain::zone::ZoneId;

use crate::ports::{EventPublisher, ScheduleRepository};

/// Application service for schedule CRUD operations.
pub struct ScheduleService<R, EP> {
    repo: R,
    publisher: EP,
    write_lock: Mutex<()>,
}

impl<R: ScheduleRepository, EP: EventPublisher> ScheduleService<R, EP> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R, publisher: EP) -> Self {
        Self {
            repo,
            publisher,
            write_lock: Mutex::new(()),
        }
    }

    /// The full zone → schedule mapping.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list(&self) -> Result<ScheduleBook, TadoHubError> {
        self.repo.load().await
    }

    /// One zone's schedule; unknown zones yield an empty schedule.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn schedule_for(&self, zone: &ZoneId) -> Result<Schedule, TadoHubError> {
        Ok(self
            .list()
            .await?
            .schedule(zone)
            .cloned()
            .unwrap_or_default())
    }

    /// Insert or replace an entry, enforcing the no-overlap invariant.
    ///
    /// # Errors
    ///
    /// Returns [`TadoHubError::Overlap`] naming the conflicting entry,
    /// [`TadoHubError::Validation`] for an invalid entry, or a storage
    /// error. On any failure the persisted book is left unchanged.
    #[tracing::instrument(skip(self, entry), fields(zone = %zone))]
    pub async fn upsert_entry(
        &self,
        zone: ZoneId,
        entry: ScheduleEntry,
    ) -> Result<ScheduleEntry, TadoHubError> {
        let _guard = self.write_lock.lock().await;
        let mut book = self.repo.load().await?;
        let saved = book.upsert_entry(zone.clone(), entry)?;
        self.repo.save(&book).await?;
        self.announce(zone, &book).await;
        Ok(saved)
    }

    /// Remove an entry wherever it lives, returning its zone.
    ///
    /// # Errors
    ///
    /// Returns [`TadoHubError::NotFound`] when no zone holds the entry, or
    /// a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn remove_entry(
        &self,
        id: EntryId,
    ) -> Result<(ZoneId, ScheduleEntry), TadoHubError> {
        let _guard = self.write_lock.lock().await;
        let mut book = self.repo.load().await?;
        let (zone, removed) = book.remove_entry(id)?;
        self.repo.save(&book).await?;
        self.announce(zone.clone(), &book).await;
        Ok((zone, removed))
    }

    async fn announce(&self, zone: ZoneId, book: &ScheduleBook) {
        let entries = book.schedule(&zone).map_or(0, |s| s.entries().len());
        let event = Event::new(
            EventType::ScheduleChanged,
            Some(zone),
            serde_json::json!({ "entries": entries }),
        );
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(%err, "failed to publish schedule change");
        }
    }
}
