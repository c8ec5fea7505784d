//! Schedules — user-defined time-based target-temperature rules per zone.
//!
//! The schedule store owns the canonical entry data; installed automations
//! are a derived projection of it. The one invariant enforced here is that
//! no two entries of a zone may have intersecting `[start,end)` ranges on a
//! shared day.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{NotFoundError, OverlappingEntry, TadoHubError, ValidationError};
use crate::id::EntryId;
use crate::time::{TimeOfDay, Weekday};
use crate::zone::ZoneId;

/// One time-range rule: on the given days, hold `target` from `start`
/// until `end`.
///
/// The `slot` is assigned when the entry first enters a schedule and is
/// never renumbered; it keeps the derived automation name stable across
/// edits to sibling entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: EntryId,
    pub slot: u32,
    pub days: BTreeSet<Weekday>,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    /// Target temperature in °C.
    pub target: f64,
}

impl ScheduleEntry {
    /// Create a builder for constructing a [`ScheduleEntry`].
    #[must_use]
    pub fn builder() -> ScheduleEntryBuilder {
        ScheduleEntryBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TadoHubError::Validation`] when:
    /// - `days` is empty ([`ValidationError::EmptyDaySet`])
    /// - `start` is not strictly before `end` ([`ValidationError::StartNotBeforeEnd`])
    pub fn validate(&self) -> Result<(), TadoHubError> {
        if self.days.is_empty() {
            return Err(ValidationError::EmptyDaySet.into());
        }
        if self.start >= self.end {
            return Err(ValidationError::StartNotBeforeEnd.into());
        }
        Ok(())
    }

    /// Whether this entry intersects `other` on any shared day.
    ///
    /// Ranges are half-open, so an entry ending at 08:00 does not clash
    /// with one starting at 08:00.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let shares_day = self.days.iter().any(|day| other.days.contains(day));
        shares_day && self.start < other.end && other.start < self.end
    }
}

/// Step-by-step builder for [`ScheduleEntry`].
#[derive(Debug, Default)]
pub struct ScheduleEntryBuilder {
    id: Option<EntryId>,
    slot: Option<u32>,
    days: BTreeSet<Weekday>,
    start: Option<TimeOfDay>,
    end: Option<TimeOfDay>,
    target: Option<f64>,
}

impl ScheduleEntryBuilder {
    #[must_use]
    pub fn id(mut self, id: EntryId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn slot(mut self, slot: u32) -> Self {
        self.slot = Some(slot);
        self
    }

    #[must_use]
    pub fn day(mut self, day: Weekday) -> Self {
        self.days.insert(day);
        self
    }

    #[must_use]
    pub fn days(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        self.days.extend(days);
        self
    }

    #[must_use]
    pub fn start(mut self, start: TimeOfDay) -> Self {
        self.start = Some(start);
        self
    }

    #[must_use]
    pub fn end(mut self, end: TimeOfDay) -> Self {
        self.end = Some(end);
        self
    }

    #[must_use]
    pub fn target(mut self, target: f64) -> Self {
        self.target = Some(target);
        self
    }

    /// Consume the builder, validate, and return a [`ScheduleEntry`].
    ///
    /// # Errors
    ///
    /// Returns [`TadoHubError::Validation`] if required fields are missing
    /// or invariants fail.
    pub fn build(self) -> Result<ScheduleEntry, TadoHubError> {
        let entry = ScheduleEntry {
            id: self.id.unwrap_or_default(),
            slot: self.slot.unwrap_or(0),
            days: self.days,
            start: self.start.unwrap_or_default(),
            end: self.end.unwrap_or_default(),
            target: self.target.unwrap_or(0.0),
        };
        entry.validate()?;
        Ok(entry)
    }
}

/// Ordered collection of entries for one zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    /// Entries ordered by slot.
    #[must_use]
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn find(&self, id: EntryId) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    fn next_slot(&self) -> u32 {
        self.entries
            .iter()
            .map(|entry| entry.slot + 1)
            .max()
            .unwrap_or(0)
    }

    /// Insert a new entry or replace an existing one (matched by id),
    /// enforcing the no-overlap invariant against all other entries first.
    ///
    /// New entries get the next free slot; replaced entries keep theirs.
    ///
    /// # Errors
    ///
    /// Returns [`TadoHubError::Overlap`] naming the conflicting entry, or
    /// [`TadoHubError::Validation`] if the entry itself is invalid.
    pub fn upsert(&mut self, mut entry: ScheduleEntry) -> Result<ScheduleEntry, TadoHubError> {
        entry.validate()?;
        if let Some(conflicting) = self
            .entries
            .iter()
            .find(|existing| existing.id != entry.id && existing.overlaps(&entry))
        {
            return Err(OverlappingEntry {
                conflicting: conflicting.id,
            }
            .into());
        }

        if let Some(existing) = self.entries.iter_mut().find(|e| e.id == entry.id) {
            entry.slot = existing.slot;
            *existing = entry.clone();
        } else {
            entry.slot = self.next_slot();
            self.entries.push(entry.clone());
        }
        self.entries.sort_by_key(|e| e.slot);
        Ok(entry)
    }

    /// Remove an entry by id. Remaining slots are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TadoHubError::NotFound`] when the entry does not exist.
    pub fn remove(&mut self, id: EntryId) -> Result<ScheduleEntry, TadoHubError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(NotFoundError {
                entity: "ScheduleEntry",
                id: id.to_string(),
            })?;
        Ok(self.entries.remove(index))
    }
}

/// The persisted zone → schedule mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleBook {
    zones: BTreeMap<ZoneId, Schedule>,
}

impl ScheduleBook {
    #[must_use]
    pub fn zones(&self) -> &BTreeMap<ZoneId, Schedule> {
        &self.zones
    }

    #[must_use]
    pub fn schedule(&self, zone: &ZoneId) -> Option<&Schedule> {
        self.zones.get(zone)
    }

    /// Locate the zone an entry belongs to.
    #[must_use]
    pub fn zone_of(&self, id: EntryId) -> Option<&ZoneId> {
        self.zones
            .iter()
            .find(|(_, schedule)| schedule.find(id).is_some())
            .map(|(zone, _)| zone)
    }

    /// Insert or replace an entry in the named zone's schedule.
    ///
    /// # Errors
    ///
    /// Propagates overlap and validation failures from [`Schedule::upsert`].
    pub fn upsert_entry(
        &mut self,
        zone: ZoneId,
        entry: ScheduleEntry,
    ) -> Result<ScheduleEntry, TadoHubError> {
        self.zones.entry(zone).or_default().upsert(entry)
    }

    /// Remove an entry wherever it lives; empty schedules are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`TadoHubError::NotFound`] when no zone holds the entry.
    pub fn remove_entry(&mut self, id: EntryId) -> Result<(ZoneId, ScheduleEntry), TadoHubError> {
        let zone = self.zone_of(id).cloned().ok_or(NotFoundError {
            entity: "ScheduleEntry",
            id: id.to_string(),
        })?;
        let schedule = self.zones.entry(zone.clone()).or_default();
        let removed = schedule.remove(id)?;
        if schedule.is_empty() {
            self.zones.remove(&zone);
        }
        Ok((zone, removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TadoHubError;

    fn weekday_entry(start: &str, end: &str, target: f64) -> ScheduleEntry {
        ScheduleEntry::builder()
            .days([
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ])
            .start(start.parse().unwrap())
            .end(end.parse().unwrap())
            .target(target)
            .build()
            .unwrap()
    }

    fn zone(name: &str) -> ZoneId {
        name.parse().unwrap()
    }

    #[test]
    fn should_reject_entry_with_empty_day_set() {
        let result = ScheduleEntry::builder()
            .start("06:00".parse().unwrap())
            .end("08:00".parse().unwrap())
            .target(20.0)
            .build();
        assert!(matches!(
            result,
            Err(TadoHubError::Validation(ValidationError::EmptyDaySet))
        ));
    }

    #[test]
    fn should_reject_entry_with_start_not_before_end() {
        let result = ScheduleEntry::builder()
            .day(Weekday::Mon)
            .start("08:00".parse().unwrap())
            .end("08:00".parse().unwrap())
            .target(20.0)
            .build();
        assert!(matches!(
            result,
            Err(TadoHubError::Validation(ValidationError::StartNotBeforeEnd))
        ));
    }

    #[test]
    fn should_not_overlap_when_ranges_are_adjacent() {
        let a = weekday_entry("06:00", "08:00", 20.0);
        let b = weekday_entry("08:00", "22:00", 18.0);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn should_overlap_when_ranges_intersect_on_shared_day() {
        let a = weekday_entry("06:00", "09:00", 20.0);
        let b = weekday_entry("08:00", "22:00", 18.0);
        assert!(a.overlaps(&b));
    }

    #[test]
    fn should_not_overlap_when_day_sets_are_disjoint() {
        let a = weekday_entry("06:00", "09:00", 20.0);
        let b = ScheduleEntry::builder()
            .days([Weekday::Sat, Weekday::Sun])
            .start("06:00".parse().unwrap())
            .end("09:00".parse().unwrap())
            .target(21.0)
            .build()
            .unwrap();
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn should_assign_increasing_slots_on_insert() {
        let mut schedule = Schedule::default();
        let a = schedule.upsert(weekday_entry("06:00", "08:00", 20.0)).unwrap();
        let b = schedule.upsert(weekday_entry("08:00", "22:00", 18.0)).unwrap();
        assert_eq!(a.slot, 0);
        assert_eq!(b.slot, 1);
    }

    #[test]
    fn should_keep_slot_when_replacing_entry() {
        let mut schedule = Schedule::default();
        schedule.upsert(weekday_entry("06:00", "08:00", 20.0)).unwrap();
        let b = schedule.upsert(weekday_entry("08:00", "22:00", 18.0)).unwrap();

        let mut edited = b.clone();
        edited.target = 19.0;
        let saved = schedule.upsert(edited).unwrap();
        assert_eq!(saved.slot, 1);
        assert_eq!(schedule.entries().len(), 2);
    }

    #[test]
    fn should_not_reuse_slot_after_removal() {
        let mut schedule = Schedule::default();
        let a = schedule.upsert(weekday_entry("06:00", "08:00", 20.0)).unwrap();
        let b = schedule.upsert(weekday_entry("08:00", "22:00", 18.0)).unwrap();

        schedule.remove(a.id).unwrap();
        assert_eq!(schedule.entries()[0].slot, 1);

        let c = schedule.upsert(weekday_entry("06:00", "08:00", 21.0)).unwrap();
        assert_eq!(c.slot, 2);
        assert_ne!(c.slot, b.slot);
    }

    #[test]
    fn should_reject_overlapping_insert_naming_conflict() {
        let mut schedule = Schedule::default();
        let a = schedule.upsert(weekday_entry("06:00", "09:00", 20.0)).unwrap();

        let result = schedule.upsert(weekday_entry("08:00", "22:00", 18.0));
        match result {
            Err(TadoHubError::Overlap(err)) => assert_eq!(err.conflicting, a.id),
            other => panic!("expected overlap error, got {other:?}"),
        }
        assert_eq!(schedule.entries().len(), 1);
    }

    #[test]
    fn should_allow_replacing_entry_with_itself_shifted() {
        let mut schedule = Schedule::default();
        let a = schedule.upsert(weekday_entry("06:00", "09:00", 20.0)).unwrap();

        // Shifting an entry within its own old range must not conflict
        // with itself.
        let mut shifted = a.clone();
        shifted.start = "07:00".parse().unwrap();
        assert!(schedule.upsert(shifted).is_ok());
    }

    #[test]
    fn should_return_not_found_when_removing_unknown_entry() {
        let mut schedule = Schedule::default();
        let result = schedule.remove(EntryId::new());
        assert!(matches!(result, Err(TadoHubError::NotFound(_))));
    }

    #[test]
    fn should_locate_zone_of_entry_in_book() {
        let mut book = ScheduleBook::default();
        let entry = book
            .upsert_entry(zone("living_room"), weekday_entry("06:00", "08:00", 20.0))
            .unwrap();
        assert_eq!(book.zone_of(entry.id), Some(&zone("living_room")));
        assert_eq!(book.zone_of(EntryId::new()), None);
    }

    #[test]
    fn should_drop_empty_schedule_after_last_entry_removed() {
        let mut book = ScheduleBook::default();
        let entry = book
            .upsert_entry(zone("living_room"), weekday_entry("06:00", "08:00", 20.0))
            .unwrap();

        let (zone_id, removed) = book.remove_entry(entry.id).unwrap();
        assert_eq!(zone_id, zone("living_room"));
        assert_eq!(removed.id, entry.id);
        assert!(book.schedule(&zone("living_room")).is_none());
    }

    #[test]
    fn should_roundtrip_book_through_serde_json() {
        let mut book = ScheduleBook::default();
        book.upsert_entry(zone("living_room"), weekday_entry("06:00", "08:00", 20.0))
            .unwrap();
        book.upsert_entry(zone("kitchen"), weekday_entry("07:00", "09:00", 19.0))
            .unwrap();

        let json = serde_json::to_string(&book).unwrap();
        let parsed: ScheduleBook = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.zones().len(), 2);
        assert_eq!(
            parsed.schedule(&zone("living_room")).unwrap().entries().len(),
            1
        );
    }
}
