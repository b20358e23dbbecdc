//! Schedule storage trait.

use chrono::NaiveDate;
use thiserror::Error;

use super::types::{ScheduleEntry, TimeSlot};
use crate::item::ScheduledSlot;

/// Error type for schedule operations.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The item already owns an entry.
    #[error("item {0} already has a schedule entry")]
    AlreadyScheduled(String),

    /// Another entry occupies this position.
    #[error("slot day {day} {time_slot} is already taken")]
    SlotTaken { day: u32, time_slot: TimeSlot },

    #[error("no schedule entry for item {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Trait for schedule entry storage.
///
/// Entries are append-only apart from the `delivered` flag.
pub trait ScheduleStore: Send + Sync {
    /// Reserve `slot` for `item_id`.
    fn append(&self, item_id: &str, slot: ScheduledSlot) -> Result<ScheduleEntry, ScheduleError>;

    /// Entry owned by an item, if any.
    fn get_for_item(&self, item_id: &str) -> Result<Option<ScheduleEntry>, ScheduleError>;

    /// All entries ordered by day, then creation.
    fn list_all(&self) -> Result<Vec<ScheduleEntry>, ScheduleError>;

    /// Entries not yet delivered, ordered by day, then creation.
    fn list_undelivered(&self) -> Result<Vec<ScheduleEntry>, ScheduleError>;

    /// Flag an item's entry as delivered.
    fn mark_delivered(&self, item_id: &str) -> Result<(), ScheduleError>;

    /// The persisted anchor date, if one was fixed.
    fn anchor(&self) -> Result<Option<NaiveDate>, ScheduleError>;

    /// Persist `candidate` as the anchor unless one exists; returns the anchor
    /// in effect.
    fn ensure_anchor(&self, candidate: NaiveDate) -> Result<NaiveDate, ScheduleError>;
}
