//! Slot assignment over the approved backlog.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::store::{ScheduleError, ScheduleStore};
use super::types::{ScheduleEntry, SchedulePolicy, TimeSlot};
use crate::audit::{AuditEvent, AuditHandle};
use crate::item::{
    ContentItem, ItemError, ItemFailure, ItemStore, LifecycleError, ScheduledSlot, Transition,
};
use crate::metrics;

/// Outcome of one scheduler run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleReport {
    /// Entries attached to items during this run.
    pub assigned: Vec<ScheduleEntry>,
    /// Items another run scheduled first.
    pub skipped: Vec<String>,
    pub failed: Vec<ItemFailure>,
}

impl ScheduleReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Assigns approved, unscheduled items to free `(day, time_slot)` positions.
///
/// Safe to run concurrently from several processes: the schedule store
/// rejects a second entry per item or per position, and a lost position is
/// retried at the next free one.
pub struct Scheduler {
    items: Arc<dyn ItemStore>,
    entries: Arc<dyn ScheduleStore>,
    policy: SchedulePolicy,
    start_date: Option<NaiveDate>,
    audit: Option<AuditHandle>,
}

impl Scheduler {
    pub fn new(
        items: Arc<dyn ItemStore>,
        entries: Arc<dyn ScheduleStore>,
        policy: SchedulePolicy,
    ) -> Self {
        Self {
            items,
            entries,
            policy,
            start_date: None,
            audit: None,
        }
    }

    /// Anchor to use when none has been persisted yet.
    pub fn with_start_date(mut self, start_date: Option<NaiveDate>) -> Self {
        self.start_date = start_date;
        self
    }

    pub fn with_audit(mut self, audit: Option<AuditHandle>) -> Self {
        self.audit = audit;
        self
    }

    pub fn policy(&self) -> &SchedulePolicy {
        &self.policy
    }

    /// Schedule every eligible item.
    ///
    /// Per-item problems land in the report; only storage failures abort.
    pub fn run(&self, now: DateTime<Utc>) -> Result<ScheduleReport, ScheduleError> {
        let anchor = self
            .entries
            .ensure_anchor(self.start_date.unwrap_or_else(|| now.date_naive()))?;

        let snapshot = self.items.list_all().map_err(item_storage)?;
        let existing = self.entries.list_all()?;

        let mut occupied: HashSet<(u32, TimeSlot)> = existing
            .iter()
            .map(|entry| (entry.day, entry.time_slot))
            .collect();
        let mut owned: HashMap<String, ScheduleEntry> = existing
            .into_iter()
            .map(|entry| (entry.item_id.clone(), entry))
            .collect();

        let mut report = ScheduleReport::default();
        let mut cursor = 0usize;

        for item in snapshot.iter().filter(|item| item.is_schedulable()) {
            let entry = match owned.remove(&item.id) {
                Some(entry) => {
                    debug!(
                        "Re-attaching existing entry day {} {} to item {}",
                        entry.day, entry.time_slot, item.id
                    );
                    entry
                }
                None => match self.reserve(item, &mut occupied, &mut cursor, anchor, now)? {
                    Ok(entry) => entry,
                    Err(failure) => {
                        report.failed.push(failure);
                        continue;
                    }
                },
            };

            match self.items.apply(&item.id, &Transition::AssignSlot(entry.slot())) {
                Ok(_) => {
                    metrics::SLOTS_ASSIGNED.inc();
                    if let Some(ref audit) = self.audit {
                        audit.try_emit(AuditEvent::SlotAssigned {
                            item_id: item.id.clone(),
                            day: entry.day,
                            time_slot: entry.time_slot.to_string(),
                            due_at: entry.due_at(anchor),
                        });
                    }
                    report.assigned.push(entry);
                }
                Err(ItemError::Conflict {
                    source: LifecycleError::AlreadyScheduled { .. },
                    ..
                }) => {
                    debug!("Item {} was scheduled by a concurrent run", item.id);
                    report.skipped.push(item.id.clone());
                }
                Err(e) if e.is_fatal() => return Err(item_storage(e)),
                Err(e) => {
                    warn!("Could not assign slot to item {}: {}", item.id, e);
                    report.failed.push(ItemFailure::new(&item.id, e));
                }
            }
        }

        info!(
            "Scheduler run complete: {} assigned, {} skipped, {} failed",
            report.assigned.len(),
            report.skipped.len(),
            report.failed.len()
        );

        if let Some(ref audit) = self.audit {
            audit.try_emit(AuditEvent::ScheduleRunCompleted {
                assigned: report.assigned.len(),
                skipped: report.skipped.len(),
                failed: report.failed.len(),
            });
        }

        Ok(report)
    }

    /// Append an entry for `item` at the first free position not yet elapsed.
    ///
    /// The outer error is fatal; the inner one is a per-item failure.
    fn reserve(
        &self,
        item: &ContentItem,
        occupied: &mut HashSet<(u32, TimeSlot)>,
        cursor: &mut usize,
        anchor: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Result<ScheduleEntry, ItemFailure>, ScheduleError> {
        loop {
            let slot = self.next_free(occupied, cursor, anchor, now);
            match self.entries.append(&item.id, slot) {
                Ok(entry) => {
                    occupied.insert((entry.day, entry.time_slot));
                    return Ok(Ok(entry));
                }
                Err(ScheduleError::SlotTaken { day, time_slot }) => {
                    debug!("Slot day {} {} taken concurrently, moving on", day, time_slot);
                    occupied.insert((day, time_slot));
                }
                Err(ScheduleError::AlreadyScheduled(_)) => {
                    // A concurrent run reserved for this item first; use its entry.
                    return match self.entries.get_for_item(&item.id)? {
                        Some(entry) => Ok(Ok(entry)),
                        None => Ok(Err(ItemFailure::new(
                            &item.id,
                            "schedule entry vanished after conflict",
                        ))),
                    };
                }
                Err(e @ ScheduleError::Storage(_)) => return Err(e),
                Err(e) => return Ok(Err(ItemFailure::new(&item.id, e))),
            }
        }
    }

    /// Positions whose due time already passed are never handed out.
    fn next_free(
        &self,
        occupied: &HashSet<(u32, TimeSlot)>,
        cursor: &mut usize,
        anchor: NaiveDate,
        now: DateTime<Utc>,
    ) -> ScheduledSlot {
        loop {
            let slot = self.policy.position(*cursor);
            *cursor += 1;
            if slot.time_slot.due_at(anchor, slot.day) < now {
                continue;
            }
            if !occupied.contains(&(slot.day, slot.time_slot)) {
                return slot;
            }
        }
    }
}

fn item_storage(e: ItemError) -> ScheduleError {
    ScheduleError::Storage(e.to_string())
}
