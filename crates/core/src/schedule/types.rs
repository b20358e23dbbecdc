//! Schedule data types.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::item::ScheduledSlot;

/// Recurring daypart an item can be delivered in.
///
/// Offsets are fixed; daylight saving time is not applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    /// 09:00 US Eastern (-05:00).
    UsMorning,
    /// 12:00 US Eastern (-05:00).
    UsLunch,
    /// 09:00 India Standard Time (+05:30).
    IndiaMorning,
    /// 18:00 India Standard Time (+05:30).
    IndiaEvening,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 4] = [
        TimeSlot::UsMorning,
        TimeSlot::UsLunch,
        TimeSlot::IndiaMorning,
        TimeSlot::IndiaEvening,
    ];

    /// Default rotation, alternating audiences.
    pub const DEFAULT_CYCLE: [TimeSlot; 4] = [
        TimeSlot::UsMorning,
        TimeSlot::IndiaEvening,
        TimeSlot::UsLunch,
        TimeSlot::IndiaMorning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::UsMorning => "us_morning",
            TimeSlot::UsLunch => "us_lunch",
            TimeSlot::IndiaMorning => "india_morning",
            TimeSlot::IndiaEvening => "india_evening",
        }
    }

    /// Local wall-clock time as minutes after midnight.
    fn local_minutes(&self) -> i64 {
        match self {
            TimeSlot::UsMorning => 9 * 60,
            TimeSlot::UsLunch => 12 * 60,
            TimeSlot::IndiaMorning => 9 * 60,
            TimeSlot::IndiaEvening => 18 * 60,
        }
    }

    /// Offset east of UTC, in minutes.
    fn utc_offset_minutes(&self) -> i64 {
        match self {
            TimeSlot::UsMorning | TimeSlot::UsLunch => -5 * 60,
            TimeSlot::IndiaMorning | TimeSlot::IndiaEvening => 5 * 60 + 30,
        }
    }

    /// Instant this slot falls on for a 1-based schedule day.
    pub fn due_at(&self, anchor: NaiveDate, day: u32) -> DateTime<Utc> {
        let date = anchor + Duration::days(i64::from(day.saturating_sub(1)));
        let local_midnight = date.and_time(NaiveTime::MIN);
        let utc = local_midnight
            + Duration::minutes(self.local_minutes() - self.utc_offset_minutes());
        Utc.from_utc_datetime(&utc)
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TimeSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeSlot::ALL
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| format!("unknown time slot: {}", s))
    }
}

/// A delivery reservation for one item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub item_id: String,
    /// 1-based day relative to the schedule anchor.
    pub day: u32,
    pub time_slot: TimeSlot,
    /// Set once the item was published successfully.
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
}

impl ScheduleEntry {
    pub fn slot(&self) -> ScheduledSlot {
        ScheduledSlot {
            day: self.day,
            time_slot: self.time_slot,
        }
    }

    pub fn due_at(&self, anchor: NaiveDate) -> DateTime<Utc> {
        self.time_slot.due_at(anchor, self.day)
    }

    pub fn is_due(&self, anchor: NaiveDate, now: DateTime<Utc>) -> bool {
        self.due_at(anchor) <= now
    }
}

/// How positions map onto days and dayparts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulePolicy {
    pub items_per_day: u32,
    pub slots: Vec<TimeSlot>,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            items_per_day: 2,
            slots: TimeSlot::DEFAULT_CYCLE.to_vec(),
        }
    }
}

impl SchedulePolicy {
    pub fn new(items_per_day: u32, slots: Vec<TimeSlot>) -> Self {
        Self {
            items_per_day,
            slots,
        }
    }

    /// Slot for the `index`-th position (0-based).
    ///
    /// Falls back to the default cycle if the policy has no slots, and to one
    /// item per day if `items_per_day` is zero.
    pub fn position(&self, index: usize) -> ScheduledSlot {
        let per_day = self.items_per_day.max(1) as usize;
        let slots: &[TimeSlot] = if self.slots.is_empty() {
            &TimeSlot::DEFAULT_CYCLE
        } else {
            &self.slots
        };
        ScheduledSlot {
            day: (index / per_day) as u32 + 1,
            time_slot: slots[index % slots.len()],
        }
    }
}
