//! Scheduler configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{SchedulePolicy, TimeSlot};

/// `[schedule]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Positions per calendar day.
    #[serde(default = "default_items_per_day")]
    pub items_per_day: u32,

    /// Daypart rotation.
    #[serde(default = "default_slots")]
    pub slots: Vec<TimeSlot>,

    /// Date of schedule day 1 ("YYYY-MM-DD"). When unset, the first run's
    /// UTC date is used and persisted.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

fn default_items_per_day() -> u32 {
    2
}

fn default_slots() -> Vec<TimeSlot> {
    TimeSlot::DEFAULT_CYCLE.to_vec()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            items_per_day: default_items_per_day(),
            slots: default_slots(),
            start_date: None,
        }
    }
}

impl ScheduleConfig {
    pub fn policy(&self) -> SchedulePolicy {
        SchedulePolicy::new(self.items_per_day, self.slots.clone())
    }
}
