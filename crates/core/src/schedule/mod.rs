//! Delivery schedule: recurring dayparts, entries, and the slot-assignment
//! scheduler.

mod config;
mod scheduler;
mod sqlite_store;
mod store;
mod types;

pub use config::ScheduleConfig;
pub use scheduler::{ScheduleReport, Scheduler};
pub use sqlite_store::SqliteScheduleStore;
pub use store::{ScheduleError, ScheduleStore};
pub use types::{ScheduleEntry, SchedulePolicy, TimeSlot};
