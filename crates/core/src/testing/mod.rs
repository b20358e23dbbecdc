//! Testing utilities and mock implementations.
//!
//! Mocks for the opaque collaborators (publisher, generator) plus fixtures
//! for building stores and items.
//!
//! # Example
//!
//! ```rust,ignore
//! use cadence_core::testing::{fixtures, MockPublisher};
//!
//! let items = fixtures::item_store();
//! let publisher = MockPublisher::new();
//! publisher.fail_next("rate limited").await;
//! ```

mod mock_generator;
mod mock_publisher;

pub use mock_generator::MockGenerator;
pub use mock_publisher::MockPublisher;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, NaiveDate, Utc};

    use crate::coordinator::GeneratedContent;
    use crate::item::{ContentItem, ItemStore, NewItem, SqliteItemStore, Transition};
    use crate::schedule::{SqliteScheduleStore, TimeSlot};

    /// In-memory item store.
    pub fn item_store() -> Arc<SqliteItemStore> {
        Arc::new(SqliteItemStore::in_memory().expect("in-memory item store"))
    }

    /// In-memory schedule store.
    pub fn schedule_store() -> Arc<SqliteScheduleStore> {
        Arc::new(SqliteScheduleStore::in_memory().expect("in-memory schedule store"))
    }

    /// Generator output with reasonable defaults.
    pub fn generated_content(content: &str) -> GeneratedContent {
        GeneratedContent {
            content: content.to_string(),
            category: "System design concepts".to_string(),
            kind: "insight".to_string(),
            hashtags: vec!["#SystemDesign".to_string()],
        }
    }

    /// Append request with reasonable defaults.
    pub fn new_item(content: &str) -> NewItem {
        NewItem::new(content, "System design concepts", "insight")
    }

    /// Append an item and approve it.
    pub fn approved_item(store: &dyn ItemStore, content: &str) -> ContentItem {
        let item = store.append(new_item(content)).expect("append item");
        store
            .apply(&item.id, &Transition::Approve)
            .expect("approve item")
    }

    /// 2026-10-01, a fixed schedule anchor.
    pub fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 1).expect("valid date")
    }

    /// Midnight UTC on the anchor date, before any slot of day 1 is due.
    pub fn before_anchor() -> DateTime<Utc> {
        anchor()
            .and_hms_opt(0, 0, 0)
            .expect("valid time")
            .and_utc()
    }

    /// A moment after every slot of `day` has come due.
    pub fn after_day(day: u32) -> DateTime<Utc> {
        TimeSlot::ALL
            .iter()
            .map(|slot| slot.due_at(anchor(), day))
            .max()
            .unwrap_or_else(Utc::now)
            + Duration::minutes(1)
    }
}
