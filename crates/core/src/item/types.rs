//! Core content item data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::TimeSlot;

/// Lifecycle state of a content item.
///
/// State machine flow:
/// ```text
/// Generated -> Edited (self-loop) -> Approved -> Scheduled -> Posted
///     |                                 ^   |          |
///     +---------------------------------+   |          v
///                                           |       Failed
///            Approved -> Edited (unapprove) |          |
///                                           +----------+ (recover)
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Produced by the generator, not yet touched by a reviewer.
    Generated,
    /// Content was rewritten by a reviewer.
    Edited,
    /// Cleared for scheduling.
    Approved,
    /// Assigned to a delivery slot.
    Scheduled,
    /// Published successfully (terminal).
    Posted,
    /// Publication attempt failed (terminal until recovered).
    Failed,
}

impl ItemState {
    /// All states, in lifecycle order.
    pub const ALL: [ItemState; 6] = [
        ItemState::Generated,
        ItemState::Edited,
        ItemState::Approved,
        ItemState::Scheduled,
        ItemState::Posted,
        ItemState::Failed,
    ];

    /// Returns the state as a string (for filtering and storage).
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Generated => "generated",
            ItemState::Edited => "edited",
            ItemState::Approved => "approved",
            ItemState::Scheduled => "scheduled",
            ItemState::Posted => "posted",
            ItemState::Failed => "failed",
        }
    }

    /// Returns true if no further transition is possible without an explicit
    /// recovery operation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemState::Posted | ItemState::Failed)
    }

    /// Returns true while a reviewer may still change the content.
    pub fn is_editable(&self) -> bool {
        matches!(self, ItemState::Generated | ItemState::Edited)
    }
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("unknown item state: {}", s))
    }
}

/// Reference from an item to its schedule entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledSlot {
    /// 1-based day relative to the schedule anchor.
    pub day: u32,
    /// Daypart label.
    pub time_slot: TimeSlot,
}

/// Outcome of a publish attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PublishResult {
    /// The item went out; the publisher returned a reference to it.
    Success { external_ref: String },
    /// The publisher rejected the item or could not be reached.
    Failure { reason: String },
}

impl PublishResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PublishResult::Success { .. })
    }
}

/// A unit of content moving through the review/publish pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    /// Unique identifier (UUID), never reused.
    pub id: String,

    /// Text payload. Never empty.
    pub content: String,

    /// Topic category chosen by the generator.
    pub category: String,

    /// Post-type tag (insight, tip, question, ...).
    pub kind: String,

    /// Hashtags suggested by the generator.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashtags: Vec<String>,

    /// Current lifecycle state.
    pub state: ItemState,

    /// When the item was created.
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,

    /// Time of the last publish attempt, successful or not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_slot: Option<ScheduledSlot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_result: Option<PublishResult>,
}

impl ContentItem {
    /// Create a fresh item in the `generated` state.
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
        kind: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            category: category.into(),
            kind: kind.into(),
            hashtags: Vec::new(),
            state: ItemState::Generated,
            created_at,
            edited_at: None,
            approved_at: None,
            posted_at: None,
            scheduled_slot: None,
            publish_result: None,
        }
    }

    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    pub fn is_approved(&self) -> bool {
        self.approved_at.is_some()
    }

    pub fn is_posted(&self) -> bool {
        self.state == ItemState::Posted
    }

    /// Returns true if the scheduler may pick this item up.
    pub fn is_schedulable(&self) -> bool {
        self.state == ItemState::Approved && self.scheduled_slot.is_none()
    }
}

/// Request to append a new item.
#[derive(Debug, Clone)]
pub struct NewItem {
    /// Caller-supplied identity. A fresh UUID is assigned when `None`.
    pub id: Option<String>,
    pub content: String,
    pub category: String,
    pub kind: String,
    pub hashtags: Vec<String>,
}

impl NewItem {
    pub fn new(
        content: impl Into<String>,
        category: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            content: content.into(),
            category: category.into(),
            kind: kind.into(),
            hashtags: Vec::new(),
        }
    }

    /// Use a specific identity instead of a generated one.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_hashtags(mut self, hashtags: Vec<String>) -> Self {
        self.hashtags = hashtags;
        self
    }
}

/// A per-item failure collected by a batch operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemFailure {
    pub item_id: String,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(item_id: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            item_id: item_id.into(),
            reason: reason.to_string(),
        }
    }
}
