use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Item lifecycle
    ItemCreated {
        item_id: String,
        category: String,
        kind: String,
        /// Where the item came from (api, generator, document).
        source: String,
    },
    ItemStateChanged {
        item_id: String,
        from_state: String,
        to_state: String,
        /// Transition name (approve, edit, ...).
        operation: String,
    },

    // Scheduling
    SlotAssigned {
        item_id: String,
        day: u32,
        time_slot: String,
        due_at: DateTime<Utc>,
    },
    ScheduleRunCompleted {
        assigned: usize,
        skipped: usize,
        failed: usize,
    },

    // Publishing
    PublishAttempted {
        item_id: String,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        external_ref: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        duration_ms: u64,
    },
    SweepCompleted {
        published: usize,
        failed: usize,
        held: usize,
    },
}

impl AuditEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::ItemCreated { .. } => "item_created",
            Self::ItemStateChanged { .. } => "item_state_changed",
            Self::SlotAssigned { .. } => "slot_assigned",
            Self::ScheduleRunCompleted { .. } => "schedule_run_completed",
            Self::PublishAttempted { .. } => "publish_attempted",
            Self::SweepCompleted { .. } => "sweep_completed",
        }
    }

    /// Extract item_id if this event is item-related
    pub fn item_id(&self) -> Option<&str> {
        match self {
            Self::ItemCreated { item_id, .. }
            | Self::ItemStateChanged { item_id, .. }
            | Self::SlotAssigned { item_id, .. }
            | Self::PublishAttempted { item_id, .. } => Some(item_id),
            Self::ServiceStarted { .. }
            | Self::ServiceStopped { .. }
            | Self::ScheduleRunCompleted { .. }
            | Self::SweepCompleted { .. } => None,
        }
    }
}

/// A stored audit record with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub item_id: Option<String>,
    pub data: AuditEvent,
}
