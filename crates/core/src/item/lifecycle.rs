//! Item lifecycle state machine.
//!
//! Every change to a stored item goes through this module, either as a named
//! [`Transition`] applied with [`apply`] or as an arbitrary mutation checked
//! with [`check_change`].

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::types::{ContentItem, ItemState, PublishResult, ScheduledSlot};

/// Errors raised when a change would violate the lifecycle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("cannot {attempted} item in state {from}")]
    IllegalTransition {
        from: ItemState,
        attempted: &'static str,
    },

    #[error("item {item_id} is already scheduled for day {day} {time_slot}")]
    AlreadyScheduled {
        item_id: String,
        day: u32,
        time_slot: String,
    },

    #[error("content cannot be empty")]
    EmptyContent,

    #[error("illegal mutation: {0}")]
    IllegalMutation(String),
}

/// A named state transition requested by a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Replace the content (generated/edited only).
    Edit { content: String },
    /// Clear the item for scheduling. Idempotent on approved items.
    Approve,
    /// Revert an approval so the content can be edited again.
    Unapprove,
    /// Attach a schedule slot.
    AssignSlot(ScheduledSlot),
    /// Record the outcome of a publish attempt.
    RecordPublish(PublishResult),
    /// Return a failed item to `approved` so it can be rescheduled.
    Recover,
}

impl Transition {
    /// Operation name used in errors, logs and audit events.
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Edit { .. } => "edit",
            Transition::Approve => "approve",
            Transition::Unapprove => "unapprove",
            Transition::AssignSlot(_) => "assign_slot",
            Transition::RecordPublish(_) => "record_publish",
            Transition::Recover => "recover",
        }
    }
}

/// Apply a transition to an item, returning the updated record.
///
/// The input is never modified; on error the caller keeps the original.
/// Timestamps are clamped to `created_at` so they never precede creation.
pub fn apply(
    item: &ContentItem,
    transition: &Transition,
    now: DateTime<Utc>,
) -> Result<ContentItem, LifecycleError> {
    let now = now.max(item.created_at);
    let illegal = || LifecycleError::IllegalTransition {
        from: item.state,
        attempted: transition.name(),
    };

    let mut next = item.clone();
    match transition {
        Transition::Edit { content } => {
            if !item.state.is_editable() {
                return Err(illegal());
            }
            if content.trim().is_empty() {
                return Err(LifecycleError::EmptyContent);
            }
            next.content = content.clone();
            next.state = ItemState::Edited;
            next.edited_at = Some(now);
        }
        Transition::Approve => match item.state {
            ItemState::Approved => {}
            ItemState::Generated | ItemState::Edited => {
                next.state = ItemState::Approved;
                next.approved_at = Some(now);
            }
            _ => return Err(illegal()),
        },
        Transition::Unapprove => {
            if item.state != ItemState::Approved {
                return Err(illegal());
            }
            // edited_at only ever records a content edit.
            next.state = ItemState::Edited;
            next.approved_at = None;
        }
        Transition::AssignSlot(slot) => {
            if let Some(existing) = item.scheduled_slot {
                return Err(LifecycleError::AlreadyScheduled {
                    item_id: item.id.clone(),
                    day: existing.day,
                    time_slot: existing.time_slot.to_string(),
                });
            }
            if item.state != ItemState::Approved {
                return Err(illegal());
            }
            next.state = ItemState::Scheduled;
            next.scheduled_slot = Some(*slot);
        }
        Transition::RecordPublish(result) => {
            if item.state != ItemState::Scheduled {
                return Err(illegal());
            }
            next.state = if result.is_success() {
                ItemState::Posted
            } else {
                ItemState::Failed
            };
            next.posted_at = Some(now);
            next.publish_result = Some(result.clone());
        }
        Transition::Recover => {
            if item.state != ItemState::Failed {
                return Err(illegal());
            }
            next.state = ItemState::Approved;
            next.scheduled_slot = None;
            next.posted_at = None;
            next.publish_result = None;
        }
    }

    check_record(&next)?;
    Ok(next)
}

/// Returns true if the lifecycle has an edge from `from` to `to`.
pub fn is_legal_edge(from: ItemState, to: ItemState) -> bool {
    use ItemState::*;
    matches!(
        (from, to),
        (Generated, Edited)
            | (Generated, Approved)
            | (Edited, Edited)
            | (Edited, Approved)
            | (Approved, Edited)
            | (Approved, Scheduled)
            | (Scheduled, Posted)
            | (Scheduled, Failed)
            | (Failed, Approved)
    )
}

/// Validate an arbitrary change produced by an update closure.
///
/// Identity and creation time are immutable, the state edge must exist in the
/// lifecycle, a same-state change is only legal as a re-edit, and the result
/// must satisfy [`check_record`].
pub fn check_change(before: &ContentItem, after: &ContentItem) -> Result<(), LifecycleError> {
    if before.id != after.id {
        return Err(LifecycleError::IllegalMutation(format!(
            "id changed from {} to {}",
            before.id, after.id
        )));
    }
    if before.created_at != after.created_at {
        return Err(LifecycleError::IllegalMutation(
            "created_at is immutable".to_string(),
        ));
    }
    if before == after {
        return Ok(());
    }

    if before.state == after.state {
        if before.state != ItemState::Edited {
            return Err(LifecycleError::IllegalMutation(format!(
                "item in state {} cannot change without a transition",
                before.state
            )));
        }
    } else if !is_legal_edge(before.state, after.state) {
        return Err(LifecycleError::IllegalTransition {
            from: before.state,
            attempted: target_operation(after.state),
        });
    }

    let is_edit = before.state.is_editable() && after.state == ItemState::Edited;
    if before.content != after.content && !is_edit {
        return Err(LifecycleError::IllegalMutation(
            "content can only change through an edit".to_string(),
        ));
    }
    let slotted = matches!(
        before.state,
        ItemState::Scheduled | ItemState::Posted | ItemState::Failed
    );
    if slotted && before.hashtags != after.hashtags {
        return Err(LifecycleError::IllegalMutation(format!(
            "hashtags are frozen once an item is {}",
            before.state
        )));
    }
    if before.category != after.category || before.kind != after.kind {
        return Err(LifecycleError::IllegalMutation(
            "category and kind are fixed at creation".to_string(),
        ));
    }

    check_record(after)
}

/// Check the per-record invariants tying timestamps and optional fields to the
/// state.
pub fn check_record(item: &ContentItem) -> Result<(), LifecycleError> {
    if item.content.trim().is_empty() {
        return Err(LifecycleError::EmptyContent);
    }

    for (field, value) in [
        ("edited_at", item.edited_at),
        ("approved_at", item.approved_at),
        ("posted_at", item.posted_at),
    ] {
        if let Some(ts) = value {
            if ts < item.created_at {
                return Err(LifecycleError::IllegalMutation(format!(
                    "{} precedes created_at",
                    field
                )));
            }
        }
    }

    let violation = |msg: &str| Err(LifecycleError::IllegalMutation(msg.to_string()));
    match item.state {
        ItemState::Generated => {
            if item.edited_at.is_some() || item.approved_at.is_some() {
                return violation("generated item carries review timestamps");
            }
        }
        ItemState::Edited => {
            if item.approved_at.is_some() {
                return violation("edited item still carries approved_at");
            }
        }
        ItemState::Approved | ItemState::Scheduled | ItemState::Posted | ItemState::Failed => {
            if item.approved_at.is_none() {
                return violation("approved item has no approved_at");
            }
        }
    }

    let needs_slot = matches!(
        item.state,
        ItemState::Scheduled | ItemState::Posted | ItemState::Failed
    );
    if needs_slot != item.scheduled_slot.is_some() {
        return violation("scheduled_slot does not match state");
    }

    let published = matches!(item.state, ItemState::Posted | ItemState::Failed);
    if published != item.posted_at.is_some() || published != item.publish_result.is_some() {
        return violation("publish fields do not match state");
    }
    if let Some(result) = &item.publish_result {
        if result.is_success() != (item.state == ItemState::Posted) {
            return violation("publish_result outcome does not match state");
        }
    }

    Ok(())
}

fn target_operation(state: ItemState) -> &'static str {
    match state {
        ItemState::Generated => "regenerate",
        ItemState::Edited => "edit",
        ItemState::Approved => "approve",
        ItemState::Scheduled => "assign_slot",
        ItemState::Posted | ItemState::Failed => "record_publish",
    }
}
