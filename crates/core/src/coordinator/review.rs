//! Reviewer-facing operations on single items.

use std::cell::Cell;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::audit::{AuditEvent, AuditHandle};
use crate::item::{lifecycle, ContentItem, ItemError, ItemState, ItemStore, NewItem, Transition};

/// Applies reviewer decisions through the item store and records them.
///
/// Each operation is one atomic update; callers get the committed record or
/// the error that left the item untouched.
pub struct ReviewCoordinator {
    items: Arc<dyn ItemStore>,
    audit: Option<AuditHandle>,
}

impl ReviewCoordinator {
    pub fn new(items: Arc<dyn ItemStore>, audit: Option<AuditHandle>) -> Self {
        Self { items, audit }
    }

    /// Append a new item on behalf of `source` (api, generator, document).
    pub fn create_item(&self, request: NewItem, source: &str) -> Result<ContentItem, ItemError> {
        let item = self.items.append(request)?;
        if let Some(ref audit) = self.audit {
            audit.try_emit(AuditEvent::ItemCreated {
                item_id: item.id.clone(),
                category: item.category.clone(),
                kind: item.kind.clone(),
                source: source.to_string(),
            });
        }
        Ok(item)
    }

    pub fn approve_item(&self, id: &str) -> Result<ContentItem, ItemError> {
        self.transition(id, Transition::Approve)
    }

    pub fn edit_item(&self, id: &str, content: impl Into<String>) -> Result<ContentItem, ItemError> {
        self.transition(
            id,
            Transition::Edit {
                content: content.into(),
            },
        )
    }

    pub fn unapprove_item(&self, id: &str) -> Result<ContentItem, ItemError> {
        self.transition(id, Transition::Unapprove)
    }

    /// Return a failed item to `approved` for another delivery attempt.
    pub fn recover_item(&self, id: &str) -> Result<ContentItem, ItemError> {
        self.transition(id, Transition::Recover)
    }

    fn transition(&self, id: &str, transition: Transition) -> Result<ContentItem, ItemError> {
        // State the committed mutation started from.
        let observed: Cell<Option<ItemState>> = Cell::new(None);

        let updated = self.items.update_atomic(id, &|current| {
            observed.set(Some(current.state));
            lifecycle::apply(current, &transition, Utc::now())
        })?;

        let from = observed.get().unwrap_or(updated.state);
        if from != updated.state || matches!(transition, Transition::Edit { .. }) {
            info!(
                "Item {} {}: {} -> {}",
                id,
                transition.name(),
                from,
                updated.state
            );
            if let Some(ref audit) = self.audit {
                audit.try_emit(AuditEvent::ItemStateChanged {
                    item_id: id.to_string(),
                    from_state: from.to_string(),
                    to_state: updated.state.to_string(),
                    operation: transition.name().to_string(),
                });
            }
        }

        Ok(updated)
    }
}
