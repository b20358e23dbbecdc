//! Pre-publish confirmation policies.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::item::ContentItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Publish,
    /// Leave the item scheduled; it is offered again on the next sweep.
    Hold,
}

/// Decides whether a due item may be published now.
pub trait PublishGate: Send + Sync {
    fn decide(&self, item: &ContentItem) -> GateDecision;
}

/// Publishes every due item.
#[derive(Debug, Default)]
pub struct AutoConfirm;

impl PublishGate for AutoConfirm {
    fn decide(&self, _item: &ContentItem) -> GateDecision {
        GateDecision::Publish
    }
}

/// Publishes only items a reviewer confirmed.
///
/// A confirmation covers one publish attempt and is consumed by it.
#[derive(Debug, Default)]
pub struct ManualGate {
    confirmed: Mutex<HashSet<String>>,
}

impl ManualGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm(&self, item_id: &str) {
        if let Ok(mut confirmed) = self.confirmed.lock() {
            confirmed.insert(item_id.to_string());
        }
    }

    /// Withdraw a confirmation. Returns true if one was pending.
    pub fn revoke(&self, item_id: &str) -> bool {
        self.confirmed
            .lock()
            .map(|mut confirmed| confirmed.remove(item_id))
            .unwrap_or(false)
    }

    #[cfg(test)]
    fn is_confirmed(&self, item_id: &str) -> bool {
        self.confirmed
            .lock()
            .map(|confirmed| confirmed.contains(item_id))
            .unwrap_or(false)
    }
}

impl PublishGate for ManualGate {
    fn decide(&self, item: &ContentItem) -> GateDecision {
        if self.revoke(&item.id) {
            GateDecision::Publish
        } else {
            GateDecision::Hold
        }
    }
}
