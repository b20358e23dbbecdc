//! Types shared by the coordinators.

use serde::Serialize;
use thiserror::Error;

use crate::item::{ItemError, ItemFailure};
use crate::schedule::ScheduleError;

/// Errors that stop a coordinator run.
///
/// Per-item problems are reported, not raised; only the store failing is.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<ItemError> for CoordinatorError {
    fn from(e: ItemError) -> Self {
        CoordinatorError::Storage(e.to_string())
    }
}

impl From<ScheduleError> for CoordinatorError {
    fn from(e: ScheduleError) -> Self {
        CoordinatorError::Storage(e.to_string())
    }
}

/// An item that went out during a sweep.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PublishedItem {
    pub item_id: String,
    pub external_ref: String,
}

/// Outcome of one publish sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub published: Vec<PublishedItem>,
    /// Publish attempts that failed; the items are now `failed`.
    pub failed: Vec<ItemFailure>,
    /// Due items the gate held back.
    pub held: Vec<String>,
    /// Items skipped because their bookkeeping could not be completed.
    pub errors: Vec<ItemFailure>,
}

impl SweepReport {
    pub fn attempted(&self) -> usize {
        self.published.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempted() == 0 && self.held.is_empty() && self.errors.is_empty()
    }
}
