//! Item storage trait and types.

use chrono::Utc;
use thiserror::Error;

use super::lifecycle::{self, LifecycleError, Transition};
use super::types::{ContentItem, ItemState, NewItem};

/// Error type for item store operations.
#[derive(Debug, Error)]
pub enum ItemError {
    /// No item with this id.
    #[error("item not found: {0}")]
    NotFound(String),

    /// Caller-supplied id collides with an existing item.
    #[error("item id already exists: {0}")]
    DuplicateIdentity(String),

    /// The requested change violates the lifecycle. Nothing was written.
    #[error("conflict on item {item_id}: {source}")]
    Conflict {
        item_id: String,
        #[source]
        source: LifecycleError,
    },

    /// The item could not be created as given.
    #[error("invalid item: {0}")]
    InvalidItem(String),

    /// Concurrent writers kept winning the race for this id.
    #[error("gave up updating item {0} after repeated concurrent modification")]
    Contention(String),

    /// The store could not read or persist data.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ItemError {
    /// Returns the lifecycle error behind a conflict, if any.
    pub fn lifecycle(&self) -> Option<&LifecycleError> {
        match self {
            ItemError::Conflict { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns true if the error means the durability contract could not be
    /// honored and the caller must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ItemError::Storage(_))
    }
}

/// Filter for querying items.
#[derive(Debug, Clone)]
pub struct ItemFilter {
    /// Filter by state.
    pub state: Option<ItemState>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for ItemFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemFilter {
    pub fn new() -> Self {
        Self {
            state: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_state(mut self, state: ItemState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Point-in-time view of the whole collection, in insertion order.
///
/// Taken in a single read, so writes that land afterwards are not visible.
/// Iterate it as many times as needed.
#[derive(Debug, Clone, Default)]
pub struct ItemSnapshot {
    items: Vec<ContentItem>,
}

impl ItemSnapshot {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self { items }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContentItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<ContentItem> {
        self.items
    }
}

impl<'a> IntoIterator for &'a ItemSnapshot {
    type Item = &'a ContentItem;
    type IntoIter = std::slice::Iter<'a, ContentItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for ItemSnapshot {
    type Item = ContentItem;
    type IntoIter = std::vec::IntoIter<ContentItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Closure computing the next version of an item from its current version.
///
/// May be invoked more than once when a concurrent writer wins the race, so
/// it must be a pure function of its input.
pub type Mutation<'a> = &'a dyn Fn(&ContentItem) -> Result<ContentItem, LifecycleError>;

/// Trait for item storage backends.
///
/// Implementations persist every successful `append` and `update_atomic`
/// before returning.
pub trait ItemStore: Send + Sync {
    /// Add a new item in the `generated` state.
    fn append(&self, item: NewItem) -> Result<ContentItem, ItemError>;

    /// Get an item by id.
    fn get(&self, id: &str) -> Result<ContentItem, ItemError>;

    /// Snapshot of every item in insertion order.
    fn list_all(&self) -> Result<ItemSnapshot, ItemError>;

    /// List items matching the filter, in insertion order.
    fn list(&self, filter: &ItemFilter) -> Result<Vec<ContentItem>, ItemError>;

    /// Count items matching the filter (ignores limit/offset).
    fn count(&self, filter: &ItemFilter) -> Result<i64, ItemError>;

    /// Read, mutate and commit one item atomically.
    ///
    /// Calls for the same id are serialized; calls for different ids do not
    /// wait on each other. The mutation result is checked against the
    /// lifecycle before anything is written.
    fn update_atomic(&self, id: &str, mutate: Mutation<'_>) -> Result<ContentItem, ItemError>;

    /// Apply a named lifecycle transition.
    fn apply(&self, id: &str, transition: &Transition) -> Result<ContentItem, ItemError> {
        self.update_atomic(id, &|item| lifecycle::apply(item, transition, Utc::now()))
    }
}
