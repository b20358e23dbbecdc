//! Content items and the shared queue that holds them.

pub mod lifecycle;
mod locks;
mod sqlite_store;
mod store;
mod types;

pub(crate) use sqlite_store::configure_shared_connection;

pub use lifecycle::{LifecycleError, Transition};
pub use sqlite_store::SqliteItemStore;
pub use store::{ItemError, ItemFilter, ItemSnapshot, ItemStore, Mutation};
pub use types::{ContentItem, ItemFailure, ItemState, NewItem, PublishResult, ScheduledSlot};
