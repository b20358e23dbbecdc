//! Publisher trait.

use async_trait::async_trait;

use super::types::{PublishError, PublishReceipt, PublishRequest};

/// The opaque action that pushes one item to its destination.
///
/// Called at most once per publish attempt. Implementations must not touch
/// the item store; the caller records the outcome.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the name of this publisher backend.
    fn name(&self) -> &str;

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, PublishError>;
}
