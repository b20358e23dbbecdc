//! Types for the publish module.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a publisher is asked to send out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishRequest {
    pub item_id: String,
    pub content: String,
}

/// Proof that a publish went through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Identifier the destination assigned to the published post; empty when
    /// it reported none.
    pub external_ref: String,
}

/// Errors that can occur while publishing.
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// The call did not complete within the configured timeout.
    #[error("publish timed out after {0}s")]
    Timeout(u64),

    /// Could not reach the destination.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The destination refused the post.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The publisher is not set up correctly.
    #[error("configuration error: {0}")]
    Configuration(String),
}
