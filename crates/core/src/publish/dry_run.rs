//! Publisher that only logs.

use async_trait::async_trait;
use tracing::info;

use super::traits::Publisher;
use super::types::{PublishError, PublishReceipt, PublishRequest};

/// Logs each item instead of sending it anywhere.
#[derive(Debug, Default)]
pub struct DryRunPublisher;

impl DryRunPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Publisher for DryRunPublisher {
    fn name(&self) -> &str {
        "dry_run"
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, PublishError> {
        info!(
            item_id = %request.item_id,
            chars = request.content.chars().count(),
            "Dry run: would publish item"
        );
        Ok(PublishReceipt {
            external_ref: format!("dry-run-{}", uuid::Uuid::new_v4()),
        })
    }
}
