//! Publishing backends.
//!
//! A [`Publisher`] performs the external side effect of posting an item.
//! Backends are chosen by `publisher.backend`:
//! - `dry_run`: logs and returns a synthetic reference
//! - `webhook`: HTTP POST to a configured endpoint

mod config;
mod dry_run;
mod traits;
mod types;
mod webhook;

use std::sync::Arc;
use std::time::Duration;

pub use config::{ConfirmationMode, PublisherBackend, PublisherConfig, WebhookConfig};
pub use dry_run::DryRunPublisher;
pub use traits::Publisher;
pub use types::{PublishError, PublishReceipt, PublishRequest};
pub use webhook::WebhookPublisher;

/// Build the publisher selected in configuration.
pub fn create_publisher(config: &PublisherConfig) -> Result<Arc<dyn Publisher>, PublishError> {
    match config.backend {
        PublisherBackend::DryRun => Ok(Arc::new(DryRunPublisher::new())),
        PublisherBackend::Webhook => {
            let webhook = config.webhook.clone().ok_or_else(|| {
                PublishError::Configuration(
                    "publisher.webhook is required when backend = \"webhook\"".to_string(),
                )
            })?;
            let publisher =
                WebhookPublisher::new(webhook, Duration::from_secs(config.timeout_secs))?;
            Ok(Arc::new(publisher))
        }
    }
}
