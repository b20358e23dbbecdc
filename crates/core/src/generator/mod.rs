//! Content generator backends.
//!
//! A [`ContentGenerator`](crate::coordinator::ContentGenerator) writes new
//! posts for the queue. Backends are chosen by `generator.backend`:
//! - `disabled`: no generator; items arrive through the API only
//! - `webhook`: HTTP POST of a category and kind, answered with the post text

mod config;
mod webhook;

use std::sync::Arc;
use std::time::Duration;

pub use config::{GeneratorBackend, GeneratorConfig};
pub use webhook::WebhookGenerator;

use crate::coordinator::{ContentGenerator, GenerateError};

/// Build the generator selected in configuration, if any.
pub fn create_generator(
    config: &GeneratorConfig,
) -> Result<Option<Arc<dyn ContentGenerator>>, GenerateError> {
    match config.backend {
        GeneratorBackend::Disabled => Ok(None),
        GeneratorBackend::Webhook => {
            let webhook = config.webhook.clone().ok_or_else(|| {
                GenerateError::Configuration(
                    "generator.webhook is required when backend = \"webhook\"".to_string(),
                )
            })?;
            let generator = WebhookGenerator::new(
                webhook,
                config.categories.clone(),
                config.kinds.clone(),
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Some(Arc::new(generator)))
        }
    }
}
