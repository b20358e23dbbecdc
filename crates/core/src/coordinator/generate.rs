//! Content generation runner.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::review::ReviewCoordinator;
use super::types::CoordinatorError;
use crate::item::{ContentItem, ItemFailure, NewItem};
use crate::metrics;

/// Text produced by a generator, before it becomes a queue item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedContent {
    pub content: String,
    pub category: String,
    pub kind: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl From<GeneratedContent> for NewItem {
    fn from(generated: GeneratedContent) -> Self {
        NewItem::new(generated.content, generated.category, generated.kind)
            .with_hashtags(generated.hashtags)
    }
}

#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    #[error("generator produced unusable output: {0}")]
    InvalidOutput(String),

    #[error("generator configuration error: {0}")]
    Configuration(String),
}

/// Opaque source of new content.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn produce_item(&self) -> Result<GeneratedContent, GenerateError>;
}

/// Outcome of a generation batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateReport {
    pub created: Vec<ContentItem>,
    /// Generator calls or appends that failed; keyed by attempt number.
    pub failed: Vec<ItemFailure>,
}

/// Ask `generator` for `count` items and append each one.
///
/// Failures are skipped and reported; only a storage failure aborts.
pub async fn generate_batch(
    generator: &dyn ContentGenerator,
    review: &ReviewCoordinator,
    count: usize,
) -> Result<GenerateReport, CoordinatorError> {
    let mut report = GenerateReport::default();

    for attempt in 1..=count {
        let generated = match generator.produce_item().await {
            Ok(generated) => generated,
            Err(e) => {
                warn!("Generator {} failed on attempt {}: {}", generator.name(), attempt, e);
                metrics::GENERATION_ATTEMPTS
                    .with_label_values(&["failure"])
                    .inc();
                report
                    .failed
                    .push(ItemFailure::new(format!("attempt-{}", attempt), e));
                continue;
            }
        };
        metrics::GENERATION_ATTEMPTS
            .with_label_values(&["success"])
            .inc();

        match review.create_item(generated.into(), "generator") {
            Ok(item) => report.created.push(item),
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                warn!("Generated item rejected on attempt {}: {}", attempt, e);
                report
                    .failed
                    .push(ItemFailure::new(format!("attempt-{}", attempt), e));
            }
        }
    }

    info!(
        "Generation batch: {} created, {} failed",
        report.created.len(),
        report.failed.len()
    );

    Ok(report)
}
