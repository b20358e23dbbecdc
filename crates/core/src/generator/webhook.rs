//! Webhook generator backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coordinator::{ContentGenerator, GenerateError, GeneratedContent};
use crate::publish::WebhookConfig;

#[derive(Serialize)]
struct GenerateBody<'a> {
    category: &'a str,
    kind: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    content: String,
    #[serde(default)]
    hashtags: Vec<String>,
}

/// Asks an HTTP endpoint for one post per call.
///
/// Categories and kinds are requested in rotation so a batch covers a spread
/// of topics.
pub struct WebhookGenerator {
    client: Client,
    config: WebhookConfig,
    categories: Vec<String>,
    kinds: Vec<String>,
    calls: AtomicUsize,
}

impl WebhookGenerator {
    pub fn new(
        config: WebhookConfig,
        categories: Vec<String>,
        kinds: Vec<String>,
        timeout: Duration,
    ) -> Result<Self, GenerateError> {
        if config.url.trim().is_empty() {
            return Err(GenerateError::Configuration(
                "webhook url cannot be empty".to_string(),
            ));
        }
        if categories.is_empty() || kinds.is_empty() {
            return Err(GenerateError::Configuration(
                "generator needs at least one category and one kind".to_string(),
            ));
        }

        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            GenerateError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            config,
            categories,
            kinds,
            calls: AtomicUsize::new(0),
        })
    }

    fn next_topic(&self) -> (&str, &str) {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        let category = &self.categories[n % self.categories.len()];
        let kind = &self.kinds[n % self.kinds.len()];
        (category, kind)
    }
}

fn parse_response(
    body: &str,
    category: &str,
    kind: &str,
) -> Result<GeneratedContent, GenerateError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| GenerateError::InvalidOutput(format!("Failed to parse response: {}", e)))?;

    let content = response.content.trim();
    if content.is_empty() {
        return Err(GenerateError::InvalidOutput(
            "generator returned empty content".to_string(),
        ));
    }

    Ok(GeneratedContent {
        content: content.to_string(),
        category: category.to_string(),
        kind: kind.to_string(),
        hashtags: response.hashtags,
    })
}

#[async_trait]
impl ContentGenerator for WebhookGenerator {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn produce_item(&self) -> Result<GeneratedContent, GenerateError> {
        let (category, kind) = self.next_topic();
        debug!(category, kind, url = %self.config.url, "Requesting generated post");

        let mut builder = self
            .client
            .post(&self.config.url)
            .json(&GenerateBody { category, kind });
        if let Some(ref api_key) = self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GenerateError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(GenerateError::Unavailable(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        parse_response(&body, category, kind)
    }
}
