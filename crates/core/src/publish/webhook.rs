//! Webhook publish backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use super::config::WebhookConfig;
use super::traits::Publisher;
use super::types::{PublishError, PublishReceipt, PublishRequest};

#[derive(Serialize)]
struct WebhookBody<'a> {
    item_id: &'a str,
    content: &'a str,
}

/// POSTs each item as JSON and takes the post id from the response.
pub struct WebhookPublisher {
    client: Client,
    config: WebhookConfig,
    timeout: Duration,
}

impl WebhookPublisher {
    pub fn new(config: WebhookConfig, timeout: Duration) -> Result<Self, PublishError> {
        if config.url.trim().is_empty() {
            return Err(PublishError::Configuration(
                "webhook url cannot be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            timeout,
        })
    }
}

/// Pull the post id out of a successful webhook response body.
///
/// Accepts `{"id": "..."}` or a numeric id. The endpoint already accepted the
/// post, so a body without a usable id still counts as published, with an
/// empty reference.
fn parse_receipt(body: &str) -> PublishReceipt {
    let id = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| match value.get("id") {
            Some(serde_json::Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(serde_json::Value::Number(id)) => Some(id.to_string()),
            _ => None,
        });

    match id {
        Some(external_ref) => PublishReceipt { external_ref },
        None => {
            warn!("Webhook accepted the post but returned no id");
            PublishReceipt {
                external_ref: String::new(),
            }
        }
    }
}

#[async_trait]
impl Publisher for WebhookPublisher {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, PublishError> {
        debug!(item_id = %request.item_id, url = %self.config.url, "Posting item to webhook");

        let mut builder = self.client.post(&self.config.url).json(&WebhookBody {
            item_id: &request.item_id,
            content: &request.content,
        });
        if let Some(ref api_key) = self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                PublishError::Timeout(self.timeout.as_secs())
            } else if e.is_connect() {
                PublishError::ConnectionFailed(e.to_string())
            } else {
                PublishError::Rejected(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(PublishError::Rejected(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(parse_receipt(&body))
    }
}
