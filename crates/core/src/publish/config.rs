//! Publisher configuration.

use serde::{Deserialize, Serialize};

/// `[publisher]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Run the background publish loop.
    /// When disabled, sweeps only happen through the API.
    #[serde(default)]
    pub enabled: bool,

    /// How often the publish loop sweeps for due entries (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub backend: PublisherBackend,

    /// Upper bound on a single publish call (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum items published per sweep (unset = no cap).
    #[serde(default)]
    pub max_per_sweep: Option<usize>,

    /// Whether each post needs a reviewer's go-ahead.
    #[serde(default)]
    pub confirmation: ConfirmationMode,

    /// Required when backend = "webhook".
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

fn default_poll_interval() -> u64 {
    60_000 // 1 minute
}

fn default_timeout() -> u64 {
    30
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_ms: default_poll_interval(),
            backend: PublisherBackend::default(),
            timeout_secs: default_timeout(),
            max_per_sweep: None,
            confirmation: ConfirmationMode::default(),
            webhook: None,
        }
    }
}

/// Available publish backends
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublisherBackend {
    /// Log instead of posting.
    #[default]
    DryRun,
    /// POST each item to an HTTP endpoint.
    Webhook,
}

impl PublisherBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublisherBackend::DryRun => "dry_run",
            PublisherBackend::Webhook => "webhook",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMode {
    /// Publish every due item.
    #[default]
    Auto,
    /// Publish only items a reviewer confirmed.
    Manual,
}

/// Webhook endpoint configuration, used by the publish and generator backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Endpoint URL. Publishing POSTs `{"item_id": ..., "content": ...}`.
    pub url: String,
    /// Sent as a bearer token when set.
    #[serde(default)]
    pub api_key: Option<String>,
}
