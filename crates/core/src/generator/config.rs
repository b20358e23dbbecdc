//! Generator configuration.

use serde::{Deserialize, Serialize};

use crate::publish::WebhookConfig;

/// `[generator]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub backend: GeneratorBackend,

    /// Upper bound on a single generation call (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Largest batch accepted by one generate request.
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,

    /// Topics requested in rotation.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Post formats requested in rotation.
    #[serde(default = "default_kinds")]
    pub kinds: Vec<String>,

    /// Required when backend = "webhook".
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

fn default_timeout() -> u64 {
    60
}

fn default_max_batch() -> usize {
    20
}

fn default_categories() -> Vec<String> {
    [
        "AI/ML insights",
        "Cloud infrastructure tips",
        "DSA problem breakdowns",
        "System design concepts",
        "Full-stack development",
        "Reinforcement learning",
        "Tech career advice",
        "Coding best practices",
        "DevOps/Infrastructure",
        "Tech industry trends",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_kinds() -> Vec<String> {
    [
        "insight",
        "tip",
        "thread_starter",
        "question",
        "breakdown",
        "comparison",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: GeneratorBackend::default(),
            timeout_secs: default_timeout(),
            max_batch: default_max_batch(),
            categories: default_categories(),
            kinds: default_kinds(),
            webhook: None,
        }
    }
}

/// Available generator backends
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorBackend {
    /// Items are only added through the API.
    #[default]
    Disabled,
    /// Ask an HTTP endpoint to write each post.
    Webhook,
}

impl GeneratorBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorBackend::Disabled => "disabled",
            GeneratorBackend::Webhook => "webhook",
        }
    }
}
