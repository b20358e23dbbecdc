use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::generator::GeneratorConfig;
use crate::publish::{PublisherConfig, WebhookConfig};
use crate::schedule::ScheduleConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub document: DocumentConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
///
/// Items, schedule entries and the audit trail share this file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("cadence.db")
}

/// Queue document configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentConfig {
    /// JSON file written by export and read by sync.
    #[serde(default = "default_document_path")]
    pub path: PathBuf,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            path: default_document_path(),
        }
    }
}

fn default_document_path() -> PathBuf {
    PathBuf::from("content_queue.json")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub schedule: ScheduleConfig,
    pub publisher: SanitizedPublisherConfig,
    pub generator: SanitizedGeneratorConfig,
    pub document: DocumentConfig,
}

/// Sanitized publisher config (webhook key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPublisherConfig {
    pub enabled: bool,
    pub poll_interval_ms: u64,
    pub backend: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_per_sweep: Option<usize>,
    pub confirmation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<SanitizedWebhookConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedWebhookConfig {
    pub url: String,
    pub api_key_configured: bool,
}

impl From<&WebhookConfig> for SanitizedWebhookConfig {
    fn from(webhook: &WebhookConfig) -> Self {
        Self {
            url: webhook.url.clone(),
            api_key_configured: webhook.api_key.as_deref().is_some_and(|k| !k.is_empty()),
        }
    }
}

/// Sanitized generator config (webhook key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGeneratorConfig {
    pub backend: String,
    pub timeout_secs: u64,
    pub max_batch: usize,
    pub categories: Vec<String>,
    pub kinds: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<SanitizedWebhookConfig>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let publisher = &config.publisher;
        let generator = &config.generator;
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            schedule: config.schedule.clone(),
            publisher: SanitizedPublisherConfig {
                enabled: publisher.enabled,
                poll_interval_ms: publisher.poll_interval_ms,
                backend: publisher.backend.as_str().to_string(),
                timeout_secs: publisher.timeout_secs,
                max_per_sweep: publisher.max_per_sweep,
                confirmation: match publisher.confirmation {
                    crate::publish::ConfirmationMode::Auto => "auto".to_string(),
                    crate::publish::ConfirmationMode::Manual => "manual".to_string(),
                },
                webhook: publisher.webhook.as_ref().map(SanitizedWebhookConfig::from),
            },
            generator: SanitizedGeneratorConfig {
                backend: generator.backend.as_str().to_string(),
                timeout_secs: generator.timeout_secs,
                max_batch: generator.max_batch,
                categories: generator.categories.clone(),
                kinds: generator.kinds.clone(),
                webhook: generator.webhook.as_ref().map(SanitizedWebhookConfig::from),
            },
            document: config.document.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorBackend;
    use crate::publish::PublisherBackend;
    use crate::schedule::TimeSlot;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "cadence.db");
        assert_eq!(config.schedule.items_per_day, 2);
        assert!(!config.publisher.enabled);
        assert_eq!(config.generator.backend, GeneratorBackend::Disabled);
        assert_eq!(
            config.document.path.to_str().unwrap(),
            "content_queue.json"
        );
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
path = "/data/queue.sqlite"

[schedule]
items_per_day = 1
slots = ["india_evening"]
start_date = "2026-10-01"

[publisher]
enabled = true
backend = "webhook"
poll_interval_ms = 5000

[publisher.webhook]
url = "http://localhost:9100/posts"

[generator]
backend = "webhook"

[generator.webhook]
url = "http://localhost:9200/generate"

[document]
path = "/data/queue.json"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.path.to_str().unwrap(), "/data/queue.sqlite");
        assert_eq!(config.schedule.slots, vec![TimeSlot::IndiaEvening]);
        assert_eq!(config.publisher.backend, PublisherBackend::Webhook);
        assert_eq!(config.publisher.poll_interval_ms, 5000);
        assert!(config.publisher.webhook.is_some());
        assert_eq!(config.generator.backend, GeneratorBackend::Webhook);
        assert_eq!(config.document.path.to_str().unwrap(), "/data/queue.json");
    }

    #[test]
    fn test_sanitized_config_hides_api_key() {
        let mut config = Config::default();
        config.publisher.backend = PublisherBackend::Webhook;
        config.publisher.webhook = Some(WebhookConfig {
            url: "http://hooks.local/post".to_string(),
            api_key: Some("super-secret".to_string()),
        });

        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.publisher.backend, "webhook");
        assert_eq!(sanitized.publisher.confirmation, "auto");
        let webhook = sanitized.publisher.webhook.as_ref().unwrap();
        assert!(webhook.api_key_configured);

        config.generator.webhook = Some(WebhookConfig {
            url: "http://gen.local/generate".to_string(),
            api_key: Some("gen-secret".to_string()),
        });
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.generator.webhook.as_ref().unwrap().api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!json.contains("gen-secret"));
    }
}
