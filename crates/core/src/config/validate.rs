use super::{types::Config, ConfigError};
use crate::generator::GeneratorBackend;
use crate::publish::PublisherBackend;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Schedule has at least one slot and one item per day, and no more items
///   per day than slots
/// - Publisher interval and timeout are non-zero
/// - Webhook backends have a webhook section with a URL
/// - Generator batch size is non-zero and a webhook generator has topics
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let schedule = &config.schedule;
    if schedule.slots.is_empty() {
        return Err(ConfigError::ValidationError(
            "schedule.slots cannot be empty".to_string(),
        ));
    }
    if schedule.items_per_day == 0 {
        return Err(ConfigError::ValidationError(
            "schedule.items_per_day must be at least 1".to_string(),
        ));
    }
    if schedule.items_per_day as usize > schedule.slots.len() {
        return Err(ConfigError::ValidationError(format!(
            "schedule.items_per_day ({}) cannot exceed the number of slots ({})",
            schedule.items_per_day,
            schedule.slots.len()
        )));
    }

    let publisher = &config.publisher;
    if publisher.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "publisher.poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if publisher.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "publisher.timeout_secs cannot be 0".to_string(),
        ));
    }
    if publisher.backend == PublisherBackend::Webhook {
        match publisher.webhook {
            Some(ref webhook) if !webhook.url.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::ValidationError(
                    "publisher.webhook.url is required when backend = \"webhook\"".to_string(),
                ))
            }
        }
    }

    let generator = &config.generator;
    if generator.max_batch == 0 {
        return Err(ConfigError::ValidationError(
            "generator.max_batch must be at least 1".to_string(),
        ));
    }
    if generator.backend == GeneratorBackend::Webhook {
        if generator.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "generator.timeout_secs cannot be 0".to_string(),
            ));
        }
        if generator.categories.is_empty() || generator.kinds.is_empty() {
            return Err(ConfigError::ValidationError(
                "generator.categories and generator.kinds cannot be empty".to_string(),
            ));
        }
        match generator.webhook {
            Some(ref webhook) if !webhook.url.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::ValidationError(
                    "generator.webhook.url is required when backend = \"webhook\"".to_string(),
                ))
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::WebhookConfig;
    use crate::schedule::TimeSlot;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_schedule() {
        let mut config = Config::default();
        config.schedule.slots.clear();
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.schedule.items_per_day = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.schedule.slots = vec![TimeSlot::UsMorning];
        config.schedule.items_per_day = 2;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_webhook_backend() {
        let mut config = Config::default();
        config.publisher.backend = PublisherBackend::Webhook;
        assert!(validate_config(&config).is_err());

        config.publisher.webhook = Some(WebhookConfig {
            url: "http://hooks.local/post".to_string(),
            api_key: None,
        });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_generator() {
        let mut config = Config::default();
        config.generator.max_batch = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.generator.backend = GeneratorBackend::Webhook;
        assert!(validate_config(&config).is_err());

        config.generator.webhook = Some(WebhookConfig {
            url: "http://gen.local/generate".to_string(),
            api_key: None,
        });
        assert!(validate_config(&config).is_ok());

        config.generator.kinds.clear();
        assert!(validate_config(&config).is_err());
    }
}
