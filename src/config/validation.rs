use crate::config::types::{ClassifierConfig, Config, DedupConfig, ExtractConfig, FetchConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_extract_config(&config.extract)?;
    validate_dedup_config(&config.dedup)?;
    validate_classifier_config(&config.classifier)?;
    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "fetch timeout_ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    if config.default_selector.trim().is_empty() {
        return Err(ConfigError::Validation(
            "default_selector cannot be empty".to_string(),
        ));
    }

    if scraper::Selector::parse(&config.default_selector).is_err() {
        return Err(ConfigError::Validation(format!(
            "default_selector '{}' is not a valid CSS selector",
            config.default_selector
        )));
    }

    if config.min_text_length == 0 {
        return Err(ConfigError::Validation(
            "min_text_length must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_dedup_config(config: &DedupConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&config.threshold) {
        return Err(ConfigError::Validation(format!(
            "dedup threshold must be between 0 and 1, got {}",
            config.threshold
        )));
    }

    Ok(())
}

fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid classifier endpoint: {}", e)))?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if config.batch_size < 1 || config.batch_size > 100 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and 100, got {}",
            config.batch_size
        )));
    }

    if config.initial_backoff_exponent > 16 {
        return Err(ConfigError::Validation(format!(
            "initial_backoff_exponent must be <= 16, got {}",
            config.initial_backoff_exponent
        )));
    }

    Ok(())
}
