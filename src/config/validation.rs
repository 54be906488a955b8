use crate::config::types::{Config, OutputConfig, ScraperConfig, SelectorConfig, UserAgentConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

/// Compiles a CSS selector, naming the config key on failure
pub fn compile_selector(name: &str, rule: &str) -> Result<Selector, ConfigError> {
    Selector::parse(rule).map_err(|e| ConfigError::InvalidSelector {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Validates scraper configuration
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > 100 {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and 100, got {}",
            config.max_workers
        )));
    }

    if config.max_jitter_ms > 10_000 {
        return Err(ConfigError::Validation(format!(
            "max_jitter_ms must be <= 10000ms, got {}ms",
            config.max_jitter_ms
        )));
    }

    if config.fetch_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "fetch_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_sink_failures < 1 {
        return Err(ConfigError::Validation(
            "max_sink_failures must be >= 1".to_string(),
        ));
    }

    validate_http_url("listing_url", &config.listing_url)?;
    validate_http_url("origin", &config.origin)?;

    Ok(())
}

/// Validates that a URL parses and uses an HTTP(S) scheme
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent cannot be empty".to_string(),
        ));
    }

    // Must be a legal header value
    if config.value.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "user agent cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty".to_string(),
        ));
    }

    if config.log_path.is_empty() {
        return Err(ConfigError::Validation(
            "log_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every selector rule compiles
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    for (name, rule) in config.entries() {
        if rule.trim().is_empty() {
            return Err(ConfigError::InvalidSelector {
                name: name.to_string(),
                message: "selector cannot be empty".to_string(),
            });
        }
        compile_selector(name, rule)?;
    }
    Ok(())
}
