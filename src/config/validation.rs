use crate::config::types::{Config, CrawlConfig};
use crate::url::ScopeSet;
use crate::ConfigError;
use std::time::Duration;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    Ok(())
}

/// Validates crawl configuration
///
/// Rejects configurations that can never make progress (zero concurrency,
/// no seeds, no allowed domains) or that carry unusable values (unparseable
/// URLs, non-http(s) seeds, a zero or oversized timeout, a negative delay).
/// A seed whose network location lies outside the allow-list is permitted,
/// since fetches themselves are never domain-filtered, but it is logged as
/// a warning.
pub fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be >= 1, got {}",
            config.concurrency
        )));
    }

    if !config.request_timeout_secs.is_finite() || config.request_timeout_secs <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be a positive number, got {}",
            config.request_timeout_secs
        )));
    }

    // A finite, positive value can still exceed what Duration can hold.
    if Duration::try_from_secs_f64(config.request_timeout_secs).is_err() {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs is too large, got {}",
            config.request_timeout_secs
        )));
    }

    if !config.post_load_delay_secs.is_finite() || config.post_load_delay_secs < 0.0 {
        return Err(ConfigError::Validation(format!(
            "post-load-delay-secs must be >= 0, got {}",
            config.post_load_delay_secs
        )));
    }

    if Duration::try_from_secs_f64(config.post_load_delay_secs).is_err() {
        return Err(ConfigError::Validation(format!(
            "post-load-delay-secs is too large, got {}",
            config.post_load_delay_secs
        )));
    }

    if config.post_load_delay_secs >= config.request_timeout_secs {
        tracing::warn!(
            "post-load-delay-secs ({}) is not below request-timeout-secs ({}); every fetch will time out",
            config.post_load_delay_secs,
            config.request_timeout_secs
        );
    }

    if config.start_urls.is_empty() {
        return Err(ConfigError::Validation(
            "at least one start URL is required".to_string(),
        ));
    }

    if config.allowed_domains.is_empty() {
        return Err(ConfigError::Validation(
            "at least one allowed domain is required".to_string(),
        ));
    }

    // Parses every allow-list entry; errors surface here rather than mid-crawl
    let scope = ScopeSet::from_allowed(&config.allowed_domains)?;

    for seed in &config.start_urls {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", seed, e)))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "Start URL '{}' must use http or https, got '{}'",
                    seed, other
                )));
            }
        }

        if !scope.contains(&url) {
            tracing::warn!(
                "Start URL {} is outside the allowed domains; links found on it will be filtered",
                seed
            );
        }
    }

    Ok(())
}
