use crate::config::types::{
    Config, FetchConfig, HeadersConfig, ListingConfig, OutputConfig, Renderer,
};
use crate::url::listing_page_url;
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_listing_config(&config.listing)?;
    validate_fetch_config(&config.fetch)?;
    validate_headers_config(&config.headers)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates listing traversal configuration
fn validate_listing_config(config: &ListingConfig) -> Result<(), ConfigError> {
    // The template must expand into an absolute http(s) URL
    listing_page_url(&config.url_template, 1)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid url-template: {}", e)))?;

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_consecutive_misses < 1 {
        return Err(ConfigError::Validation(format!(
            "max_consecutive_misses must be >= 1, got {}",
            config.max_consecutive_misses
        )));
    }

    if config.content_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "content_timeout_ms must be > 0".to_string(),
        ));
    }

    let [settle_min, settle_max] = config.settle_delay_ms;
    if settle_min > settle_max {
        return Err(ConfigError::Validation(format!(
            "settle_delay_ms lower bound {}ms exceeds upper bound {}ms",
            settle_min, settle_max
        )));
    }

    validate_selector(&config.link_selector)?;
    if let Some(overlay) = &config.overlay_selector {
        validate_selector(overlay)?;
    }

    if config.renderer == Renderer::Browserless {
        let endpoint = config.browserless_url.as_deref().ok_or_else(|| {
            ConfigError::Validation(
                "browserless_url is required when renderer = \"browserless\"".to_string(),
            )
        })?;
        Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid browserless_url: {}", e)))?;
    }

    Ok(())
}

/// Validates detail fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.delay_min_ms > config.delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "delay_min_ms ({}ms) must not exceed delay_max_ms ({}ms)",
            config.delay_min_ms, config.delay_max_ms
        )));
    }

    if config.currency_markers.iter().any(|m| m.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "currency_markers cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates outbound header configuration
fn validate_headers_config(config: &HeadersConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    // Header values must be visible ASCII
    for (name, value) in [
        ("user_agent", &config.user_agent),
        ("accept_language", &config.accept_language),
    ] {
        if reqwest::header::HeaderValue::from_str(value).is_err() {
            return Err(ConfigError::Validation(format!(
                "{} is not a valid header value: '{}'",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation("path cannot be empty".to_string()));
    }

    if config.checkpoint_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint_interval must be >= 1, got {}",
            config.checkpoint_interval
        )));
    }

    Ok(())
}

/// Checks that a CSS selector parses
fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            message: e.to_string(),
        })
}
