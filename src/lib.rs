//! Catalog-Harvest: a two-phase product listing crawler
//!
//! This crate walks a paginated product listing to collect candidate item
//! links, then fetches and extracts each item with a bounded worker pool,
//! checkpointing the accumulated records to a CSV snapshot as it goes.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Harvest operations
///
/// Only conditions that abort a run end up here. Per-page and per-item
/// failures are soft and are reported through [`crawler::Report`] instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("No listing page could be loaded ({attempted} attempted): {last_error}")]
    NavigationFailed { attempted: u32, last_error: String },

    #[error("Listing session error: {0}")]
    Session(String),

    #[error("Invalid navigation step: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::NavStep,
        to: state::NavStep,
    },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Listing template has no {{page}} placeholder: {0}")]
    MissingPlaceholder(String),
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{harvest, Report};
pub use state::{CandidateLink, FrozenLinks, LinkSet, ProductRecord};
pub use url::{listing_page_url, normalize_url};
