use serde::Deserialize;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub listing: ListingConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub headers: HeadersConfig,
    pub output: OutputConfig,
}

/// Listing traversal (phase 1) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    /// Listing URL with a `{page}` placeholder for the 1-based page index
    #[serde(rename = "url-template")]
    pub url_template: String,

    /// Number of listing pages to visit at most
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// CSS selector for item-link anchors
    #[serde(rename = "link-selector", default = "default_link_selector")]
    pub link_selector: String,

    /// CSS selector for the login/overlay close button, if the site shows one
    #[serde(rename = "overlay-selector", default)]
    pub overlay_selector: Option<String>,

    /// Bounded wait for the overlay (milliseconds)
    #[serde(rename = "overlay-timeout-ms", default = "default_overlay_timeout")]
    pub overlay_timeout_ms: u64,

    /// Bounded wait for item-link anchors to appear (milliseconds)
    #[serde(rename = "content-timeout-ms", default = "default_content_timeout")]
    pub content_timeout_ms: u64,

    /// Random pause range applied after a page is loaded, before extraction
    #[serde(rename = "settle-delay-ms", default)]
    pub settle_delay_ms: [u64; 2],

    /// What to do when a page shows no item links
    #[serde(rename = "on-missing", default)]
    pub on_missing: MissPolicy,

    /// Consecutive unavailable pages that end the traversal under `stop`
    #[serde(
        rename = "max-consecutive-misses",
        default = "default_max_consecutive_misses"
    )]
    pub max_consecutive_misses: u32,

    /// Which engine renders listing pages
    #[serde(default)]
    pub renderer: Renderer,

    /// Base URL of the Browserless service (renderer = "browserless")
    #[serde(rename = "browserless-url", default)]
    pub browserless_url: Option<String>,

    /// Optional Browserless API token
    #[serde(rename = "browserless-token", default)]
    pub browserless_token: Option<String>,
}

/// Policy for listing pages that yield no item links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissPolicy {
    /// Stop after `max-consecutive-misses` unavailable pages in a row
    #[default]
    Stop,
    /// Keep going until `max-pages`
    Skip,
}

/// Rendering engine for listing pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Renderer {
    /// Plain HTTP GET of the static HTML
    #[default]
    Http,
    /// Fully rendered HTML through a Browserless `/content` endpoint
    Browserless,
}

/// Detail fetch (phase 2) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Worker pool width
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Lower bound of the per-worker pause after each task (milliseconds)
    #[serde(rename = "delay-min-ms", default = "default_delay_min")]
    pub delay_min_ms: u64,

    /// Upper bound of the per-worker pause after each task (milliseconds)
    #[serde(rename = "delay-max-ms", default = "default_delay_max")]
    pub delay_max_ms: u64,

    /// Text fragments that mark a price (e.g. "₹", "$")
    #[serde(rename = "currency-markers", default = "default_currency_markers")]
    pub currency_markers: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            request_timeout_secs: default_request_timeout(),
            delay_min_ms: default_delay_min(),
            delay_max_ms: default_delay_max(),
            currency_markers: default_currency_markers(),
        }
    }
}

/// Outbound request headers
#[derive(Debug, Clone, Deserialize)]
pub struct HeadersConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the CSV snapshot
    pub path: String,

    /// Completed tasks between checkpoints
    #[serde(rename = "checkpoint-interval", default = "default_checkpoint_interval")]
    pub checkpoint_interval: u32,
}

fn default_link_selector() -> String {
    "a[href*='/p/']".to_string()
}

fn default_overlay_timeout() -> u64 {
    3_000
}

fn default_content_timeout() -> u64 {
    20_000
}

fn default_max_consecutive_misses() -> u32 {
    2
}

fn default_concurrency() -> u32 {
    10
}

fn default_request_timeout() -> u64 {
    10
}

fn default_delay_min() -> u64 {
    200
}

fn default_delay_max() -> u64 {
    500
}

fn default_currency_markers() -> Vec<String> {
    vec!["₹".to_string()]
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_checkpoint_interval() -> u32 {
    20
}
