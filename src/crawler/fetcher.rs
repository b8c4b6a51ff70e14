//! HTTP fetcher implementation
//!
//! This module handles item-page requests for the crawler, including:
//! - Building HTTP clients with the configured outbound headers
//! - One bounded GET per candidate (no retry)
//! - Classifying failures so they can be reported per item

use crate::config::{FetchConfig, HeadersConfig};
use crate::crawler::parser::parse_product;
use crate::state::{CandidateLink, ProductRecord};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a detail fetch produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The request did not complete within the timeout
    Timeout,
    /// Connection, DNS, TLS or other transport failure
    Network,
    /// The server answered with an error status
    Status(u16),
    /// The response body could not be read
    Body,
    /// A field extraction failed
    Parse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Network => write!(f, "network error"),
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Body => write!(f, "body error"),
            Self::Parse => write!(f, "parse error"),
        }
    }
}

/// A failed detail fetch for one candidate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} for {url}: {message}")]
pub struct FetchFailure {
    /// Candidate URL
    pub url: String,
    /// Failure class
    pub kind: FailureKind,
    /// Causal description
    pub message: String,
}

impl FetchFailure {
    pub fn new(url: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Builds an HTTP client with the configured outbound headers
///
/// # Arguments
///
/// * `headers` - User agent and language preference
/// * `timeout` - Whole-request timeout, body included
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::HeadersConfig;
/// use catalog_harvest::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&HeadersConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(headers: &HeadersConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    // Validated at config load; an invalid value is simply not sent
    if let Ok(language) = HeaderValue::from_str(&headers.accept_language) {
        default_headers.insert(ACCEPT_LANGUAGE, language);
    }

    Client::builder()
        .user_agent(headers.user_agent.as_str())
        .default_headers(default_headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Stateless fetch-and-parse of one item page
///
/// Safe to share between workers; every call is independent.
#[derive(Debug, Clone)]
pub struct DetailFetcher {
    client: Client,
    currency_markers: Vec<String>,
}

impl DetailFetcher {
    /// Creates a fetcher with its own client built from the configuration
    pub fn from_config(fetch: &FetchConfig, headers: &HeadersConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(headers, Duration::from_secs(fetch.request_timeout_secs))?;
        Ok(Self::new(client, fetch.currency_markers.clone()))
    }

    /// Creates a fetcher around an existing client
    ///
    /// The client's timeout bounds each fetch.
    pub fn new(client: Client, currency_markers: Vec<String>) -> Self {
        Self {
            client,
            currency_markers,
        }
    }

    /// Fetches and parses one candidate
    ///
    /// Makes exactly one request. Every transport, timeout, status, body and
    /// extraction problem comes back as a [`FetchFailure`]; nothing else
    /// escapes. A record with an empty title is still returned.
    pub async fn fetch(&self, link: &CandidateLink) -> Result<ProductRecord, FetchFailure> {
        let url = &link.url;

        let page_url = Url::parse(url)
            .map_err(|e| FetchFailure::new(url, FailureKind::Parse, format!("bad URL: {}", e)))?;

        let response = self
            .client
            .get(page_url.clone())
            .send()
            .await
            .map_err(|e| classify_transport_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::new(
                url,
                FailureKind::Status(status.as_u16()),
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            ));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchFailure::new(url, FailureKind::Timeout, "Request timeout while reading body")
            } else {
                FetchFailure::new(url, FailureKind::Body, e.to_string())
            }
        })?;

        let record = parse_product(&body, &page_url, &self.currency_markers)
            .into_record(url)
            .map_err(|e| FetchFailure::new(url, FailureKind::Parse, e))?;

        tracing::trace!("Parsed {}: title={:?} price={:?}", url, record.title, record.price);

        Ok(record)
    }
}

/// Maps a reqwest send error onto a failure class
fn classify_transport_error(url: &str, error: &reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::new(url, FailureKind::Timeout, "Request timeout")
    } else if error.is_connect() {
        FetchFailure::new(url, FailureKind::Network, format!("Connection failed: {}", error))
    } else {
        FetchFailure::new(url, FailureKind::Network, error.to_string())
    }
}
