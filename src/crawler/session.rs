//! Listing sessions
//!
//! A [`ListingSession`] is the stateful resource that loads listing pages
//! during traversal. It is opened and closed by the navigator and never
//! shared between tasks.
//!
//! Two sessions are provided:
//! - [`HttpSession`]: plain GET of the static HTML
//! - [`BrowserlessSession`]: fully rendered HTML from a Browserless
//!   `/content` endpoint

use crate::config::{HeadersConfig, ListingConfig, Renderer};
use crate::crawler::build_http_client;
use crate::crawler::parser::{extract_hrefs, has_match};
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Result of a single attempt to close an interstitial
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayOutcome {
    /// Nothing matched the overlay selector
    NotPresent,
    /// The overlay was closed
    Dismissed,
    /// The overlay is there but this session cannot interact with it
    Undismissable,
    /// The bounded wait ran out
    TimedOut,
    /// The attempt errored
    Failed(String),
}

/// A stateful, single-owner page loading session
#[async_trait]
pub trait ListingSession: Send {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Acquires whatever the session needs before the first page
    async fn open(&mut self) -> Result<(), HarvestError> {
        Ok(())
    }

    /// Loads `url` as the current page
    async fn goto(&mut self, url: &Url) -> Result<(), HarvestError>;

    /// URL of the current page after redirects, if one is loaded
    fn current_url(&self) -> Option<&Url>;

    /// Tries once to close the element matched by `selector`
    async fn dismiss_overlay(&mut self, selector: &str) -> Result<OverlayOutcome, HarvestError>;

    /// Raw hrefs of the anchors matched by `selector` on the current page
    ///
    /// An empty list means the content is not there (yet).
    async fn wait_for_links(&mut self, selector: &str) -> Result<Vec<String>, HarvestError>;

    /// Releases the session
    async fn close(&mut self) -> Result<(), HarvestError> {
        Ok(())
    }
}

/// Builds the session selected by `listing.renderer`
pub fn build_session(
    listing: &ListingConfig,
    headers: &HeadersConfig,
) -> Result<Box<dyn ListingSession>, HarvestError> {
    let timeout = Duration::from_millis(listing.content_timeout_ms);
    let client = build_http_client(headers, timeout)?;

    match listing.renderer {
        Renderer::Http => Ok(Box::new(HttpSession::new(client))),
        Renderer::Browserless => {
            let endpoint = listing.browserless_url.as_deref().ok_or_else(|| {
                HarvestError::Session("browserless renderer needs browserless-url".to_string())
            })?;
            Ok(Box::new(BrowserlessSession::new(
                client,
                endpoint,
                listing.browserless_token.as_deref(),
            )))
        }
    }
}

/// The page a session currently has loaded
#[derive(Debug, Clone)]
struct LoadedPage {
    url: Url,
    html: String,
}

impl LoadedPage {
    fn hrefs(&self, selector: &str) -> Result<Vec<String>, HarvestError> {
        extract_hrefs(&self.html, selector).map_err(HarvestError::Session)
    }

    fn overlay(&self, selector: &str) -> Result<OverlayOutcome, HarvestError> {
        // Static HTML offers nothing to click
        match has_match(&self.html, selector).map_err(HarvestError::Session)? {
            true => Ok(OverlayOutcome::Undismissable),
            false => Ok(OverlayOutcome::NotPresent),
        }
    }
}

fn no_page_loaded() -> HarvestError {
    HarvestError::Session("no page loaded".to_string())
}

/// Session that loads listing pages with a plain GET
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    page: Option<LoadedPage>,
}

impl HttpSession {
    pub fn new(client: Client) -> Self {
        Self { client, page: None }
    }
}

#[async_trait]
impl ListingSession for HttpSession {
    fn name(&self) -> &str {
        "http"
    }

    async fn goto(&mut self, url: &Url) -> Result<(), HarvestError> {
        self.page = None;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| HarvestError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Session(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        let final_url = response.url().clone();
        let html = response.text().await.map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })?;

        self.page = Some(LoadedPage {
            url: final_url,
            html,
        });
        Ok(())
    }

    fn current_url(&self) -> Option<&Url> {
        self.page.as_ref().map(|page| &page.url)
    }

    async fn dismiss_overlay(&mut self, selector: &str) -> Result<OverlayOutcome, HarvestError> {
        self.page.as_ref().ok_or_else(no_page_loaded)?.overlay(selector)
    }

    async fn wait_for_links(&mut self, selector: &str) -> Result<Vec<String>, HarvestError> {
        self.page.as_ref().ok_or_else(no_page_loaded)?.hrefs(selector)
    }

    async fn close(&mut self) -> Result<(), HarvestError> {
        self.page = None;
        Ok(())
    }
}

/// Session that asks a Browserless service for rendered HTML
#[derive(Debug)]
pub struct BrowserlessSession {
    client: Client,
    endpoint: String,
    token: Option<String>,
    page: Option<LoadedPage>,
}

impl BrowserlessSession {
    pub fn new(client: Client, base_url: &str, token: Option<&str>) -> Self {
        Self {
            client,
            endpoint: format!("{}/content", base_url.trim_end_matches('/')),
            token: token.map(String::from),
            page: None,
        }
    }
}

#[async_trait]
impl ListingSession for BrowserlessSession {
    fn name(&self) -> &str {
        "browserless"
    }

    async fn goto(&mut self, url: &Url) -> Result<(), HarvestError> {
        self.page = None;

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "url": url.as_str() }));
        if let Some(token) = &self.token {
            request = request.query(&[("token", token.as_str())]);
        }

        let response = request.send().await.map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(HarvestError::Session(format!(
                "Browserless returned HTTP {} for {}: {}",
                status.as_u16(),
                url,
                message.trim()
            )));
        }

        let html = response.text().await.map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })?;

        self.page = Some(LoadedPage {
            url: url.clone(),
            html,
        });
        Ok(())
    }

    fn current_url(&self) -> Option<&Url> {
        self.page.as_ref().map(|page| &page.url)
    }

    async fn dismiss_overlay(&mut self, selector: &str) -> Result<OverlayOutcome, HarvestError> {
        // The rendered snapshot is already detached from the browser
        self.page.as_ref().ok_or_else(no_page_loaded)?.overlay(selector)
    }

    async fn wait_for_links(&mut self, selector: &str) -> Result<Vec<String>, HarvestError> {
        self.page.as_ref().ok_or_else(no_page_loaded)?.hrefs(selector)
    }

    async fn close(&mut self) -> Result<(), HarvestError> {
        self.page = None;
        Ok(())
    }
}
