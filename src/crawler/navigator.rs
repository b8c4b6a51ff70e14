//! Listing traversal (phase 1)
//!
//! The navigator walks listing pages 1..=max_pages through one
//! [`ListingSession`], collecting item links into a [`LinkSet`]. Per page it
//! steps through NAVIGATE → DISMISS_OVERLAY → SETTLE → WAIT_FOR_CONTENT →
//! EXTRACT → ADVANCE, or leaves early through ADVANCE/STOP when the page is
//! unavailable.

use crate::config::{ListingConfig, MissPolicy};
use crate::crawler::pacing::Pacer;
use crate::crawler::session::{ListingSession, OverlayOutcome};
use crate::state::{CandidateLink, FrozenLinks, LinkSet, NavStep};
use crate::url::{listing_page_url, normalize_url, resolve_link};
use crate::HarvestError;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// What a single listing page produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Item links were found
    Content {
        /// Anchors matched on the page
        found: usize,
        /// Links that were not already in the set
        added: usize,
    },
    /// The page loaded but item links never appeared
    Unavailable(String),
    /// The page could not be loaded at all
    LoadFailed(String),
}

/// Summary of a finished traversal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Pages the navigator tried to load
    pub pages_attempted: u32,
    /// Pages that loaded, with or without item links
    pub pages_loaded: u32,
    /// Pages that yielded item links
    pub pages_with_content: u32,
    /// True if the traversal stopped before `max_pages`
    pub stopped_early: bool,
}

/// Drives one listing session across the configured pages
pub struct PageNavigator {
    session: Box<dyn ListingSession>,
    config: ListingConfig,
    settle: Pacer,
    links: LinkSet,
    step: NavStep,
    stats: TraversalStats,
}

impl PageNavigator {
    /// Creates a navigator that owns `session` for the traversal
    ///
    /// The settle pause is drawn from `config.settle_delay_ms`.
    pub fn new(session: Box<dyn ListingSession>, config: ListingConfig) -> Self {
        let [settle_min, settle_max] = config.settle_delay_ms;
        Self::with_pacer(session, config, Pacer::random(settle_min, settle_max))
    }

    /// Creates a navigator with an explicit settle pacer
    pub fn with_pacer(session: Box<dyn ListingSession>, config: ListingConfig, settle: Pacer) -> Self {
        Self {
            session,
            config,
            settle,
            links: LinkSet::new(),
            step: NavStep::Advance,
            stats: TraversalStats::default(),
        }
    }

    /// Current step of the state machine
    pub fn step(&self) -> NavStep {
        self.step
    }

    /// Statistics of the traversal so far
    pub fn stats(&self) -> &TraversalStats {
        &self.stats
    }

    /// Walks the listing and returns the frozen candidate set
    ///
    /// The session is opened first and closed at the end, including after an
    /// early stop or a fatal error. Soft page failures only shrink the result.
    ///
    /// # Returns
    ///
    /// * `Ok(FrozenLinks)` - Candidates in discovery order (possibly empty)
    /// * `Err(HarvestError::NavigationFailed)` - Not a single page could be loaded
    /// * `Err(HarvestError)` - The session could not be opened
    pub async fn traverse(&mut self) -> Result<FrozenLinks, HarvestError> {
        self.session.open().await?;
        tracing::debug!("Opened {} listing session", self.session.name());

        let result = self.walk().await;

        if let Err(e) = self.session.close().await {
            tracing::warn!("Failed to close listing session: {}", e);
        }

        result?;
        Ok(std::mem::take(&mut self.links).freeze())
    }

    async fn walk(&mut self) -> Result<(), HarvestError> {
        let max_pages = self.config.max_pages;
        let mut consecutive_misses = 0u32;
        let mut last_error = String::from("no pages attempted");

        for page in 1..=max_pages {
            self.step_to(NavStep::Navigate)?;
            tracing::info!("[PAGE] {}", page);
            self.stats.pages_attempted += 1;

            let outcome = self.visit(page).await?;

            match &outcome {
                PageOutcome::Content { found, added } => {
                    consecutive_misses = 0;
                    self.stats.pages_with_content += 1;
                    tracing::info!(
                        "Page {}: {} item links ({} new), collected so far: {}",
                        page,
                        found,
                        added,
                        self.links.len()
                    );
                }
                PageOutcome::Unavailable(reason) | PageOutcome::LoadFailed(reason) => {
                    consecutive_misses += 1;
                    tracing::warn!("Page {} unavailable: {}", page, reason);
                    last_error = reason.clone();
                }
            }

            let exhausted = self.config.on_missing == MissPolicy::Stop
                && consecutive_misses >= self.config.max_consecutive_misses.max(1);

            if exhausted {
                tracing::info!(
                    "Stopping after {} consecutive unavailable pages",
                    consecutive_misses
                );
                self.stats.stopped_early = page < max_pages;
                self.step_to(NavStep::Stop)?;
                break;
            }

            self.step_to(NavStep::Advance)?;
        }

        if self.step != NavStep::Stop {
            self.step_to(NavStep::Stop)?;
        }

        if self.stats.pages_attempted > 0 && self.stats.pages_loaded == 0 {
            return Err(HarvestError::NavigationFailed {
                attempted: self.stats.pages_attempted,
                last_error,
            });
        }

        Ok(())
    }

    /// Runs one page through the per-page steps
    ///
    /// Leaves the state machine at `Navigate`, `WaitForContent` or `Extract`;
    /// the caller decides between `Advance` and `Stop`.
    async fn visit(&mut self, page: u32) -> Result<PageOutcome, HarvestError> {
        let page_url = listing_page_url(&self.config.url_template, page)?;

        if let Err(e) = self.session.goto(&page_url).await {
            return Ok(PageOutcome::LoadFailed(e.to_string()));
        }
        self.stats.pages_loaded += 1;

        self.step_to(NavStep::DismissOverlay)?;
        self.dismiss_overlay().await;

        self.step_to(NavStep::Settle)?;
        let settled = self.settle.pause().await;
        tracing::trace!("Settled page {} for {:?}", page, settled);

        self.step_to(NavStep::WaitForContent)?;
        let wait = Duration::from_millis(self.config.content_timeout_ms);
        let waited = timeout(wait, self.session.wait_for_links(&self.config.link_selector)).await;
        let hrefs = match waited {
            Ok(Ok(hrefs)) if !hrefs.is_empty() => hrefs,
            Ok(Ok(_)) => return Ok(PageOutcome::Unavailable("no item links on page".to_string())),
            Ok(Err(e)) => return Ok(PageOutcome::Unavailable(e.to_string())),
            Err(_) => {
                return Ok(PageOutcome::Unavailable(format!(
                    "item links did not appear within {:?}",
                    wait
                )))
            }
        };

        self.step_to(NavStep::Extract)?;
        let base = self.session.current_url().cloned().unwrap_or(page_url);
        let added = self.extract(page, &base, &hrefs);

        Ok(PageOutcome::Content {
            found: hrefs.len(),
            added,
        })
    }

    /// Single bounded attempt at the interstitial; every outcome is ignorable
    async fn dismiss_overlay(&mut self) {
        let Some(selector) = self.config.overlay_selector.clone() else {
            return;
        };

        let wait = Duration::from_millis(self.config.overlay_timeout_ms);
        let outcome = match timeout(wait, self.session.dismiss_overlay(&selector)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => OverlayOutcome::Failed(e.to_string()),
            Err(_) => OverlayOutcome::TimedOut,
        };

        tracing::debug!("Overlay '{}': {:?}", selector, outcome);
    }

    /// Resolves, normalizes and inserts hrefs; returns how many were new
    fn extract(&mut self, page: u32, base: &Url, hrefs: &[String]) -> usize {
        let mut added = 0;

        for href in hrefs {
            let Some(absolute) = resolve_link(href, base) else {
                tracing::trace!("Skipping unresolvable href {}", href);
                continue;
            };

            let normalized = match normalize_url(absolute.as_str()) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Failed to normalize {}: {}", absolute, e);
                    continue;
                }
            };

            if self.links.insert(CandidateLink::new(normalized.as_str(), page)) {
                added += 1;
            }
        }

        added
    }

    fn step_to(&mut self, next: NavStep) -> Result<(), HarvestError> {
        if !self.step.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.step,
                to: next,
            });
        }
        tracing::trace!("Navigator {} -> {}", self.step, next);
        self.step = next;
        Ok(())
    }
}
