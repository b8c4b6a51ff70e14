//! Crawler module for listing traversal and item fetching
//!
//! This module contains the core harvesting logic, including:
//! - Listing sessions and page-by-page traversal
//! - Item page fetching and field extraction
//! - Pacing of listing pages and detail workers
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod navigator;
mod pacing;
mod parser;
mod session;

pub use coordinator::{harvest, Harvester};
pub use fetcher::{build_http_client, DetailFetcher, FailureKind, FetchFailure};
pub use navigator::{PageNavigator, PageOutcome, TraversalStats};
pub use pacing::{DelayPolicy, FixedDelay, Pacer, RandomDelay, Sleeper, TokioSleeper};
pub use parser::{extract_hrefs, parse_product, Extraction, ParsedProduct};
pub use session::{build_session, BrowserlessSession, HttpSession, ListingSession, OverlayOutcome};

pub use crate::output::Report;
