//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `NavStep`: Step of the listing traversal state machine
//! - `LinkSet` / `FrozenLinks`: Deduplicated candidate links, mutable in phase 1 and read-only after
//! - `ProductRecord`: One extracted item
//! - `CrawlState`: Result list and counters owned by the orchestrator in phase 2

mod crawl_state;
mod link_set;
mod nav_step;
mod record;

// Re-export main types
pub use crawl_state::{CrawlState, Ingested};
pub use link_set::{CandidateLink, FrozenLinks, LinkSet};
pub use nav_step::NavStep;
pub use record::ProductRecord;
