//! Deduplicated set of candidate links
//!
//! [`LinkSet`] is filled page by page during listing traversal and then
//! frozen into [`FrozenLinks`], which is shared read-only with the workers.

use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

/// A canonical item URL and the listing page it was first seen on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateLink {
    /// Normalized URL; the dedup key
    pub url: String,

    /// 1-based listing page index of the first discovery
    pub page: u32,
}

impl CandidateLink {
    pub fn new(url: impl Into<String>, page: u32) -> Self {
        Self {
            url: url.into(),
            page,
        }
    }
}

/// Insertion-ordered set of candidate links keyed by normalized URL
#[derive(Debug, Default)]
pub struct LinkSet {
    seen: HashSet<String>,
    items: Vec<CandidateLink>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a link, returning true if its URL was not already present
    ///
    /// The first discovery wins; a later page re-rendering the same URL does
    /// not change the recorded page index.
    pub fn insert(&mut self, link: CandidateLink) -> bool {
        if self.seen.contains(&link.url) {
            return false;
        }

        self.seen.insert(link.url.clone());
        self.items.push(link);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Snapshot of the links in discovery order
    pub fn items(&self) -> &[CandidateLink] {
        &self.items
    }

    /// Ends phase 1: no further inserts are possible after this
    pub fn freeze(self) -> FrozenLinks {
        FrozenLinks {
            links: self.items.into(),
            index: Arc::new(self.seen),
        }
    }
}

/// Read-only candidate set shared between the orchestrator and workers
///
/// Cloning is cheap; both halves are reference counted.
#[derive(Debug, Clone)]
pub struct FrozenLinks {
    links: Arc<[CandidateLink]>,
    index: Arc<HashSet<String>>,
}

impl FrozenLinks {
    pub fn contains(&self, url: &str) -> bool {
        self.index.contains(url)
    }
}

impl Deref for FrozenLinks {
    type Target = [CandidateLink];

    fn deref(&self) -> &Self::Target {
        &self.links
    }
}

impl Default for FrozenLinks {
    fn default() -> Self {
        LinkSet::new().freeze()
    }
}
