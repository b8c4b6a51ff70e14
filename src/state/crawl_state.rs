//! Mutable aggregate of one harvest run
//!
//! Only the orchestrator's ingestion loop owns a [`CrawlState`]; workers hand
//! their outcomes over a channel and never see it.

use crate::crawler::FetchFailure;
use crate::state::{FrozenLinks, ProductRecord};
use std::collections::HashSet;

/// What happened to one completed task during ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    /// Record appended to the result list
    Retained,
    /// Fetched, but title or link was empty
    Dropped,
    /// A record for this link is already in the result list
    Duplicate,
    /// Record's link is not one of the candidates
    Unknown,
    /// The fetch failed; nothing to append
    Failed,
}

/// Candidate set, result list and counters for a single run
#[derive(Debug)]
pub struct CrawlState {
    candidates: FrozenLinks,
    records: Vec<ProductRecord>,
    record_links: HashSet<String>,
    failures: Vec<FetchFailure>,
    dropped: usize,
    completed: usize,
    checkpoint_interval: usize,
}

impl CrawlState {
    /// Creates the state for a run over a frozen candidate set
    ///
    /// A zero `checkpoint_interval` is treated as 1.
    pub fn new(candidates: FrozenLinks, checkpoint_interval: usize) -> Self {
        Self {
            candidates,
            records: Vec::new(),
            record_links: HashSet::new(),
            failures: Vec::new(),
            dropped: 0,
            completed: 0,
            checkpoint_interval: checkpoint_interval.max(1),
        }
    }

    /// Takes one completed task's outcome
    ///
    /// The completed counter advances for every outcome, retained or not.
    pub fn ingest(&mut self, outcome: Result<ProductRecord, FetchFailure>) -> Ingested {
        self.completed += 1;

        let record = match outcome {
            Ok(record) => record,
            Err(failure) => {
                self.failures.push(failure);
                return Ingested::Failed;
            }
        };

        if !record.is_retainable() {
            self.dropped += 1;
            return Ingested::Dropped;
        }

        if !self.candidates.contains(&record.link) {
            self.dropped += 1;
            return Ingested::Unknown;
        }

        if !self.record_links.insert(record.link.clone()) {
            self.dropped += 1;
            return Ingested::Duplicate;
        }

        self.records.push(record);
        Ingested::Retained
    }

    /// Returns true if the last ingest landed on a checkpoint boundary
    pub fn checkpoint_due(&self) -> bool {
        self.completed > 0 && self.completed % self.checkpoint_interval == 0
    }

    /// Retained records in completion order
    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn failures(&self) -> &[FetchFailure] {
        &self.failures
    }

    pub fn candidates(&self) -> &FrozenLinks {
        &self.candidates
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Returns true once every candidate has produced an outcome
    pub fn is_drained(&self) -> bool {
        self.completed >= self.candidates.len()
    }

    /// Consumes the state, handing back the failures for the final report
    pub fn into_failures(self) -> Vec<FetchFailure> {
        self.failures
    }
}
