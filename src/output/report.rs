//! End-of-run report
//!
//! This module provides the summary returned by a harvest and a formatted
//! printer for it.

use crate::crawler::{FailureKind, FetchFailure, TraversalStats};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// How many individual failures are listed before the printer summarizes
const MAX_LISTED_FAILURES: usize = 20;

/// Summary of one harvest run
#[derive(Debug, Clone)]
pub struct Report {
    /// Distinct candidate links collected from the listing
    pub total_candidates: usize,

    /// Records in the final snapshot
    pub total_records: usize,

    /// Detail fetches that produced no record
    pub failures: Vec<FetchFailure>,

    /// Records fetched but not retained (empty title, unknown or repeated link)
    pub dropped: usize,

    /// Listing traversal counters
    pub traversal: TraversalStats,

    /// Snapshots written successfully, final one included
    pub checkpoints_written: usize,

    /// Intermediate snapshots that failed to write
    pub checkpoint_failures: usize,

    /// Set when the final snapshot could not be written
    pub final_flush_error: Option<String>,

    /// Where snapshots were written
    pub destination: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Report {
    /// Returns true if no fetch failed and the final snapshot was written
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.final_flush_error.is_none()
    }

    /// Wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Failure counts grouped by kind label
    pub fn failures_by_kind(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            let label = match failure.kind {
                FailureKind::Status(_) => "http status".to_string(),
                other => other.to_string(),
            };
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }
}

/// Prints a report to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report to display
pub fn print_report(report: &Report) {
    println!("=== Harvest Report ===\n");

    println!("Listing:");
    println!(
        "  Pages loaded: {} / {} attempted",
        report.traversal.pages_loaded, report.traversal.pages_attempted
    );
    println!(
        "  Pages with items: {}",
        report.traversal.pages_with_content
    );
    if report.traversal.stopped_early {
        println!("  Traversal stopped early");
    }
    println!("  Candidate links: {}", report.total_candidates);
    println!();

    println!("Details:");
    println!("  Records kept: {}", report.total_records);
    println!("  Records dropped: {}", report.dropped);
    println!("  Failed fetches: {}", report.failures.len());
    println!();

    if !report.failures.is_empty() {
        println!("Failures by Kind:");
        for (kind, count) in report.failures_by_kind() {
            println!("  {}: {}", kind, count);
        }
        println!();

        println!("Failed Links:");
        for failure in report.failures.iter().take(MAX_LISTED_FAILURES) {
            println!("  - {}", failure);
        }
        if report.failures.len() > MAX_LISTED_FAILURES {
            println!(
                "  ... and {} more",
                report.failures.len() - MAX_LISTED_FAILURES
            );
        }
        println!();
    }

    println!("Output: {}", report.destination);
    println!("  Snapshots written: {}", report.checkpoints_written);
    if report.checkpoint_failures > 0 {
        println!("  Snapshots failed: {}", report.checkpoint_failures);
    }
    if let Some(err) = &report.final_flush_error {
        println!("  Final snapshot FAILED: {}", err);
    }
    println!();

    let success_rate = if report.total_candidates > 0 {
        (report.total_records as f64 / report.total_candidates as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Success Rate: {:.1}% ({} / {} candidates kept) in {}s",
        success_rate,
        report.total_records,
        report.total_candidates,
        report.duration_seconds()
    );
}
