//! Checkpointer trait and output errors
//!
//! This module defines the interface the orchestrator uses to persist the
//! current result set.

use crate::state::ProductRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write snapshot to {path}: {message}")]
    Write { path: String, message: String },

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Persists full snapshots of the result set
///
/// Each flush replaces the previous snapshot entirely. A failed flush leaves
/// the previous snapshot in place, and later flushes may still succeed.
///
/// `flush` is synchronous and may block on file I/O. The harvester runs it on
/// tokio's blocking pool, never directly on a runtime worker.
pub trait Checkpointer: Send {
    /// Writes `records` as the new snapshot
    ///
    /// # Arguments
    ///
    /// * `records` - Every record retained so far, in completion order
    fn flush(&mut self, records: &[ProductRecord]) -> OutputResult<()>;

    /// Human-readable destination for logs and reports
    fn destination(&self) -> String;
}
