//! Output module for snapshots and run reports
//!
//! This module handles:
//! - Writing full CSV snapshots of the result set at checkpoints
//! - Summarizing a finished run in a [`Report`]

mod checkpoint;
mod report;
mod traits;

pub use checkpoint::{read_snapshot, CsvCheckpointer};
pub use report::{print_report, Report};
pub use traits::{Checkpointer, OutputError, OutputResult};
