//! CSV snapshot checkpointer
//!
//! Each flush writes the whole table to a temporary file next to the
//! destination and renames it into place, so a reader never observes a
//! half-written snapshot.

use crate::output::traits::{Checkpointer, OutputError, OutputResult};
use crate::state::ProductRecord;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes snapshots as CSV with columns `title,price,image,link`
#[derive(Debug, Clone)]
pub struct CsvCheckpointer {
    path: PathBuf,
}

impl CsvCheckpointer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling path the snapshot is staged in before the rename
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".partial");
        self.path.with_file_name(name)
    }

    fn write_snapshot(&self, records: &[ProductRecord]) -> OutputResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let staging = self.staging_path();
        let file = File::create(&staging)?;

        let mut writer = csv::Writer::from_writer(file);
        if records.is_empty() {
            writer.write_record(["title", "price", "image", "link"])?;
        }
        for record in records {
            writer.serialize(record)?;
        }

        let mut file = writer
            .into_inner()
            .map_err(|e| OutputError::Io(e.into_error()))?;
        file.flush()?;
        file.sync_all()?;
        drop(file);

        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl Checkpointer for CsvCheckpointer {
    fn flush(&mut self, records: &[ProductRecord]) -> OutputResult<()> {
        self.write_snapshot(records).map_err(|e| {
            // Do not leave a stale staging file behind
            let _ = fs::remove_file(self.staging_path());
            OutputError::Write {
                path: self.path.display().to_string(),
                message: e.to_string(),
            }
        })?;

        tracing::debug!(
            "Checkpoint: {} records written to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }
}

/// Reads a CSV snapshot back into records, in file order
pub fn read_snapshot(path: &Path) -> OutputResult<Vec<ProductRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize::<ProductRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}
