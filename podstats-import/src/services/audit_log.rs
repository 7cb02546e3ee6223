//! CSV audit ledgers for collapsed and rejected rows
//!
//! Each run rewrites its ledgers. A ledger is only written when the run
//! produced entries for it; otherwise a stale file from an earlier run is
//! removed so the directory never describes a different import.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ImportResult;
use crate::models::{DuplicateLogEntry, SkipLogEntry};

pub const DUPLICATE_LEDGER: &str = "duplicate_rows.csv";
pub const SKIP_LEDGER: &str = "skipped_rows.csv";

/// Ledger writer rooted at the audit directory
#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn duplicates_path(&self) -> PathBuf {
        self.dir.join(DUPLICATE_LEDGER)
    }

    pub fn skipped_path(&self) -> PathBuf {
        self.dir.join(SKIP_LEDGER)
    }

    /// Returns the ledger path when one was written
    pub fn write_duplicates(&self, entries: &[DuplicateLogEntry]) -> ImportResult<Option<PathBuf>> {
        write_ledger(&self.duplicates_path(), entries)
    }

    /// Returns the ledger path when one was written
    pub fn write_skipped(&self, entries: &[SkipLogEntry]) -> ImportResult<Option<PathBuf>> {
        write_ledger(&self.skipped_path(), entries)
    }
}

fn write_ledger<T: Serialize>(path: &Path, entries: &[T]) -> ImportResult<Option<PathBuf>> {
    if entries.is_empty() {
        if path.exists() {
            fs::remove_file(path)?;
            tracing::debug!(path = %path.display(), "Removed stale ledger");
        }
        return Ok(None);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;

    tracing::info!(path = %path.display(), entries = entries.len(), "Wrote audit ledger");
    Ok(Some(path.to_path_buf()))
}
