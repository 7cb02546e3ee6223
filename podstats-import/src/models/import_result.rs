//! Import outcomes and audit ledger rows

use podstats_common::DedupPolicy;
use serde::Serialize;

/// A record collapsed into an earlier one with the same key
///
/// Carries the record's own values so the decision can be replayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateLogEntry {
    /// Normalized URL half of the composite key
    pub key_url: String,
    pub sheet: String,
    pub row: usize,
    /// URL as it appeared in the source row
    pub url: String,
    pub full: i64,
    pub partial: i64,
    pub avg_bandwidth: f64,
    pub total_bandwidth: f64,
    pub eq_full: f64,
    /// Source row of the record that was persisted for this key
    pub kept_row: usize,
    pub policy: String,
}

/// A row rejected by the admission check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipLogEntry {
    pub sheet: String,
    pub row: usize,
    pub url: String,
    pub full: String,
    pub partial: String,
    pub avg_bandwidth: String,
    pub total_bandwidth: String,
    pub reason: String,
}

/// Result of inserting episodes with insert-or-ignore
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    pub inserted: usize,
    /// Rows whose key was already present and left untouched
    pub ignored: usize,
}

/// Counts reported after every import
///
/// `total_rows == inserted + duplicates + skipped + already_present`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub already_present: usize,
    pub policy: DedupPolicy,
}

impl ImportSummary {
    pub fn is_balanced(&self) -> bool {
        self.inserted + self.duplicates + self.skipped + self.already_present == self.total_rows
    }
}

