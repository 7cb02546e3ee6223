//! Data models for the import pipeline

pub mod import_result;
pub mod record;
pub mod workbook;

pub use import_result::{DuplicateLogEntry, ImportSummary, SkipLogEntry, UpsertOutcome};
pub use record::{eq_full, DedupKey, ExtractedMetadata, Feature, NormalizedRecord, PersistedEpisode};
pub use workbook::{CellValue, RawRow, Sheet, Workbook};
