//! Import pipeline stages

pub mod audit_log;
pub mod deduplicator;
pub mod metadata_extractor;
pub mod row_normalizer;
pub mod workbook_reader;

pub use audit_log::AuditLog;
pub use deduplicator::{DedupOutcome, Deduplicator};
pub use row_normalizer::{ColumnMap, RowNormalizer, RowOutcome};
pub use workbook_reader::load_workbook;
