//! Import workflow
//!
//! One run reads a workbook into memory, normalizes and deduplicates its
//! rows, builds a fresh store beside the target and swaps it in, then writes
//! the audit ledgers.

pub mod pipeline;

pub use pipeline::{import_workbook, staging_path, ImportOptions, Pipeline};
