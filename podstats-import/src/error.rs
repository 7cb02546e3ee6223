//! Error types for podstats-import

use std::path::PathBuf;
use thiserror::Error;

/// Run-level import failure
///
/// Per-row anomalies are never errors; they end up in the audit ledgers.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Store already exists and overwrite was not requested
    #[error("Database already exists at {}; pass --overwrite-db to replace it", path.display())]
    StoreExists { path: PathBuf },

    /// Workbook could not be opened or parsed
    #[error("Failed to read workbook {}: {reason}", path.display())]
    Workbook { path: PathBuf, reason: String },

    /// File extension is not a known spreadsheet format
    #[error("Unsupported workbook format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// podstats-common error
    #[error("Common error: {0}")]
    Common(#[from] podstats_common::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Audit ledger write failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type ImportResult<T> = std::result::Result<T, ImportError>;
