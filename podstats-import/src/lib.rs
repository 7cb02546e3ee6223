//! podstats-import library interface
//!
//! Turns podcast download-log workbooks into a deduplicated SQLite store.
//! Exposed as a library for the `podstats` binary and integration tests.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::db::{PodcastStore, StoreSummary, TopQuery};
pub use crate::error::{ImportError, ImportResult};
pub use crate::models::ImportSummary;
pub use crate::workflow::{import_workbook, ImportOptions, Pipeline};
