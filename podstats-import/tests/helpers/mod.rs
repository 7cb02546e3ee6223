//! Test Helper Utilities
//!
//! Shared utilities for testing podstats-import

#![allow(dead_code, unused_imports)]

pub mod fixtures;
pub mod test_env;

pub use fixtures::{download_row, sheet, upload_url, write_csv, DEFAULT_HEADERS};
pub use test_env::TestEnv;
