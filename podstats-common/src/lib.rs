//! # podstats common library
//!
//! Shared code for the podstats crates:
//! - Error and result types
//! - Bootstrap configuration (CLI, environment, TOML, compiled defaults)
//! - SQLite store initialization and the `podcasts` table schema

pub mod config;
pub mod db;
pub mod error;

pub use config::{DedupPolicy, Settings};
pub use error::{Error, Result};
