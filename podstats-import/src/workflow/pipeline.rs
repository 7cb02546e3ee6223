//! Import pipeline orchestrator
//!
//! # Stages
//! - **Load**: whole workbook into memory, before any store mutation
//! - **Normalize**: header resolution per sheet, typed records, admission check
//! - **Deduplicate**: per-run composite key, keep-first or aggregate
//! - **Persist**: schema and inserts in one transaction on a staging file,
//!   renamed over the target only after commit
//! - **Audit**: duplicate and skip ledgers
//!
//! # Example
//! ```rust,ignore
//! let pipeline = Pipeline::new(ImportOptions::from_settings(&settings, false));
//! let summary = pipeline.import_file(Path::new("downloads.xlsx")).await?;
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use podstats_common::db::remove_database_files;
use podstats_common::{DedupPolicy, Settings};
use tracing::{debug, error, info, warn};

use crate::db::PodcastStore;
use crate::error::{ImportError, ImportResult};
use crate::models::{ImportSummary, PersistedEpisode, UpsertOutcome, Workbook};
use crate::services::{load_workbook, AuditLog, ColumnMap, Deduplicator, RowNormalizer, RowOutcome};

const STAGING_SUFFIX: &str = ".importing";

/// Options for one import run
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub db_path: PathBuf,
    /// Replace an existing store instead of refusing
    pub overwrite: bool,
    pub policy: DedupPolicy,
    /// Path fragment every admitted URL must contain
    pub upload_marker: String,
    /// Directory receiving the audit ledgers
    pub log_dir: PathBuf,
}

impl ImportOptions {
    pub fn from_settings(settings: &Settings, overwrite: bool) -> Self {
        Self {
            db_path: settings.database_path.clone(),
            overwrite,
            policy: settings.dedup_policy,
            upload_marker: settings.upload_marker.clone(),
            log_dir: settings.log_dir.clone(),
        }
    }
}

/// Staging file a store is built in before it replaces `db_path`
pub fn staging_path(db_path: &Path) -> PathBuf {
    let mut staging: OsString = db_path.as_os_str().to_owned();
    staging.push(STAGING_SUFFIX);
    PathBuf::from(staging)
}

/// Load `path` and import it with `options`
pub async fn import_workbook(path: &Path, options: &ImportOptions) -> ImportResult<ImportSummary> {
    Pipeline::new(options.clone()).import_file(path).await
}

/// Import pipeline for one target store
pub struct Pipeline {
    options: ImportOptions,
}

impl Pipeline {
    pub fn new(options: ImportOptions) -> Self {
        Self { options }
    }

    /// Import a workbook file
    ///
    /// The overwrite guard is checked before the file is even opened.
    pub async fn import_file(&self, path: &Path) -> ImportResult<ImportSummary> {
        self.check_overwrite()?;
        let workbook = load_workbook(path)?;
        self.import(&workbook).await
    }

    /// Import an in-memory workbook
    pub async fn import(&self, workbook: &Workbook) -> ImportResult<ImportSummary> {
        self.check_overwrite()?;

        let total_rows = workbook.total_rows();
        info!(
            rows = total_rows,
            sheets = workbook.sheets.len(),
            policy = %self.options.policy,
            "Starting import"
        );

        // Normalize
        let normalizer = RowNormalizer::new(self.options.upload_marker.clone());
        let mut admitted = Vec::with_capacity(total_rows);
        let mut skipped = Vec::new();

        for sheet in &workbook.sheets {
            let columns = ColumnMap::resolve(&sheet.headers);
            if columns.url.is_none() && !sheet.rows.is_empty() {
                warn!(sheet = %sheet.name, "No URL column found; every row will be skipped");
            }
            debug!(sheet = %sheet.name, rows = sheet.rows.len(), ?columns, "Resolved columns");

            for row in sheet.raw_rows() {
                match normalizer.normalize(&row, &columns) {
                    RowOutcome::Admitted(record) => admitted.push(record),
                    RowOutcome::Skipped(entry) => skipped.push(entry),
                }
            }
        }

        if !skipped.is_empty() {
            warn!(skipped = skipped.len(), "Rows failed the admission check");
        }

        // Deduplicate
        let dedup = Deduplicator::process(self.options.policy, admitted);
        let episodes: Vec<PersistedEpisode> =
            dedup.episodes.into_iter().map(PersistedEpisode::from).collect();

        // Persist
        let outcome = self.persist(&episodes).await?;

        // Audit; the store is already committed, so a ledger failure is
        // reported without discarding the summary
        let audit = AuditLog::new(&self.options.log_dir);
        if let Err(e) = audit.write_duplicates(&dedup.duplicates) {
            error!("Failed to write duplicate ledger: {}", e);
        }
        if let Err(e) = audit.write_skipped(&skipped) {
            error!("Failed to write skip ledger: {}", e);
        }

        let summary = ImportSummary {
            total_rows,
            inserted: outcome.inserted,
            duplicates: dedup.duplicates.len(),
            skipped: skipped.len(),
            already_present: outcome.ignored,
            policy: self.options.policy,
        };
        debug_assert!(summary.is_balanced());

        info!(
            inserted = summary.inserted,
            duplicates = summary.duplicates,
            skipped = summary.skipped,
            already_present = summary.already_present,
            "Import complete: {}",
            self.options.db_path.display()
        );

        Ok(summary)
    }

    fn check_overwrite(&self) -> ImportResult<()> {
        if self.options.db_path.exists() && !self.options.overwrite {
            return Err(ImportError::StoreExists {
                path: self.options.db_path.clone(),
            });
        }
        Ok(())
    }

    /// Build the store on a staging file and move it over the target
    async fn persist(&self, episodes: &[PersistedEpisode]) -> ImportResult<UpsertOutcome> {
        let target = &self.options.db_path;
        let staging = staging_path(target);

        remove_database_files(&staging)?;

        let outcome = match PodcastStore::create_with(&staging, episodes).await {
            Ok((store, outcome)) => {
                store.close().await;
                outcome
            }
            Err(e) => {
                discard_staging(&staging);
                return Err(e);
            }
        };

        if target.exists() {
            warn!("Replacing existing database: {}", target.display());
        }

        if let Err(e) = swap_into_place(&staging, target) {
            discard_staging(&staging);
            return Err(e);
        }

        debug!(inserted = outcome.inserted, "Store written: {}", target.display());
        Ok(outcome)
    }
}

/// Rename `staging` over `target`, dropping any journal left beside the target
fn swap_into_place(staging: &Path, target: &Path) -> ImportResult<()> {
    for suffix in ["-journal", "-wal", "-shm"] {
        let mut sidecar = target.as_os_str().to_owned();
        sidecar.push(suffix);
        let sidecar = PathBuf::from(sidecar);
        if sidecar.exists() {
            std::fs::remove_file(&sidecar)?;
        }
    }

    std::fs::rename(staging, target)?;
    Ok(())
}

fn discard_staging(staging: &Path) {
    if let Err(e) = remove_database_files(staging) {
        warn!("Failed to remove staging database {}: {}", staging.display(), e);
    }
}
