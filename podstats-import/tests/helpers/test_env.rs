//! Isolated store and ledger directory per test

use podstats_common::DedupPolicy;
use podstats_import::services::audit_log::{DUPLICATE_LEDGER, SKIP_LEDGER};
use podstats_import::{ImportOptions, PodcastStore};
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("data").join("podcasts.db")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.dir.path().join("logs")
    }

    pub fn duplicates_ledger(&self) -> PathBuf {
        self.log_dir().join(DUPLICATE_LEDGER)
    }

    pub fn skipped_ledger(&self) -> PathBuf {
        self.log_dir().join(SKIP_LEDGER)
    }

    pub fn options(&self, policy: DedupPolicy, overwrite: bool) -> ImportOptions {
        ImportOptions {
            db_path: self.db_path(),
            overwrite,
            policy,
            upload_marker: "/wp-content/uploads".to_string(),
            log_dir: self.log_dir(),
        }
    }

    pub async fn open_store(&self) -> PodcastStore {
        PodcastStore::open(&self.db_path())
            .await
            .expect("Failed to open imported store")
    }
}
