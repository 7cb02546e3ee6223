//! Persistence of episodes in the `podcasts` table
//!
//! Writes use `INSERT OR IGNORE` against the `(url, sheet)` unique key, so a
//! key already present in the store is never modified.

use std::path::Path;

use podstats_common::db::{
    create_podcasts_table, open_database, remove_database_files, PodcastsTableSchema,
    SchemaIntrospector,
};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::ImportResult;
use crate::models::{PersistedEpisode, UpsertOutcome};

const EPISODE_COLUMNS: &str = "url, full, partial, avg_bandwidth, total_bandwidth, eq_full, \
                               feature, code, sheet, year, month, date, title";

/// Filters for [`PodcastStore::top_episodes`]
#[derive(Debug, Clone)]
pub struct TopQuery {
    /// Case-insensitive substring of the feature tag
    pub feature: Option<String>,
    pub year: Option<i32>,
    pub limit: u32,
}

impl Default for TopQuery {
    fn default() -> Self {
        Self {
            feature: None,
            year: None,
            limit: 20,
        }
    }
}

/// Store-wide totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StoreSummary {
    pub episodes: i64,
    pub avg_eq_full: f64,
}

/// Handle on one podcast store file
#[derive(Debug, Clone)]
pub struct PodcastStore {
    pool: SqlitePool,
}

impl PodcastStore {
    /// Create the store and its schema if missing
    pub async fn create(path: &Path) -> ImportResult<Self> {
        let (store, _) = Self::create_with(path, &[]).await?;
        Ok(store)
    }

    /// Create the schema and insert `episodes` in a single transaction
    pub async fn create_with(
        path: &Path,
        episodes: &[PersistedEpisode],
    ) -> ImportResult<(Self, UpsertOutcome)> {
        let pool = open_database(path, true).await?;

        let mut tx = pool.begin().await?;
        create_podcasts_table(&mut *tx).await?;
        let outcome = insert_episodes(&mut *tx, episodes).await?;
        tx.commit().await?;

        Ok((Self { pool }, outcome))
    }

    /// Open an existing store, verifying its schema
    pub async fn open(path: &Path) -> ImportResult<Self> {
        let pool = open_database(path, false).await?;

        let missing = SchemaIntrospector::missing_columns::<PodcastsTableSchema>(&pool).await?;
        if !missing.is_empty() {
            pool.close().await;
            return Err(podstats_common::Error::InvalidInput(format!(
                "{} is not a podcast store (missing columns: {})",
                path.display(),
                missing.join(", ")
            ))
            .into());
        }

        Ok(Self { pool })
    }

    /// Delete the store with its sidecar files and create it afresh
    pub async fn recreate(path: &Path) -> ImportResult<Self> {
        if remove_database_files(path)? {
            tracing::warn!("Removed existing database: {}", path.display());
        }
        Self::create(path).await
    }

    /// Insert episodes, leaving keys already present untouched
    pub async fn upsert(&self, episodes: &[PersistedEpisode]) -> ImportResult<UpsertOutcome> {
        let mut tx = self.pool.begin().await?;
        let outcome = insert_episodes(&mut *tx, episodes).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    pub async fn count(&self) -> ImportResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM podcasts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// All episodes in insertion order
    pub async fn episodes(&self) -> ImportResult<Vec<PersistedEpisode>> {
        let sql = format!("SELECT {} FROM podcasts ORDER BY rowid", EPISODE_COLUMNS);
        let episodes = sqlx::query_as::<_, PersistedEpisode>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(episodes)
    }

    /// Episodes ranked by `eq_full`, highest first
    pub async fn top_episodes(&self, query: &TopQuery) -> ImportResult<Vec<PersistedEpisode>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM podcasts
            WHERE (? IS NULL OR instr(lower(feature), lower(?)) > 0)
              AND (? IS NULL OR year = ?)
            ORDER BY eq_full DESC, rowid
            LIMIT ?
            "#,
            EPISODE_COLUMNS
        );

        let feature = query.feature.as_deref().map(str::trim).filter(|f| !f.is_empty());

        let episodes = sqlx::query_as::<_, PersistedEpisode>(&sql)
            .bind(feature)
            .bind(feature)
            .bind(query.year)
            .bind(query.year)
            .bind(i64::from(query.limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(episodes)
    }

    pub async fn summary(&self) -> ImportResult<StoreSummary> {
        let (episodes, avg_eq_full): (i64, f64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(AVG(eq_full), 0.0) FROM podcasts")
                .fetch_one(&self.pool)
                .await?;
        Ok(StoreSummary {
            episodes,
            avg_eq_full,
        })
    }

    /// Close the pool so the file can be renamed or removed
    pub async fn close(self) {
        self.pool.close().await;
    }
}

async fn insert_episodes(
    conn: &mut SqliteConnection,
    episodes: &[PersistedEpisode],
) -> ImportResult<UpsertOutcome> {
    let sql = format!(
        "INSERT OR IGNORE INTO podcasts ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        EPISODE_COLUMNS
    );

    let mut outcome = UpsertOutcome::default();
    for episode in episodes {
        let result = sqlx::query(&sql)
            .bind(&episode.url)
            .bind(episode.full)
            .bind(episode.partial)
            .bind(episode.avg_bandwidth)
            .bind(episode.total_bandwidth)
            .bind(episode.eq_full)
            .bind(episode.feature.map(|f| f.as_str()))
            .bind(episode.code)
            .bind(&episode.sheet)
            .bind(episode.year)
            .bind(episode.month)
            .bind(episode.date)
            .bind(&episode.title)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() > 0 {
            outcome.inserted += 1;
        } else {
            tracing::debug!(url = %episode.url, sheet = %episode.sheet, "Key already present");
            outcome.ignored += 1;
        }
    }

    Ok(outcome)
}
