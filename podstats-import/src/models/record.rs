//! Episode records at each pipeline stage

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;

/// Weighted download count: partial downloads count half
pub fn eq_full(full: i64, partial: i64) -> f64 {
    full as f64 + 0.5 * partial as f64
}

/// Known feed tags found in episode filenames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Technical podcast
    HpcPodcast,
    /// Marketing podcast
    MktgPodcast,
    /// Short-form secondary feed
    Oxd,
    /// Newsletter audio edition
    Hpcnb,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::HpcPodcast => "hpcpodcast",
            Feature::MktgPodcast => "mktg_podcast",
            Feature::Oxd => "oxd",
            Feature::Hpcnb => "hpcnb",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hpcpodcast" => Ok(Feature::HpcPodcast),
            "mktg_podcast" => Ok(Feature::MktgPodcast),
            "oxd" => Ok(Feature::Oxd),
            "hpcnb" => Ok(Feature::Hpcnb),
            other => Err(format!("unknown feature '{}'", other)),
        }
    }
}

/// Metadata derived from a URL or filename alone
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedMetadata {
    pub feature: Option<Feature>,
    pub code: Option<u32>,
    pub date: Option<NaiveDate>,
    pub title: String,
}

/// Dedup key: trimmed, lower-cased URL plus sheet name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub url: String,
    pub sheet: String,
}

impl DedupKey {
    pub fn new(url: &str, sheet: &str) -> Self {
        Self {
            url: url.trim().to_lowercase(),
            sheet: sheet.to_string(),
        }
    }
}

/// One admitted spreadsheet row with typed numeric fields
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub url: String,
    pub sheet: String,
    /// Spreadsheet row the record came from
    pub source_row: usize,
    pub full: i64,
    pub partial: i64,
    pub avg_bandwidth: f64,
    pub total_bandwidth: f64,
    pub eq_full: f64,
    pub feature: Option<Feature>,
    pub code: Option<u32>,
    pub date: Option<NaiveDate>,
    pub title: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl NormalizedRecord {
    /// Build a record; `eq_full`, `year` and `month` are always derived here
    pub fn new(
        url: String,
        sheet: String,
        source_row: usize,
        counts: (i64, i64),
        bandwidth: (f64, f64),
        metadata: ExtractedMetadata,
    ) -> Self {
        let (full, partial) = (counts.0.max(0), counts.1.max(0));
        Self {
            url,
            sheet,
            source_row,
            full,
            partial,
            avg_bandwidth: bandwidth.0,
            total_bandwidth: bandwidth.1,
            eq_full: eq_full(full, partial),
            feature: metadata.feature,
            code: metadata.code,
            year: metadata.date.map(|d| d.year()),
            month: metadata.date.map(|d| d.month()),
            date: metadata.date,
            title: metadata.title,
        }
    }

    pub fn key(&self) -> DedupKey {
        DedupKey::new(&self.url, &self.sheet)
    }
}

/// Durable row of the `podcasts` table, unique on `(url, sheet)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedEpisode {
    pub url: String,
    pub full: i64,
    pub partial: i64,
    pub avg_bandwidth: f64,
    pub total_bandwidth: f64,
    pub eq_full: f64,
    pub feature: Option<Feature>,
    pub code: Option<u32>,
    pub sheet: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub date: Option<NaiveDate>,
    pub title: String,
}

impl PersistedEpisode {
    /// Code as shown to people: zero-padded to three digits
    pub fn code_label(&self) -> Option<String> {
        self.code.map(|c| format!("{:03}", c))
    }
}

impl From<NormalizedRecord> for PersistedEpisode {
    fn from(record: NormalizedRecord) -> Self {
        Self {
            url: record.url.trim().to_string(),
            full: record.full,
            partial: record.partial,
            avg_bandwidth: record.avg_bandwidth,
            total_bandwidth: record.total_bandwidth,
            eq_full: eq_full(record.full, record.partial),
            feature: record.feature,
            code: record.code,
            sheet: record.sheet,
            year: record.year,
            month: record.month,
            date: record.date,
            title: record.title,
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for PersistedEpisode {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let feature: Option<String> = row.try_get("feature")?;

        Ok(Self {
            url: row.try_get("url")?,
            full: row.try_get("full")?,
            partial: row.try_get("partial")?,
            avg_bandwidth: row.try_get("avg_bandwidth")?,
            total_bandwidth: row.try_get("total_bandwidth")?,
            eq_full: row.try_get("eq_full")?,
            feature: feature.and_then(|f| f.parse().ok()),
            code: row.try_get("code")?,
            sheet: row.try_get("sheet")?,
            year: row.try_get("year")?,
            month: row.try_get("month")?,
            date: row.try_get("date")?,
            title: row.try_get("title")?,
        })
    }
}
