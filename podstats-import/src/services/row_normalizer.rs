//! Spreadsheet row normalization
//!
//! Column headers drift between files and sheets ("Avg BW", "avg_bw",
//! "Average Bandwidth"). Headers are resolved once per sheet against a fixed
//! synonym table into a [`ColumnMap`]; rows are then read positionally.
//!
//! Numeric cells go through parse-or-default helpers that never fail: any
//! value that is not a finite number becomes zero.

use super::metadata_extractor;
use crate::models::{CellValue, NormalizedRecord, RawRow, SkipLogEntry};

/// Reason recorded for rows failing the admission check
pub const SKIP_REASON_INVALID_URL: &str = "invalid url";

/// Fields read from a download-log sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Url,
    Full,
    Partial,
    AvgBandwidth,
    TotalBandwidth,
}

/// Header spellings per field, already in normalized form
const SYNONYMS: &[(Field, &[&str])] = &[
    (Field::Url, &["url", "link", "file url", "download url", "episode url"]),
    (
        Field::Full,
        &["full", "full downloads", "downloads full", "downloads_full", "full_downloads"],
    ),
    (
        Field::Partial,
        &[
            "partial",
            "partial downloads",
            "downloads partial",
            "downloads_partial",
            "partial_downloads",
        ],
    ),
    (
        Field::AvgBandwidth,
        &[
            "avg bw",
            "avg_bw",
            "avg. bw",
            "avg bandwidth",
            "average bandwidth",
            "avg_bandwidth",
            "size per download",
            "size_per_download",
        ],
    ),
    (
        Field::TotalBandwidth,
        &["total bw", "total_bw", "total bandwidth", "total_bandwidth"],
    ),
];

/// Lower-case with surrounding whitespace removed and inner runs collapsed
pub fn normalize_header(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Field a header denotes, if any
pub fn field_for_header(header: &str) -> Option<Field> {
    let normalized = normalize_header(header);
    SYNONYMS
        .iter()
        .find(|(_, spellings)| spellings.contains(&normalized.as_str()))
        .map(|(field, _)| *field)
}

/// Column index per field for one sheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub url: Option<usize>,
    pub full: Option<usize>,
    pub partial: Option<usize>,
    pub avg_bandwidth: Option<usize>,
    pub total_bandwidth: Option<usize>,
}

impl ColumnMap {
    /// Resolve headers; the leftmost header for a field wins
    pub fn resolve(headers: &[String]) -> Self {
        let mut map = Self::default();

        for (index, header) in headers.iter().enumerate() {
            let slot = match field_for_header(header) {
                Some(Field::Url) => &mut map.url,
                Some(Field::Full) => &mut map.full,
                Some(Field::Partial) => &mut map.partial,
                Some(Field::AvgBandwidth) => &mut map.avg_bandwidth,
                Some(Field::TotalBandwidth) => &mut map.total_bandwidth,
                None => continue,
            };
            slot.get_or_insert(index);
        }

        map
    }
}

/// Non-negative integer count, zero for anything unparsable
pub fn parse_count(value: &CellValue) -> i64 {
    let parsed = match value {
        CellValue::Int(v) => Some(*v),
        CellValue::Float(v) => float_to_count(*v),
        CellValue::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_count))
        }
        CellValue::Empty | CellValue::Bool(_) => None,
    };
    parsed.unwrap_or(0).max(0)
}

/// Non-negative float amount, zero for anything unparsable
pub fn parse_amount(value: &CellValue) -> f64 {
    let parsed = match value {
        CellValue::Int(v) => Some(*v as f64),
        CellValue::Float(v) => Some(*v),
        CellValue::Text(s) => s.trim().parse::<f64>().ok(),
        CellValue::Empty | CellValue::Bool(_) => None,
    };
    match parsed {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

fn float_to_count(v: f64) -> Option<i64> {
    v.is_finite().then(|| v.trunc() as i64)
}

/// Result of normalizing one row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Admitted(NormalizedRecord),
    Skipped(SkipLogEntry),
}

/// Turns raw rows into typed records
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    upload_marker: String,
}

impl RowNormalizer {
    /// `upload_marker` is the path fragment an admitted URL must contain
    pub fn new(upload_marker: impl Into<String>) -> Self {
        Self {
            upload_marker: upload_marker.into(),
        }
    }

    pub fn normalize(&self, row: &RawRow<'_>, columns: &ColumnMap) -> RowOutcome {
        let url_cell = row.cell(columns.url);
        let url = url_cell.to_string().trim().to_string();

        let full = row.cell(columns.full);
        let partial = row.cell(columns.partial);
        let avg_bandwidth = row.cell(columns.avg_bandwidth);
        let total_bandwidth = row.cell(columns.total_bandwidth);

        if !url.contains(&self.upload_marker) {
            tracing::debug!(sheet = row.sheet, row = row.row_number, url = %url, "Skipping row");
            return RowOutcome::Skipped(SkipLogEntry {
                sheet: row.sheet.to_string(),
                row: row.row_number,
                url: url_cell.to_string(),
                full: full.to_string(),
                partial: partial.to_string(),
                avg_bandwidth: avg_bandwidth.to_string(),
                total_bandwidth: total_bandwidth.to_string(),
                reason: SKIP_REASON_INVALID_URL.to_string(),
            });
        }

        let metadata = metadata_extractor::extract(&url);

        RowOutcome::Admitted(NormalizedRecord::new(
            url,
            row.sheet.to_string(),
            row.row_number,
            (parse_count(full), parse_count(partial)),
            (parse_amount(avg_bandwidth), parse_amount(total_bandwidth)),
            metadata,
        ))
    }
}
