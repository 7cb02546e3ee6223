//! Workbook fixtures

use podstats_import::models::{CellValue, Sheet};
use std::path::{Path, PathBuf};

pub const DEFAULT_HEADERS: &[&str] = &["URL", "Full", "Partial", "Avg BW", "Total BW"];

/// Download URL under the upload area for `file`
pub fn upload_url(file: &str) -> String {
    format!("https://example.com/wp-content/uploads/2021/03/{}", file)
}

/// A row in `DEFAULT_HEADERS` column order
pub fn download_row(url: &str, full: i64, partial: i64, avg: f64, total: f64) -> Vec<CellValue> {
    vec![
        CellValue::Text(url.to_string()),
        CellValue::Int(full),
        CellValue::Int(partial),
        CellValue::Float(avg),
        CellValue::Float(total),
    ]
}

/// Sheet with `DEFAULT_HEADERS` and the given rows
pub fn sheet(name: &str, rows: Vec<Vec<CellValue>>) -> Sheet {
    let mut sheet = Sheet::new(name, DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect());
    for row in rows {
        sheet.push_row(row);
    }
    sheet
}

pub fn write_csv(dir: &Path, file_name: &str, content: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, content).expect("Failed to write CSV fixture");
    path
}
