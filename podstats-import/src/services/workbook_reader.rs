//! Workbook loading
//!
//! Spreadsheets are read with calamine; a plain `.csv` file is accepted as a
//! single-sheet workbook named after the file stem. The whole workbook is
//! loaded before anything touches the store.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::error::{ImportError, ImportResult};
use crate::models::{CellValue, Sheet, Workbook};

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Load every sheet of the workbook at `path`
pub fn load_workbook(path: &Path) -> ImportResult<Workbook> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !path.is_file() {
        return Err(ImportError::Workbook {
            path: path.to_path_buf(),
            reason: "file not found".to_string(),
        });
    }

    let workbook = if extension == "csv" {
        load_csv(path)?
    } else if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        load_spreadsheet(path)?
    } else {
        return Err(ImportError::UnsupportedFormat(path.to_path_buf()));
    };

    tracing::info!(
        path = %path.display(),
        sheets = workbook.sheets.len(),
        rows = workbook.total_rows(),
        "Loaded workbook"
    );

    Ok(workbook)
}

fn workbook_error(path: &Path, reason: impl ToString) -> ImportError {
    ImportError::Workbook {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn load_spreadsheet(path: &Path) -> ImportResult<Workbook> {
    let mut source = open_workbook_auto(path).map_err(|e| workbook_error(path, e))?;

    let mut sheets = Vec::new();
    for name in source.sheet_names() {
        let range = source
            .worksheet_range(&name)
            .map_err(|e| workbook_error(path, format!("sheet '{}': {}", name, e)))?;
        let sheet = sheet_from_range(&name, &range);
        tracing::debug!(sheet = %name, rows = sheet.rows.len(), "Read sheet");
        sheets.push(sheet);
    }

    Ok(Workbook { sheets })
}

/// The range starts at its first used cell, which is the header row
fn sheet_from_range(name: &str, range: &Range<Data>) -> Sheet {
    let header_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let mut rows = range.rows();

    let headers = rows
        .next()
        .map(|row| {
            row.iter()
                .map(|c| cell_from_data(c).to_string().trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    let mut sheet = Sheet::with_header_row(name, headers, header_row);
    for row in rows {
        sheet.push_row(row.iter().map(cell_from_data).collect());
    }
    sheet
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(v) => CellValue::Int(*v),
        Data::Float(v) => CellValue::Float(*v),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn load_csv(path: &Path) -> ImportResult<Workbook> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| workbook_error(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| workbook_error(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Sheet1".to_string());

    // The csv reader skips empty lines, so take row numbers from its position
    let mut sheet = Sheet::new(name, headers);
    for record in reader.records() {
        let record = record.map_err(|e| workbook_error(path, e))?;
        let line = record.position().map(|p| p.line() as usize);
        let cells: Vec<CellValue> = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(field.to_string())
                }
            })
            .collect();
        match line {
            Some(line) => sheet.push_row_at(line, cells),
            None => sheet.push_row(cells),
        }
    }

    Ok(Workbook { sheets: vec![sheet] })
}
