//! Spreadsheet input tests
//!
//! Workbooks are written with rust_xlsxwriter and read back through the
//! same path a real download-log export takes.

mod helpers;

use helpers::{upload_url, TestEnv};
use podstats_common::DedupPolicy;
use podstats_import::import_workbook;
use podstats_import::models::CellValue;
use podstats_import::services::{load_workbook, ColumnMap};
use rust_xlsxwriter::{Workbook, XlsxError};
use std::path::Path;

const BLOG_URL: &str = "https://example.com/blog/x.mp3";

/// Two sheets:
/// - `2021`: header on row 1, a blank row 3, a case-variant duplicate on row 5
/// - `2022`: header on row 3 with different spellings, a rejected URL on row 4
fn write_download_log(path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();

    {
        let sheet = workbook.add_worksheet().set_name("2021")?;
        let headers = ["  URL ", "Full", "Partial", "Avg BW", "Total BW"];
        for (col, header) in headers.iter().enumerate() {
            sheet.write(0, col as u16, *header)?;
        }
        sheet.write(1, 0, upload_url("042@Episode_One.mp3").as_str())?;
        sheet.write(1, 1, 100.0)?;
        sheet.write(1, 2, 10.0)?;
        sheet.write(1, 3, 1.5)?;
        sheet.write(1, 4, 165.0)?;
        // row index 2 left blank
        sheet.write(3, 0, upload_url("oxd_briefing.mp3").as_str())?;
        sheet.write(3, 1, 7.0)?;
        sheet.write(4, 0, upload_url("042@EPISODE_ONE.mp3").as_str())?;
        sheet.write(4, 1, 3.0)?;
        sheet.write(4, 2, 1.0)?;
    }

    {
        let sheet = workbook.add_worksheet().set_name("2022")?;
        let headers = ["Link", "Downloads Full", "Downloads Partial", "avg_bw", "total_bw"];
        for (col, header) in headers.iter().enumerate() {
            sheet.write(2, col as u16, *header)?;
        }
        sheet.write(3, 0, BLOG_URL)?;
        sheet.write(3, 1, 5.0)?;
        sheet.write(4, 0, upload_url("042@Episode_One.mp3").as_str())?;
        sheet.write(4, 1, 20.0)?;
        sheet.write(4, 2, 2.0)?;
    }

    workbook.save(path)
}

#[test]
fn test_xlsx_sheets_headers_and_row_numbers() {
    let env = TestEnv::new();
    let path = env.dir.path().join("downloads.xlsx");
    write_download_log(&path).unwrap();

    let workbook = load_workbook(&path).unwrap();
    let names: Vec<&str> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["2021", "2022"]);
    assert_eq!(workbook.total_rows(), 5);

    let first = &workbook.sheets[0];
    assert_eq!(first.headers[0], "URL");
    assert_eq!(first.rows[0][1], CellValue::Float(100.0));
    let rows: Vec<usize> = first.raw_rows().map(|r| r.row_number).collect();
    assert_eq!(rows, vec![2, 4, 5]);

    let second = &workbook.sheets[1];
    let rows: Vec<usize> = second.raw_rows().map(|r| r.row_number).collect();
    assert_eq!(rows, vec![4, 5]);

    for sheet in &workbook.sheets {
        let columns = ColumnMap::resolve(&sheet.headers);
        assert_eq!(columns.url, Some(0), "sheet {}", sheet.name);
        assert_eq!(columns.full, Some(1), "sheet {}", sheet.name);
        assert_eq!(columns.partial, Some(2), "sheet {}", sheet.name);
        assert_eq!(columns.avg_bandwidth, Some(3), "sheet {}", sheet.name);
        assert_eq!(columns.total_bandwidth, Some(4), "sheet {}", sheet.name);
    }
}

#[tokio::test]
async fn test_xlsx_import_end_to_end() {
    let env = TestEnv::new();
    let path = env.dir.path().join("downloads.xlsx");
    write_download_log(&path).unwrap();

    let summary = import_workbook(&path, &env.options(DedupPolicy::KeepFirst, false))
        .await
        .unwrap();

    assert_eq!(summary.total_rows, 5);
    assert_eq!(summary.inserted, 3);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.skipped, 1);
    assert!(summary.is_balanced());

    let episodes = env.open_store().await.episodes().await.unwrap();
    let keyed: Vec<(&str, i64, i64)> = episodes
        .iter()
        .map(|e| (e.sheet.as_str(), e.full, e.partial))
        .collect();
    assert_eq!(keyed, vec![("2021", 100, 10), ("2021", 7, 0), ("2022", 20, 2)]);
    assert_eq!(episodes[0].eq_full, 105.0);
    assert_eq!(episodes[0].total_bandwidth, 165.0);
    assert_eq!(episodes[0].code, Some(42));

    // ledger rows point at the spreadsheet rows
    let duplicates = std::fs::read_to_string(env.duplicates_ledger()).unwrap();
    let duplicate = duplicates.lines().nth(1).unwrap();
    assert!(duplicate.contains(",2021,5,"), "{}", duplicate);
    assert!(duplicate.ends_with(",2,keep-first"), "{}", duplicate);

    let skipped = std::fs::read_to_string(env.skipped_ledger()).unwrap();
    let skip = skipped.lines().nth(1).unwrap();
    assert!(skip.starts_with(&format!("2022,4,{},5,", BLOG_URL)), "{}", skip);
}
