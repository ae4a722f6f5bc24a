//! Infrastructure implementation of the `TableSource` port.
//!
//! Workbooks (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) are read with
//! `calamine` (first worksheet only); `.csv` files with `csv`. Every cell is
//! turned into a string: empty and error cells into `""`, date cells into
//! `YYYY-MM-DD HH:MM:SS`.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use crate::application::ports::TableSource;
use crate::domain::{LoadError, RawTable};

/// Reads the input file, choosing the parser by extension.
pub struct SpreadsheetReader;

impl TableSource for SpreadsheetReader {
    fn read_table(&self, path: &Path) -> Result<RawTable, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => read_csv(path),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path),
            _ => Err(LoadError::Unreadable(format!(
                "{}: unsupported file type (expected .xlsx, .xls, .ods or .csv)",
                path.display()
            ))),
        }
    }
}

fn unreadable(path: &Path, e: impl std::fmt::Display) -> LoadError {
    LoadError::Unreadable(format!("{}: {e}", path.display()))
}

fn read_workbook(path: &Path) -> Result<RawTable, LoadError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| unreadable(path, "workbook has no worksheets"))?
        .map_err(|e| unreadable(path, e))?;

    let mut rows = range
        .rows()
        .map(|cells| cells.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    Ok(RawTable {
        headers,
        rows: rows.collect(),
    })
}

/// Layout for workbook date and time cells.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or_else(|| dt.to_string(), |d| d.format(DATETIME_FORMAT).to_string()),
        other => other.to_string(),
    }
}

fn read_csv(path: &Path) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| unreadable(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| unreadable(path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| unreadable(path, e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable { headers, rows })
}
