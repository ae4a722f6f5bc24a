//! Application service — tabular input loading.
//!
//! Reads through the injected [`TableSource`] and normalizes the result into
//! attribute rows. Either every row loads or none does.

use std::path::Path;

use crate::application::ports::TableSource;
use crate::domain::{
    AttributeRow, LoadError, RawTable, TableInspection, attribute_headers, rows_from_table,
};

/// Load and validate the attribute rows in `path`.
///
/// # Errors
///
/// Returns a [`LoadError`] if the file is unreadable, lacks the identifier
/// column, repeats a header, or has a data row with no machine name.
pub fn load_rows(
    source: &impl TableSource,
    path: &Path,
    identifier_column: &str,
) -> Result<Vec<AttributeRow>, LoadError> {
    load(source, path, identifier_column).map(|(_, rows)| rows)
}

fn load(
    source: &impl TableSource,
    path: &Path,
    identifier_column: &str,
) -> Result<(RawTable, Vec<AttributeRow>), LoadError> {
    let table = source.read_table(path)?;
    let (rows, blank_columns) = rows_from_table(&table, identifier_column)?;
    for idx in blank_columns {
        tracing::warn!(column = idx + 1, "ignoring column with a blank header");
    }
    tracing::debug!(rows = rows.len(), path = %path.display(), "loaded attribute rows");
    Ok((table, rows))
}

/// Load `path` and summarize it for display. No connection is made.
///
/// # Errors
///
/// Same as [`load_rows`].
pub fn inspect(
    source: &impl TableSource,
    path: &Path,
    identifier_column: &str,
) -> Result<TableInspection, LoadError> {
    let (table, rows) = load(source, path, identifier_column)?;
    let columns = attribute_headers(&table.headers, identifier_column);
    Ok(TableInspection::from_rows(identifier_column, columns, &rows))
}
