//! Attribute rows: the normalized form of the input table.
//!
//! Pure functions only — the spreadsheet/CSV reading lives in
//! `crate::infra::table`, which hands a [`RawTable`] to [`rows_from_table`].

use serde::Serialize;

use crate::domain::error::LoadError;

/// Default name of the column holding the machine name.
pub const DEFAULT_IDENTIFIER_COLUMN: &str = "VM Name";

/// A header row plus data rows, every cell already coerced to a string.
///
/// Data rows may be shorter or longer than the header; missing cells are
/// treated as empty strings and surplus cells are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One target machine and the attribute values to assign to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeRow {
    identifier: String,
    fields: Vec<(String, String)>,
}

impl AttributeRow {
    /// Build a row directly. Used by tests and by [`rows_from_table`].
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::EmptyIdentifier`] if `identifier` is blank.
    pub fn new(
        identifier: impl Into<String>,
        fields: Vec<(String, String)>,
    ) -> Result<Self, LoadError> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(LoadError::EmptyIdentifier {
                row: 0,
                column: DEFAULT_IDENTIFIER_COLUMN.to_string(),
            });
        }
        Ok(Self { identifier, fields })
    }

    /// The machine name, exactly as written in the table.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Attribute name/value pairs in the table's column order.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Convert a raw table into attribute rows.
///
/// - the identifier column is required and excluded from every row's fields
/// - rows whose cells are all empty are skipped
/// - columns with a blank header are dropped and reported in the second
///   element of the returned tuple (zero-based column indexes)
///
/// # Errors
///
/// Returns a [`LoadError`] if the identifier column is missing, a header
/// repeats, or a non-blank row has an empty identifier. No partial result is
/// returned.
pub fn rows_from_table(
    table: &RawTable,
    identifier_column: &str,
) -> Result<(Vec<AttributeRow>, Vec<usize>), LoadError> {
    let mut seen: Vec<&str> = Vec::with_capacity(table.headers.len());
    let mut blank_columns = Vec::new();
    for (idx, header) in table.headers.iter().enumerate() {
        if header.trim().is_empty() {
            blank_columns.push(idx);
            continue;
        }
        if seen.contains(&header.as_str()) {
            return Err(LoadError::DuplicateColumn(header.clone()));
        }
        seen.push(header.as_str());
    }

    let id_idx = table
        .headers
        .iter()
        .position(|h| h == identifier_column)
        .ok_or_else(|| LoadError::MissingIdentifierColumn {
            column: identifier_column.to_string(),
        })?;

    let attribute_columns: Vec<(usize, &String)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != id_idx && !blank_columns.contains(idx))
        .collect();

    let mut rows = Vec::with_capacity(table.rows.len());
    for (n, cells) in table.rows.iter().enumerate() {
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        let cell = |idx: usize| cells.get(idx).cloned().unwrap_or_default();

        let identifier = cell(id_idx);
        if identifier.trim().is_empty() {
            return Err(LoadError::EmptyIdentifier {
                row: n + 1,
                column: identifier_column.to_string(),
            });
        }

        let fields = attribute_columns
            .iter()
            .map(|(idx, name)| ((*name).clone(), cell(*idx)))
            .collect();
        rows.push(AttributeRow { identifier, fields });
    }

    Ok((rows, blank_columns))
}

/// Attribute column names in table order: every non-blank header except the
/// identifier column.
#[must_use]
pub fn attribute_headers(headers: &[String], identifier_column: &str) -> Vec<String> {
    headers
        .iter()
        .filter(|h| !h.trim().is_empty() && h.as_str() != identifier_column)
        .cloned()
        .collect()
}

/// Overview of a loaded table, without touching the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInspection {
    pub identifier_column: String,
    pub rows: usize,
    pub attribute_columns: Vec<String>,
    pub machines: Vec<MachineEntry>,
}

/// One row of a [`TableInspection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineEntry {
    pub machine: String,
    /// Attribute assignments the row will attempt.
    pub fields: usize,
    /// Of those, how many assign an empty value.
    pub blank: usize,
}

impl TableInspection {
    /// Summarize `rows`. `attribute_columns` comes from the header row so a
    /// table with no data rows still lists its columns.
    #[must_use]
    pub fn from_rows(
        identifier_column: &str,
        attribute_columns: Vec<String>,
        rows: &[AttributeRow],
    ) -> Self {
        let machines = rows
            .iter()
            .map(|r| MachineEntry {
                machine: r.identifier.clone(),
                fields: r.fields.len(),
                blank: r.fields.iter().filter(|(_, v)| v.is_empty()).count(),
            })
            .collect();
        Self {
            identifier_column: identifier_column.to_string(),
            rows: rows.len(),
            attribute_columns,
            machines,
        }
    }
}
