//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Load errors ───────────────────────────────────────────────────────────────

/// Fatal errors raised while turning the input table into attribute rows.
///
/// Any of these aborts the run before a connection is attempted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Input table has no '{column}' column.")]
    MissingIdentifierColumn { column: String },

    #[error("Cannot read input table: {0}")]
    Unreadable(String),

    #[error("Row {row} has an empty '{column}' cell.")]
    EmptyIdentifier { row: usize, column: String },

    #[error("Column '{0}' appears more than once in the header row.")]
    DuplicateColumn(String),
}

impl LoadError {
    /// Stable machine-readable code used by `--json` error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingIdentifierColumn { .. } => "MISSING_IDENTIFIER_COLUMN",
            Self::Unreadable(_) => "UNREADABLE_INPUT",
            Self::EmptyIdentifier { .. } => "EMPTY_IDENTIFIER",
            Self::DuplicateColumn(_) => "DUPLICATE_COLUMN",
        }
    }
}

// ── Connection errors ─────────────────────────────────────────────────────────

/// Fatal error establishing the platform session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Cannot connect to {host}: {cause}")]
pub struct ConnectionError {
    pub host: String,
    pub cause: String,
}

// ── Field errors ──────────────────────────────────────────────────────────────

/// Per-field failure reported by the platform. Never aborts a run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct FieldApplyError {
    pub reason: String,
}

impl FieldApplyError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

// ── Run errors ────────────────────────────────────────────────────────────────

/// Terminal failures of a sync run. Per-row and per-field problems are never
/// represented here; they live in the run summary.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl SyncError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Load(e) => e.code(),
            Self::Connection(_) => "CONNECTION_FAILED",
        }
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}
