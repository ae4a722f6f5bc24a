//! Results of a sync run: per-field and per-row outcomes, progress, log lines,
//! and the run summary handed back to the presentation layer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of assigning one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ApplyOutcome {
    Applied,
    Failed(String),
}

impl ApplyOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// One attempted field assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldOutcome {
    pub field: String,
    pub value: String,
    #[serde(flatten)]
    pub outcome: ApplyOutcome,
}

/// Terminal state of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RowOutcome {
    MachineNotFound,
    LookupFailed { reason: String },
    Resolved { fields: Vec<FieldOutcome> },
}

/// A row's machine name paired with its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowReport {
    pub machine: String,
    #[serde(flatten)]
    pub outcome: RowOutcome,
}

/// Rows processed so far out of the total. Never exceeds `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    /// Count one more processed row, saturating at `total`.
    pub fn advance(&mut self) {
        if self.current < self.total {
            self.current += 1;
        }
    }
}

/// Human-auditable run log entry, emitted in row/column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    Assigning {
        machine: String,
        field: String,
        value: String,
    },
    FieldFailed {
        machine: String,
        field: String,
        reason: String,
    },
    MachineNotFound {
        machine: String,
    },
    LookupFailed {
        machine: String,
        reason: String,
    },
    Cancelled {
        processed: usize,
        total: usize,
    },
    Done,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assigning {
                machine,
                field,
                value,
            } => write!(f, "assigning {field}={value} to machine {machine}"),
            Self::FieldFailed {
                machine,
                field,
                reason,
            } => write!(f, "failed to set {field} on machine {machine}: {reason}"),
            Self::MachineNotFound { machine } => write!(f, "machine '{machine}' not found"),
            Self::LookupFailed { machine, reason } => {
                write!(f, "inventory lookup for machine '{machine}' failed: {reason}")
            }
            Self::Cancelled { processed, total } => {
                write!(f, "cancelled after {processed} of {total} rows")
            }
            Self::Done => f.write_str("done"),
        }
    }
}

/// Aggregate result of a completed (or cancelled) run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_rows: usize,
    pub processed_rows: usize,
    pub resolved: usize,
    pub not_found: usize,
    pub lookup_failed: usize,
    pub fields_applied: usize,
    pub fields_failed: usize,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rows: Vec<RowReport>,
}

impl RunSummary {
    /// Tally the row reports of a run.
    #[must_use]
    pub fn from_reports(
        total_rows: usize,
        rows: Vec<RowReport>,
        cancelled: bool,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut summary = Self {
            total_rows,
            processed_rows: rows.len(),
            resolved: 0,
            not_found: 0,
            lookup_failed: 0,
            fields_applied: 0,
            fields_failed: 0,
            cancelled,
            started_at,
            finished_at: Utc::now(),
            rows: Vec::new(),
        };
        for report in &rows {
            match &report.outcome {
                RowOutcome::MachineNotFound => summary.not_found += 1,
                RowOutcome::LookupFailed { .. } => summary.lookup_failed += 1,
                RowOutcome::Resolved { fields } => {
                    summary.resolved += 1;
                    let applied = fields.iter().filter(|f| f.outcome.is_applied()).count();
                    summary.fields_applied += applied;
                    summary.fields_failed += fields.len() - applied;
                }
            }
        }
        summary.rows = rows;
        summary
    }

    /// `true` when every row resolved and every field applied.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.cancelled
            && self.not_found == 0
            && self.lookup_failed == 0
            && self.fields_failed == 0
    }
}
