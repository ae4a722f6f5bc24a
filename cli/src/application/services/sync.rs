//! Application service — the sync run.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All platform I/O is routed through injected port traits.
//!
//! A run is: load rows, connect, process each row in order (resolve, apply,
//! tick progress), disconnect. Load and connect failures are fatal and happen
//! before any row is touched; everything after that is recorded in the
//! [`RunSummary`] instead of being returned as an error.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use chrono::Utc;

use crate::application::ports::{
    ConnectionParams, InventorySource, PlatformConnector, PlatformSession, SessionRelease,
    SyncReporter, TableSource,
};
use crate::application::services::{apply::apply_fields, loader::load_rows};
use crate::domain::{
    AttributeRow, Inventory, LogLine, Progress, RefreshPolicy, RowOutcome, RowReport, RunSummary,
    SyncError,
};

/// Cooperative cancellation flag, checked between rows.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the run stop after the current row.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Knobs for a run.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub refresh: RefreshPolicy,
    pub cancel: CancelToken,
}

/// Inputs for a full run, from file to platform.
pub struct SyncRequest<'a> {
    pub file: &'a Path,
    pub identifier_column: &'a str,
    pub params: &'a ConnectionParams,
}

/// Load the input, open a session, process every row, and release the session.
///
/// # Errors
///
/// Returns [`SyncError::Load`] or [`SyncError::Connection`]; in both cases no
/// row has been processed and no progress has been reported.
pub async fn run_sync(
    source: &impl TableSource,
    connector: &impl PlatformConnector,
    request: SyncRequest<'_>,
    reporter: &impl SyncReporter,
    opts: &SyncOptions,
) -> Result<RunSummary, SyncError> {
    reporter.step(&format!("loading {}", request.file.display()));
    let rows = load_rows(source, request.file, request.identifier_column)?;

    reporter.step(&format!("connecting to {}", request.params.host));
    let session = connector.connect(request.params).await?;
    tracing::debug!(host = %request.params.host, "session established");

    let summary = run_rows(&session, &rows, reporter, opts).await;

    release(session, reporter).await;
    Ok(summary)
}

/// Log out, downgrading a failure to a warning: the run itself has finished.
async fn release(session: impl SessionRelease, reporter: &impl SyncReporter) {
    if let Err(e) = session.disconnect().await {
        tracing::warn!(error = %e, "logout failed");
        reporter.warn(&format!("logout failed: {e}"));
    }
}

/// Process `rows` in order against an open session.
///
/// Progress is reported after every row, whatever its outcome. When the run is
/// not cancelled, the final progress equals `rows.len()` and the last log line
/// is [`LogLine::Done`].
pub async fn run_rows(
    session: &impl PlatformSession,
    rows: &[AttributeRow],
    reporter: &impl SyncReporter,
    opts: &SyncOptions,
) -> RunSummary {
    let started_at = Utc::now();
    let mut progress = Progress::new(rows.len());
    let mut reports = Vec::with_capacity(rows.len());
    let mut cache: Option<Inventory> = None;
    let mut cancelled = false;

    for row in rows {
        if opts.cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let outcome = process_row(session, row, &mut cache, opts.refresh, reporter).await;
        reports.push(RowReport {
            machine: row.identifier().to_string(),
            outcome,
        });

        progress.advance();
        reporter.progress(progress);
        // Let the presentation side drain its queue between rows.
        tokio::task::yield_now().await;
    }

    if cancelled {
        reporter.log(&LogLine::Cancelled {
            processed: progress.current,
            total: progress.total,
        });
    } else {
        reporter.log(&LogLine::Done);
    }

    RunSummary::from_reports(rows.len(), reports, cancelled, started_at)
}

async fn process_row(
    session: &impl PlatformSession,
    row: &AttributeRow,
    cache: &mut Option<Inventory>,
    refresh: RefreshPolicy,
    reporter: &impl SyncReporter,
) -> RowOutcome {
    let machine = row.identifier();

    let inventory = match current_inventory(session, cache, refresh).await {
        Ok(inventory) => inventory,
        Err(e) => {
            let reason = format!("{e:#}");
            reporter.log(&LogLine::LookupFailed {
                machine: machine.to_string(),
                reason: reason.clone(),
            });
            return RowOutcome::LookupFailed { reason };
        }
    };

    let Some(entity) = inventory.resolve(machine) else {
        tracing::debug!(%machine, "no machine with this name");
        reporter.log(&LogLine::MachineNotFound {
            machine: machine.to_string(),
        });
        return RowOutcome::MachineNotFound;
    };

    tracing::debug!(%machine, id = %entity.id, "resolved machine");
    let fields = apply_fields(session, entity, row.fields(), reporter).await;
    RowOutcome::Resolved { fields }
}

/// Return the inventory to resolve against, fetching it when the policy or
/// an empty cache requires.
async fn current_inventory<'c>(
    source: &impl InventorySource,
    cache: &'c mut Option<Inventory>,
    refresh: RefreshPolicy,
) -> Result<&'c Inventory> {
    if refresh == RefreshPolicy::PerRow || cache.is_none() {
        let fresh = source.inventory().await?;
        let inventory: &'c Inventory = cache.insert(fresh);
        return Ok(inventory);
    }
    cache
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("inventory cache is empty"))
}
