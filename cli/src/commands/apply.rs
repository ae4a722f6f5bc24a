//! `attrsync apply` — push the attributes in a table to vCenter.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ConnectionParams;
use crate::application::services::config_service;
use crate::application::services::sync::{CancelToken, SyncOptions, SyncRequest, run_sync};
use crate::domain::{AttrsyncConfig, RefreshPolicy, RunSummary};
use crate::infra::table::SpreadsheetReader;
use crate::infra::vsphere::VsphereConnector;
use crate::output::{ChannelReporter, TerminalReporter};

/// Exit code for a run stopped by Ctrl-C.
const EXIT_CANCELLED: u8 = 130;

/// Arguments for the apply command.
#[derive(Args)]
pub struct ApplyArgs {
    /// Spreadsheet (.xlsx, .xls, .ods) or .csv file, one row per machine
    #[arg(short, long)]
    pub file: PathBuf,

    /// vCenter host [default: connection.host]
    #[arg(long, env = "ATTRSYNC_HOST")]
    pub host: Option<String>,

    /// vCenter user [default: connection.user]
    #[arg(short, long, env = "ATTRSYNC_USER")]
    pub user: Option<String>,

    /// vCenter password (prompted for when omitted)
    #[arg(long, env = "ATTRSYNC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Column holding machine names [default: sync.identifier_column]
    #[arg(long)]
    pub identifier_column: Option<String>,

    /// When to re-read the inventory: per-row or per-run [default: sync.inventory_refresh]
    #[arg(long)]
    pub refresh: Option<RefreshPolicy>,

    /// Verify the server certificate. Verification is OFF unless this flag or
    /// connection.verify_tls is set
    #[arg(long)]
    pub verify_tls: bool,

    /// Exit non-zero if any machine is not found or any field fails
    #[arg(long)]
    pub strict: bool,
}

/// Run the apply command.
///
/// # Errors
///
/// Returns an error if connection details are missing, the input cannot be
/// loaded, or the connection fails. Per-row problems are reported in the
/// summary instead.
pub async fn run(app: &AppContext, args: ApplyArgs) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let params = connection_params(app, &args, &config)?;
    let identifier_column = args
        .identifier_column
        .clone()
        .unwrap_or_else(|| config.sync.identifier_column.clone());
    let opts = SyncOptions {
        refresh: args.refresh.unwrap_or(config.sync.inventory_refresh),
        cancel: CancelToken::new(),
    };
    tracing::debug!(?params, refresh = %opts.refresh, "starting apply");

    let cancel = opts.cancel.clone();
    let interrupt = tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, &cancel).await {
            eprintln!("Interrupted again; exiting without waiting for the current row");
            std::process::exit(i32::from(EXIT_CANCELLED));
        }
    });

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let request = SyncRequest {
        file: &args.file,
        identifier_column: &identifier_column,
        params: &params,
    };
    let sync = async {
        let reporter = ChannelReporter::new(tx);
        run_sync(&SpreadsheetReader, &VsphereConnector, request, &reporter, &opts).await
    };
    let terminal = TerminalReporter::new(&app.output);
    let (result, ()) = tokio::join!(sync, terminal.drain(rx));
    interrupt.abort();

    let summary = result?;
    app.renderer().render_summary(&summary)?;
    Ok(ExitCode::from(exit_status(&summary, args.strict)))
}

/// Cancel the run on the first interrupt, then keep listening.
///
/// Returns `true` once a second interrupt arrives, meaning the caller should
/// exit immediately; `false` if the signal source fails first.
async fn watch_interrupts<F, Fut>(mut next_signal: F, cancel: &CancelToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if next_signal().await.is_err() {
        return false;
    }
    tracing::warn!("interrupted: stopping after the current row (Ctrl-C again to exit now)");
    cancel.cancel();
    next_signal().await.is_ok()
}

/// Resolve connection details: flag or env first, then config, then prompt.
fn connection_params(
    app: &AppContext,
    args: &ApplyArgs,
    config: &AttrsyncConfig,
) -> Result<ConnectionParams> {
    let host = args
        .host
        .clone()
        .or_else(|| config.connection.host.clone())
        .context("no vCenter host: pass --host, set ATTRSYNC_HOST, or run `attrsync config set connection.host <host>`")?;
    let user = args
        .user
        .clone()
        .or_else(|| config.connection.user.clone())
        .context("no vCenter user: pass --user, set ATTRSYNC_USER, or run `attrsync config set connection.user <user>`")?;
    let password = match &args.password {
        Some(p) => p.clone(),
        None => app.password(&format!("Password for {user}@{host}"))?,
    };
    Ok(ConnectionParams {
        host,
        user,
        password,
        verify_tls: args.verify_tls || config.connection.verify_tls,
        timeout: config.connection.timeout_secs.map(Duration::from_secs),
    })
}

/// 0 for a completed run, 1 under `--strict` when anything went wrong, 130
/// when cancelled.
#[must_use]
pub fn exit_status(summary: &RunSummary, strict: bool) -> u8 {
    if summary.cancelled {
        EXIT_CANCELLED
    } else if strict && !summary.is_clean() {
        1
    } else {
        0
    }
}
