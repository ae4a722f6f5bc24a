//! `attrsync inspect` — load and validate a table without connecting.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::{config_service, loader};
use crate::infra::table::SpreadsheetReader;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Spreadsheet (.xlsx, .xls, .ods) or .csv file, one row per machine
    #[arg(short, long)]
    pub file: PathBuf,

    /// Column holding machine names [default: sync.identifier_column]
    #[arg(long)]
    pub identifier_column: Option<String>,
}

/// Run the inspect command.
///
/// # Errors
///
/// Returns the load error if the table is unreadable or invalid.
pub fn run(app: &AppContext, args: &InspectArgs) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let column = args
        .identifier_column
        .as_deref()
        .unwrap_or(&config.sync.identifier_column);
    let inspection = loader::inspect(&SpreadsheetReader, &args.file, column)?;
    app.renderer().render_inspection(&args.file, &inspection)?;
    Ok(ExitCode::SUCCESS)
}
