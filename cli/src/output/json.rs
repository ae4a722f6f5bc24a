//! JSON output helpers.
//!
//! Provides the error-object formatter used by all `--json` code paths when
//! a command fails, and the renderer for successful results.

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::{AttrsyncConfig, ConfigError, LoadError, RunSummary, SyncError, TableInspection};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable code for a command failure, taken from the typed error in the chain.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<SyncError>() {
            return e.code();
        }
        if let Some(e) = cause.downcast_ref::<LoadError>() {
            return e.code();
        }
        if cause.is::<ConfigError>() {
            return "INVALID_CONFIG";
        }
    }
    "ERROR"
}

/// Renders results as pretty-printed JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    fn print(value: &impl serde::Serialize) -> Result<()> {
        let out = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
        println!("{out}");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_summary(&self, summary: &RunSummary) -> Result<()> {
        Self::print(summary)
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_inspection(&self, file: &Path, inspection: &TableInspection) -> Result<()> {
        Self::print(&serde_json::json!({
            "file": file.display().to_string(),
            "inspection": inspection,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &AttrsyncConfig, path: &Path) -> Result<()> {
        Self::print(&serde_json::json!({
            "path": path.display().to_string(),
            "config": config,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        Self::print(&serde_json::json!({ "version": version }))
    }
}
