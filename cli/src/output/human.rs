//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;

use crate::domain::{AttrsyncConfig, RowOutcome, RunSummary, TableInspection};
use crate::infra::config::CONFIG_ENV;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("attrsync {version}");
    }

    /// Render the totals of a run, then the machines that need attention.
    pub fn render_summary(&self, summary: &RunSummary) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header("Summary");
        self.ctx.kv(
            "Rows:",
            &format!("{}/{} processed", summary.processed_rows, summary.total_rows),
        );
        self.ctx.kv("Resolved:", &summary.resolved.to_string());
        self.ctx.kv("Not found:", &summary.not_found.to_string());
        if summary.lookup_failed > 0 {
            self.ctx
                .kv("Lookup failed:", &summary.lookup_failed.to_string());
        }
        self.ctx.kv(
            "Fields:",
            &format!(
                "{} applied, {} failed",
                summary.fields_applied, summary.fields_failed
            ),
        );
        self.ctx.kv(
            "Duration:",
            &format_duration(summary.finished_at - summary.started_at),
        );

        let missing = not_found_machines(summary);
        if !missing.is_empty() {
            println!();
            self.ctx
                .warn(&format!("Not found: {}", missing.join(", ")));
        }
        if summary.cancelled {
            self.ctx.warn("Run was cancelled; remaining rows were not processed");
        }
    }

    /// Render the overview of an input table.
    pub fn render_inspection(&self, file: &Path, inspection: &TableInspection) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header(&format!("{}", file.display()));
        self.ctx
            .kv("Identifier:", &inspection.identifier_column);
        self.ctx.kv("Rows:", &inspection.rows.to_string());
        let columns = if inspection.attribute_columns.is_empty() {
            "(none)".to_string()
        } else {
            inspection.attribute_columns.join(", ")
        };
        self.ctx.kv("Attributes:", &columns);

        if inspection.machines.is_empty() {
            self.ctx.info("No data rows; apply would change nothing");
            return;
        }
        println!();
        for entry in &inspection.machines {
            let blank = if entry.blank > 0 {
                format!(" ({} blank)", entry.blank)
            } else {
                String::new()
            };
            println!(
                "    {:<24} {} fields{}",
                entry.machine.style(self.ctx.styles.machine),
                entry.fields,
                blank.style(self.ctx.styles.dim)
            );
        }
    }

    /// Render the current attrsync configuration.
    pub fn render_config(&self, config: &AttrsyncConfig, path: &Path) {
        let unset = || "(not set)".to_string();
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        println!(
            "  {:<28} {}",
            "connection.host:",
            config.connection.host.clone().unwrap_or_else(unset)
        );
        println!(
            "  {:<28} {}",
            "connection.user:",
            config.connection.user.clone().unwrap_or_else(unset)
        );
        println!(
            "  {:<28} {}",
            "connection.verify_tls:", config.connection.verify_tls
        );
        println!(
            "  {:<28} {}",
            "connection.timeout_secs:",
            config
                .connection
                .timeout_secs
                .map_or_else(unset, |s| s.to_string())
        );
        println!(
            "  {:<28} {}",
            "sync.identifier_column:", config.sync.identifier_column
        );
        println!(
            "  {:<28} {}",
            "sync.inventory_refresh:", config.sync.inventory_refresh
        );
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in [CONFIG_ENV, "ATTRSYNC_HOST", "ATTRSYNC_USER", "NO_COLOR"] {
            println!(
                "    {:<26} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| unset())
            );
        }
        println!(
            "    {:<26} {}",
            "ATTRSYNC_PASSWORD:",
            if std::env::var("ATTRSYNC_PASSWORD").is_ok() {
                "(set)"
            } else {
                "(not set)"
            }
        );
        if !config.connection.verify_tls {
            println!();
            self.ctx
                .warn("TLS certificate verification is off (connection.verify_tls = false)");
        }
        println!();
    }
}

/// Format a run duration as `1m 05s`, `12.3s`, or `450ms`.
#[must_use]
pub fn format_duration(elapsed: chrono::TimeDelta) -> String {
    let millis = elapsed.num_milliseconds().max(0);
    if millis < 1_000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{}.{}s", millis / 1_000, (millis % 1_000) / 100)
    } else {
        let secs = millis / 1_000;
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// Machines whose rows ended in `MachineNotFound`, in row order.
#[must_use]
pub fn not_found_machines(summary: &RunSummary) -> Vec<&str> {
    summary
        .rows
        .iter()
        .filter(|r| matches!(r.outcome, RowOutcome::MachineNotFound))
        .map(|r| r.machine.as_str())
        .collect()
}
