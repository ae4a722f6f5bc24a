//! attrsync - bulk custom attributes for vCenter virtual machines

#![cfg_attr(test, allow(clippy::expect_used))]

use std::process::ExitCode;

use attrsync_cli::cli::Cli;
use attrsync_cli::output::json;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter, e.g. `attrsync_cli=debug`.
const LOG_ENV: &str = "ATTRSYNC_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json_errors = cli.json;
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            if json_errors {
                match json::format_error(&format!("{e:#}"), json::error_code(&e)) {
                    Ok(out) => println!("{out}"),
                    Err(_) => eprintln!("Error: {e}"),
                }
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

/// `-v` wins over the environment; otherwise `ATTRSYNC_LOG`, then `RUST_LOG`,
/// then warnings only.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("warn,attrsync_cli=debug"),
        _ => EnvFilter::new("warn,attrsync_cli=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
