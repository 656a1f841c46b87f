//! iragent — reconcile the Rapid7 Insight Agent and auditd on Linux hosts

use clap::Parser;
use tracing_subscriber::EnvFilter;

use iragent_cli::application::services::apply::ActionError;
use iragent_cli::cli::Cli;
use iragent_cli::domain::{ObservationError, ValidationError};
use iragent_cli::output::json::error_document;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json = cli.json;
    if let Err(e) = cli.run().await {
        tracing::debug!(error = ?e, "command failed");
        if json {
            match error_document(&e, error_code(&e)) {
                Ok(Some(out)) => println!("{out}"),
                Ok(None) => {}
                Err(_) => eprintln!("Error: {e:#}"),
            }
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}

/// Logs go to stderr so `--json` stdout stays machine readable.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn error_code(e: &anyhow::Error) -> &'static str {
    if e.downcast_ref::<ValidationError>().is_some() {
        "validation_error"
    } else if e.downcast_ref::<ObservationError>().is_some() {
        "observation_error"
    } else if e.downcast_ref::<ActionError>().is_some() {
        "action_error"
    } else {
        "error"
    }
}
