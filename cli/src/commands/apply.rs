//! `iragent apply` — run one reconciliation pass.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::apply::ApplyMode;
use crate::application::services::reconcile::{ReconcileOptions, reconcile};
use crate::commands::DesiredArgs;
use crate::infra::assets;

/// Arguments for the apply command.
#[derive(Args, Default)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub desired: DesiredArgs,

    /// Evaluate checks and report what would change without changing it
    #[arg(long)]
    pub noop: bool,
}

/// Run `iragent apply`.
///
/// # Errors
///
/// Returns an error on invalid desired state, an unsupported platform, or
/// the first failed action. The report is printed before an action error
/// is returned.
pub async fn run(args: &ApplyArgs, app: &AppContext) -> Result<()> {
    let raw = args.desired.resolve()?;
    let audit = assets::audit_content()?;
    let mode = if args.noop {
        ApplyMode::Noop
    } else {
        ApplyMode::Commit
    };
    let reporter = app.terminal_reporter();

    let mut outcome = reconcile(
        &app.host,
        &app.probe,
        &raw,
        ReconcileOptions {
            reporter: &reporter,
            layout: &app.layout,
            audit: &audit,
            mode,
        },
    )
    .await?;

    app.renderer().render_report(&outcome.report)?;
    match outcome.report.take_error() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
