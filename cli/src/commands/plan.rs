//! `iragent plan` — compute and print the action plan. No side effects.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::reconcile::build_plan;
use crate::commands::{DesiredArgs, observe_or_load};
use crate::domain::validate;
use crate::infra::assets;

/// Arguments for the plan command.
#[derive(Args, Default)]
pub struct PlanArgs {
    #[command(flatten)]
    pub desired: DesiredArgs,

    /// Plan against a facts snapshot instead of probing the host
    #[arg(long, value_name = "FILE")]
    pub facts: Option<PathBuf>,
}

/// Run `iragent plan`.
///
/// # Errors
///
/// Returns an error on invalid desired state or an unsupported platform.
pub async fn run(args: &PlanArgs, app: &AppContext) -> Result<()> {
    let raw = args.desired.resolve()?;
    let desired = validate(&raw)?;
    let observed = observe_or_load(app, args.facts.as_deref()).await?;
    let audit = assets::audit_content()?;
    let plan = build_plan(&desired, &observed, &app.layout, &audit)?;
    app.renderer().render_plan(&observed, &plan)
}
