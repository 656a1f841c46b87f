//! `iragent facts` — print the observed host facts.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::observe_or_load;

/// Arguments for the facts command.
#[derive(Args, Debug, Default)]
pub struct FactsArgs {
    /// Re-render a facts snapshot instead of probing the host
    #[arg(long, value_name = "FILE")]
    pub facts: Option<PathBuf>,
}

/// Run `iragent facts`.
///
/// # Errors
///
/// Returns an error if the platform is unsupported or the snapshot invalid.
pub async fn run(args: &FactsArgs, app: &AppContext) -> Result<()> {
    let observed = observe_or_load(app, args.facts.as_deref()).await?;
    app.renderer().render_facts(&observed)
}
