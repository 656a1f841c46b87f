//! Command implementations

pub mod apply;
pub mod facts;
pub mod plan;
pub mod version;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use iragent_common::{DesiredState, Ensure};

use crate::app::AppContext;
use crate::application::ports::DesiredStateStore;
use crate::application::services::facts::{Observed, observe};
use crate::infra::config::YamlDesiredStateStore;
use crate::infra::snapshot::load_snapshot;
use crate::output::progress;

/// Desired-state source: the YAML document plus per-key flag overrides.
#[derive(Args, Default, Clone)]
pub struct DesiredArgs {
    /// Desired-state YAML document [default: /etc/iragent/desired.yaml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Install or remove the agent
    #[arg(long, value_enum)]
    pub ensure: Option<Ensure>,

    /// Installer payload (absolute path or file:// URL)
    #[arg(long)]
    pub source: Option<String>,

    /// Registration token passed to the installer
    #[arg(long, env = "IRAGENT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// HTTPS proxy as host:port
    #[arg(long, value_name = "HOST:PORT")]
    pub https_proxy: Option<String>,

    /// Version the installed agent must report
    #[arg(long, value_name = "VERSION")]
    pub target_version: Option<String>,

    /// Let auditd run beside the agent
    #[arg(long, value_name = "BOOL")]
    pub auditd_compatibility_mode: Option<bool>,

    /// Manage the audit package, rules and service
    #[arg(long, value_name = "BOOL")]
    pub manage_auditd: Option<bool>,
}

impl DesiredArgs {
    /// Load the document and apply flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or parsed.
    pub fn resolve(&self) -> Result<DesiredState> {
        let store = YamlDesiredStateStore::new(self.config.clone());
        let state = store.load()?;
        tracing::debug!(path = %store.path().display(), "desired state loaded");
        Ok(self.apply_overrides(state))
    }

    /// Overlay every flag that was given onto `state`.
    #[must_use]
    pub fn apply_overrides(&self, mut state: DesiredState) -> DesiredState {
        if let Some(ensure) = self.ensure {
            state.ensure = ensure;
        }
        if let Some(source) = &self.source {
            state.source = Some(source.clone());
        }
        if let Some(token) = &self.token {
            state.token = Some(token.clone());
        }
        if let Some(proxy) = &self.https_proxy {
            state.https_proxy = Some(proxy.clone());
        }
        if let Some(version) = &self.target_version {
            state.target_version = Some(version.clone());
        }
        if let Some(compat) = self.auditd_compatibility_mode {
            state.auditd_compatibility_mode = compat;
        }
        if let Some(manage) = self.manage_auditd {
            state.manage_auditd = manage;
        }
        state
    }
}

/// Observe the live host, or load a snapshot when one is given.
///
/// # Errors
///
/// Returns an error if the snapshot is unreadable or the platform unsupported.
pub async fn observe_or_load(app: &AppContext, snapshot: Option<&Path>) -> Result<Observed> {
    if let Some(path) = snapshot {
        let observation = load_snapshot(path)?;
        return Ok(Observed::from_snapshot(&observation)?);
    }
    let pb = progress::maybe_spinner(app.output.show_progress(), "collecting host facts");
    let observed = observe(&app.host, &app.probe, &app.layout).await;
    progress::finish_clear(&pb);
    Ok(observed?)
}
