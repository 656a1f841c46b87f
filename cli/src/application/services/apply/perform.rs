//! Idempotent execution of individual actions.
//!
//! Every function checks current host state first and only mutates when it
//! differs. In noop mode the check runs but the mutation does not.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::application::ports::Host;
use crate::domain::action::{Action, ServiceState};
use crate::domain::desired::local_source_path;
use crate::domain::engine::{QUEUE_DEPTH_MATCH, compat_marker_content, queue_depth_line};
use crate::domain::file_line::ensure_line;

use super::report::{ApplyMode, Outcome};

/// Upper bound for one installer invocation.
pub const INSTALLER_TIMEOUT: Duration = Duration::from_secs(600);

/// Result of performing one action.
#[derive(Debug)]
pub(super) struct Effect {
    pub outcome: Outcome,
    pub detail: Option<String>,
}

impl Effect {
    fn unchanged() -> Self {
        Self {
            outcome: Outcome::Unchanged,
            detail: None,
        }
    }

    fn changed(detail: impl Into<String>, mode: ApplyMode) -> Self {
        let outcome = match mode {
            ApplyMode::Commit => Outcome::Changed,
            ApplyMode::Noop => Outcome::WouldChange,
        };
        Self {
            outcome,
            detail: Some(detail.into()),
        }
    }
}

pub(super) async fn perform(host: &impl Host, action: &Action, mode: ApplyMode) -> Result<Effect> {
    match action {
        Action::EnsureAgentHome { path } => ensure_dir(host, path, mode),
        Action::StageInstaller {
            source,
            path,
            mode: file_mode,
        } => stage_installer(host, source, path, *file_mode, mode),
        Action::InstallAgent {
            mode: install,
            installer,
            args,
        } => {
            let mut argv = vec![install.verb()];
            argv.extend(args.iter().map(String::as_str));
            run_installer(host, installer, &argv, mode).await
        }
        Action::UninstallAgent { installer } => uninstall_agent(host, installer, mode).await,
        Action::WriteProxyConfig {
            path,
            content,
            mode: file_mode,
        } => ensure_file(host, path, content.as_bytes(), Some(*file_mode), mode),
        Action::RemoveProxyConfig { path } | Action::RemoveAuditCompatFile { path } => {
            ensure_absent(host, path, mode)
        }
        Action::WriteAuditCompatFile { path, enabled } => {
            ensure_file(host, path, compat_marker_content(*enabled).as_bytes(), None, mode)
        }
        Action::InstallAuditPackage { package } => ensure_package(host, package, mode).await,
        Action::ApplyAuditRules { path, content }
        | Action::ApplyAuditUnixPlugin { path, content }
        | Action::RestoreAuditRules { path, content }
        | Action::RestoreAuditUnixConf { path, content } => {
            ensure_file(host, path, content.as_bytes(), None, mode)
        }
        Action::SetAuditQueueDepth { path, depth } => ensure_queue_depth(host, path, *depth, mode),
        Action::StopAgentService { service } => ensure_stopped(host, service, mode).await,
        Action::SetAuditdServiceState { service, state }
        | Action::SetAgentServiceState { service, state } => match state {
            ServiceState::Running => ensure_running(host, service, mode).await,
            ServiceState::Stopped => ensure_stopped(host, service, mode).await,
        },
        Action::StartAuditd { service } => ensure_running(host, service, mode).await,
        Action::RestartService { service } => restart(host, service, mode).await,
    }
}

// ── Files ─────────────────────────────────────────────────────────────────────

fn ensure_dir(host: &impl Host, path: &Path, mode: ApplyMode) -> Result<Effect> {
    if host.is_dir(path) {
        return Ok(Effect::unchanged());
    }
    if host.exists(path) {
        bail!("{} exists and is not a directory", path.display());
    }
    if mode == ApplyMode::Commit {
        host.create_dir_all(path)?;
    }
    Ok(Effect::changed("created", mode))
}

fn stage_installer(
    host: &impl Host,
    source: &str,
    path: &Path,
    file_mode: u32,
    mode: ApplyMode,
) -> Result<Effect> {
    let Some(source_path) = local_source_path(source) else {
        bail!("installer source '{source}' is not a local path");
    };
    let payload = host
        .read(Path::new(source_path))
        .with_context(|| format!("reading installer source {source_path}"))?
        .with_context(|| format!("installer source {source_path} not found"))?;
    ensure_file(host, path, &payload, Some(file_mode), mode)
}

fn ensure_file(
    host: &impl Host,
    path: &Path,
    content: &[u8],
    file_mode: Option<u32>,
    mode: ApplyMode,
) -> Result<Effect> {
    let current = host
        .read(path)
        .with_context(|| format!("reading {}", path.display()))?;

    if current.as_deref() != Some(content) {
        let detail = match &current {
            None => format!("created {}", digest(content)),
            Some(old) => format!("{} -> {}", digest(old), digest(content)),
        };
        if mode == ApplyMode::Commit {
            host.write_atomic(path, content, file_mode)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        return Ok(Effect::changed(detail, mode));
    }

    if let Some(wanted) = file_mode {
        let actual = host.mode(path)?;
        if actual != Some(wanted) {
            if mode == ApplyMode::Commit {
                host.set_mode(path, wanted)?;
            }
            let from = actual.map_or_else(|| "none".to_string(), |m| format!("{m:04o}"));
            return Ok(Effect::changed(format!("mode {from} -> {wanted:04o}"), mode));
        }
    }
    Ok(Effect::unchanged())
}

fn ensure_absent(host: &impl Host, path: &Path, mode: ApplyMode) -> Result<Effect> {
    if !host.exists(path) {
        return Ok(Effect::unchanged());
    }
    if mode == ApplyMode::Commit {
        host.remove_file(path)
            .with_context(|| format!("removing {}", path.display()))?;
    }
    Ok(Effect::changed("removed", mode))
}

fn ensure_queue_depth(
    host: &impl Host,
    path: &Path,
    depth: u32,
    mode: ApplyMode,
) -> Result<Effect> {
    let current = host
        .read(path)
        .with_context(|| format!("reading {}", path.display()))?
        .unwrap_or_default();
    let current = String::from_utf8(current)
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
    let matcher = Regex::new(QUEUE_DEPTH_MATCH)?;
    let line = queue_depth_line(depth);
    let Some(updated) = ensure_line(&current, &matcher, &line) else {
        return Ok(Effect::unchanged());
    };
    if mode == ApplyMode::Commit {
        host.write_atomic(path, updated.as_bytes(), None)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(Effect::changed(line, mode))
}

/// Short content fingerprint for reports.
fn digest(content: &[u8]) -> String {
    let hash = Sha256::digest(content);
    let hex: String = hash.iter().take(6).map(|b| format!("{b:02x}")).collect();
    format!("sha256:{hex}")
}

// ── Processes, packages and services ──────────────────────────────────────────

async fn run_installer(
    host: &impl Host,
    installer: &Path,
    argv: &[&str],
    mode: ApplyMode,
) -> Result<Effect> {
    // argv[1..] may carry the token; never include it in messages.
    let verb = argv.first().copied().unwrap_or_default();
    if mode == ApplyMode::Commit {
        let program = installer.to_string_lossy();
        let output = host
            .run_with_timeout(&program, argv, INSTALLER_TIMEOUT)
            .await
            .with_context(|| format!("running {} {verb}", installer.display()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} {verb} exited with {}: {}",
                installer.display(),
                output.status,
                stderr.trim()
            );
        }
    }
    Ok(Effect::changed(format!("ran {verb}"), mode))
}

/// The staged installer goes away with the agent so the uninstall guard
/// stays closed on later passes.
async fn uninstall_agent(host: &impl Host, installer: &Path, mode: ApplyMode) -> Result<Effect> {
    let ran = run_installer(host, installer, &["uninstall"], mode).await?;
    if mode == ApplyMode::Commit && host.exists(installer) {
        host.remove_file(installer)
            .with_context(|| format!("removing {}", installer.display()))?;
    }
    Ok(Effect {
        detail: Some("ran uninstall, removed installer".to_string()),
        ..ran
    })
}

async fn ensure_package(host: &impl Host, package: &str, mode: ApplyMode) -> Result<Effect> {
    if host.is_installed(package).await? {
        return Ok(Effect::unchanged());
    }
    if mode == ApplyMode::Commit {
        host.install(package).await?;
    }
    Ok(Effect::changed("installed", mode))
}

async fn ensure_running(host: &impl Host, service: &str, mode: ApplyMode) -> Result<Effect> {
    let mut changes = Vec::new();
    if !host.is_running(service).await? {
        if mode == ApplyMode::Commit {
            host.start(service).await?;
        }
        changes.push("started");
    }
    if !host.is_enabled(service).await? {
        if mode == ApplyMode::Commit {
            host.enable(service).await?;
        }
        changes.push("enabled");
    }
    if changes.is_empty() {
        Ok(Effect::unchanged())
    } else {
        Ok(Effect::changed(changes.join(", "), mode))
    }
}

async fn ensure_stopped(host: &impl Host, service: &str, mode: ApplyMode) -> Result<Effect> {
    if !host.is_running(service).await? {
        return Ok(Effect::unchanged());
    }
    if mode == ApplyMode::Commit {
        host.stop(service).await?;
    }
    Ok(Effect::changed("stopped", mode))
}

async fn restart(host: &impl Host, service: &str, mode: ApplyMode) -> Result<Effect> {
    if mode == ApplyMode::Commit {
        host.restart(service).await?;
        return Ok(Effect::changed("restarted", mode));
    }
    Ok(Effect::changed("would restart", mode))
}
