//! Application service — fact collection use-case.
//!
//! Never fails because something is absent: a missing binary, a broken
//! `--version` output or an unreadable marker all degrade to defaults.
//! Only an unsupported platform is fatal.

use std::path::Path;
use std::time::Duration;

use iragent_common::{AgentLayout, AgentVersionRecord, HostFacts, Observation};
use tracing::{debug, warn};

use crate::application::ports::{CommandRunner, HostFs, PlatformProbe};
use crate::domain::error::ObservationError;
use crate::domain::facts::{assemble, parse_version_output};
use crate::domain::platform::{self, Platform};

/// Upper bound for `ir_agent --version`.
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Facts plus the resolved platform they were observed on.
#[derive(Debug, Clone)]
pub struct Observed {
    pub platform: Platform,
    pub facts: HostFacts,
}

impl Observed {
    /// Resolve a facts snapshot (e.g. loaded from a file).
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot names an unsupported platform.
    pub fn from_snapshot(snapshot: &Observation) -> Result<Self, ObservationError> {
        Ok(Self {
            platform: platform::resolve(&snapshot.platform)?,
            facts: snapshot.facts.clone(),
        })
    }

    /// Snapshot form, suitable for writing back to a file.
    #[must_use]
    pub fn snapshot(&self) -> Observation {
        Observation {
            platform: self.platform.id.clone(),
            facts: self.facts.clone(),
        }
    }
}

/// Identify the platform, then collect host facts.
///
/// # Errors
///
/// Returns an error only when the platform is unsupported or unidentifiable.
pub async fn observe(
    host: &(impl CommandRunner + HostFs),
    probe: &impl PlatformProbe,
    layout: &AgentLayout,
) -> Result<Observed, ObservationError> {
    let id = probe.identify()?;
    let platform = platform::resolve(&id)?;
    debug!(os_id = %id.os_id, major = id.major, "platform resolved");
    let facts = collect_facts(host, layout).await;
    Ok(Observed { platform, facts })
}

/// Read the agent's presence, version and audit-compatibility marker.
pub async fn collect_facts(
    host: &(impl CommandRunner + HostFs),
    layout: &AgentLayout,
) -> HostFacts {
    let binary = layout.agent_binary();
    let agent_present = host.exists(&binary);
    let version = if agent_present {
        read_agent_version(host, &binary).await
    } else {
        None
    };

    let marker_path = layout.audit_compat_marker();
    let marker = host.read(&marker_path).unwrap_or_else(|e| {
        warn!(path = %marker_path.display(), error = %e, "cannot read audit compatibility marker");
        None
    });

    let facts = assemble(agent_present, version, marker.as_deref());
    debug!(
        agent_present = facts.agent_present,
        agent_version = facts.agent_version.as_deref().unwrap_or("none"),
        audit_compat_file_present = facts.audit_compat_file_present,
        audit_compat_enabled = facts.audit_compat_enabled,
        "facts collected"
    );
    facts
}

async fn read_agent_version(
    runner: &impl CommandRunner,
    binary: &Path,
) -> Option<AgentVersionRecord> {
    let program = binary.to_string_lossy();
    let output = match runner
        .run_with_timeout(&program, &["--version"], VERSION_TIMEOUT)
        .await
    {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "cannot run agent version query");
            return None;
        }
    };
    if !output.status.success() {
        debug!(status = %output.status, "agent version query exited non-zero");
    }
    let record = parse_version_output(&output.stdout);
    if record.is_none() {
        warn!("agent version output is not valid JSON; treating version as unknown");
    }
    record
}
