use serde::{Deserialize, Serialize};

/// Self-reported version output of `ir_agent --version`.
///
/// Every field is optional: a build that omits one must still parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AgentVersionRecord {
    pub build_version: Option<String>,
    pub semantic_version: Option<String>,
}

/// Content of the audit-compatibility marker file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AuditCompatRecord {
    #[serde(rename = "auditd-compatibility-mode")]
    pub enabled: bool,
}

/// Immutable snapshot of the host, read once per pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct HostFacts {
    pub agent_present: bool,
    pub agent_version: Option<String>,
    pub build_version: Option<String>,
    pub audit_compat_file_present: bool,
    /// Only meaningful when the marker file is present.
    pub audit_compat_enabled: bool,
}

impl HostFacts {
    /// Facts for a host where the agent was never installed.
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// Merged record in the shape the agent itself reports.
    #[must_use]
    pub fn record(&self) -> FactsRecord {
        FactsRecord {
            build_version: self.build_version.clone(),
            semantic_version: self.agent_version.clone(),
            auditd_compatibility_mode: self.audit_compat_file_present && self.audit_compat_enabled,
        }
    }
}

/// `{build_version, semantic_version, auditd-compatibility-mode}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FactsRecord {
    pub build_version: Option<String>,
    pub semantic_version: Option<String>,
    #[serde(rename = "auditd-compatibility-mode")]
    pub auditd_compatibility_mode: bool,
}

/// Platform identifier resolved during fact collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformId {
    /// Kernel name as reported by the OS (`linux`).
    pub kernel: String,
    /// `ID` from `/etc/os-release` (`rhel`, `centos`, `rocky`, ...).
    pub os_id: String,
    /// Major component of `VERSION_ID`.
    pub major: u32,
}

/// Facts plus the platform they were observed on. This is the shape of a
/// facts snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Observation {
    pub platform: PlatformId,
    #[serde(default)]
    pub facts: HostFacts,
}
