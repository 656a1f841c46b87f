use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether the agent should be installed or removed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Absent => f.write_str("absent"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid ensure value '{0}': expected 'present' or 'absent'")]
pub struct ParseEnsureError(pub String);

impl FromStr for Ensure {
    type Err = ParseEnsureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            other => Err(ParseEnsureError(other.to_string())),
        }
    }
}

/// Declared parameters for one reconciliation pass.
///
/// This is the raw document as read from YAML or assembled from flags.
/// It is not yet validated: `source` and `token` are optional here because
/// they are only required when `ensure` is `present`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct DesiredState {
    pub ensure: Ensure,
    /// Installer payload location (local path or `file://` URL).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Opaque registration credential passed to the installer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Version the installed agent must report; a mismatch triggers a reinstall.
    #[serde(alias = "semantic_version", skip_serializing_if = "Option::is_none")]
    pub target_version: Option<String>,
    /// HTTPS proxy as `host:port`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_proxy: Option<String>,
    pub auditd_compatibility_mode: bool,
    pub manage_auditd: bool,
}
