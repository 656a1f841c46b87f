//! Pure parsing of observed host state into [`HostFacts`].
//!
//! Malformed input never fails: it degrades to "feature absent".

use iragent_common::{AgentVersionRecord, AuditCompatRecord, HostFacts};

/// Parse the JSON printed by `ir_agent --version`.
///
/// Tolerates banner lines around the JSON object. Returns `None` when no
/// parseable object is found.
#[must_use]
pub fn parse_version_output(stdout: &[u8]) -> Option<AgentVersionRecord> {
    let text = String::from_utf8_lossy(stdout);
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Read the compatibility flag from the marker file content.
///
/// Unparseable content counts as disabled.
#[must_use]
pub fn parse_compat_marker(content: &[u8]) -> bool {
    serde_json::from_slice::<AuditCompatRecord>(content).is_ok_and(|r| r.enabled)
}

/// Merge the individual observations into one snapshot.
#[must_use]
pub fn assemble(
    agent_present: bool,
    version: Option<AgentVersionRecord>,
    marker: Option<&[u8]>,
) -> HostFacts {
    let version = if agent_present {
        version.unwrap_or_default()
    } else {
        AgentVersionRecord::default()
    };
    let blank_to_none = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    HostFacts {
        agent_present,
        agent_version: blank_to_none(version.semantic_version),
        build_version: blank_to_none(version.build_version),
        audit_compat_file_present: marker.is_some(),
        audit_compat_enabled: marker.is_some_and(parse_compat_marker),
    }
}
