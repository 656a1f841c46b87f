//! Platform lookup table: OS major release → audit file locations and tooling.
//!
//! Resolved once during fact collection; the decision engine only ever sees a
//! resolved [`Platform`].

use iragent_common::PlatformId;

use crate::domain::error::ObservationError;

/// Init system used to query and enable services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitSystem {
    /// `chkconfig` for boot enablement.
    SysV,
    /// `systemctl` for boot enablement.
    Systemd,
}

/// Package manager front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageTool {
    Yum,
    Dnf,
}

impl PackageTool {
    #[must_use]
    pub fn program(self) -> &'static str {
        match self {
            Self::Yum => "/usr/bin/yum",
            Self::Dnf => "/usr/bin/dnf",
        }
    }
}

/// Audit subsystem file locations for one OS major release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditPaths {
    /// Rules file loaded when auditd starts.
    pub rules: &'static str,
    /// File holding the `q_depth` setting (audispd.conf or auditd.conf).
    pub queue_depth_conf: &'static str,
    /// Directory containing dispatcher plugin configs.
    pub plugins_dir: &'static str,
}

impl AuditPaths {
    #[must_use]
    pub fn af_unix_conf(&self) -> String {
        format!("{}/af_unix.conf", self.plugins_dir)
    }
}

/// A fully resolved, supported platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub id: PlatformId,
    pub audit: AuditPaths,
    pub init: InitSystem,
    pub package_tool: PackageTool,
}

struct Profile {
    major: u32,
    audit: AuditPaths,
    init: InitSystem,
    package_tool: PackageTool,
}

const EL6_AUDIT: AuditPaths = AuditPaths {
    rules: "/etc/audit/audit.rules",
    queue_depth_conf: "/etc/audisp/audispd.conf",
    plugins_dir: "/etc/audisp/plugins.d",
};

const EL7_AUDIT: AuditPaths = AuditPaths {
    rules: "/etc/audit/rules.d/audit.rules",
    queue_depth_conf: "/etc/audisp/audispd.conf",
    plugins_dir: "/etc/audisp/plugins.d",
};

const EL8_AUDIT: AuditPaths = AuditPaths {
    rules: "/etc/audit/rules.d/audit.rules",
    queue_depth_conf: "/etc/audit/auditd.conf",
    plugins_dir: "/etc/audit/plugins.d",
};

const PROFILES: &[Profile] = &[
    Profile {
        major: 6,
        audit: EL6_AUDIT,
        init: InitSystem::SysV,
        package_tool: PackageTool::Yum,
    },
    Profile {
        major: 7,
        audit: EL7_AUDIT,
        init: InitSystem::Systemd,
        package_tool: PackageTool::Yum,
    },
    Profile {
        major: 8,
        audit: EL8_AUDIT,
        init: InitSystem::Systemd,
        package_tool: PackageTool::Dnf,
    },
    Profile {
        major: 9,
        audit: EL8_AUDIT,
        init: InitSystem::Systemd,
        package_tool: PackageTool::Dnf,
    },
];

/// `/etc/os-release` `ID` values whose release numbering follows RHEL.
const RHEL_FAMILY: &[&str] = &["rhel", "centos", "rocky", "almalinux", "ol", "scientific"];

/// Resolve a platform identifier against the lookup table.
///
/// # Errors
///
/// Returns an error unless the host runs a profiled release of a RHEL-family
/// Linux distribution.
pub fn resolve(id: &PlatformId) -> Result<Platform, ObservationError> {
    if !id.kernel.eq_ignore_ascii_case("linux") {
        return Err(ObservationError::UnsupportedKernel(id.kernel.clone()));
    }
    if !RHEL_FAMILY.iter().any(|f| id.os_id.eq_ignore_ascii_case(f)) {
        return Err(ObservationError::UnsupportedDistribution(id.os_id.clone()));
    }
    let profile = PROFILES.iter().find(|p| p.major == id.major).ok_or_else(|| {
        ObservationError::UnsupportedRelease {
            os_id: id.os_id.clone(),
            major: id.major,
        }
    })?;
    Ok(Platform {
        id: id.clone(),
        audit: profile.audit,
        init: profile.init,
        package_tool: profile.package_tool,
    })
}

/// Extract `(ID, major VERSION_ID)` from `/etc/os-release` content.
///
/// # Errors
///
/// Returns an error if `VERSION_ID` is missing or its major part is not numeric.
pub fn parse_os_release(content: &str) -> Result<(String, u32), ObservationError> {
    let mut os_id = None;
    let mut version_id = None;
    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        match key.trim() {
            "ID" => os_id = Some(value.to_string()),
            "VERSION_ID" => version_id = Some(value.to_string()),
            _ => {}
        }
    }
    let version_id =
        version_id.ok_or_else(|| ObservationError::UnknownRelease("VERSION_ID missing".into()))?;
    let major = version_id
        .split('.')
        .next()
        .unwrap_or_default()
        .parse::<u32>()
        .map_err(|_| ObservationError::UnknownRelease(format!("VERSION_ID '{version_id}'")))?;
    Ok((os_id.unwrap_or_else(|| "linux".to_string()), major))
}

// ── Unit tests ────────────────────────────────────────────────────────────────
