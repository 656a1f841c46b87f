use std::path::PathBuf;

/// Name of the agent's init service.
pub const AGENT_SERVICE: &str = "ir_agent";
/// Name of the OS audit daemon service.
pub const AUDIT_SERVICE: &str = "auditd";
/// Package that provides the audit daemon.
pub const AUDIT_PACKAGE: &str = "audit";

const DEFAULT_HOME: &str = "/opt/rapid7";

/// Where the agent and its installer live on disk.
///
/// All paths are derived from `home`; the default is `/opt/rapid7`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentLayout {
    pub home: PathBuf,
}

impl Default for AgentLayout {
    fn default() -> Self {
        Self::with_home(DEFAULT_HOME)
    }
}

impl AgentLayout {
    #[must_use]
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    #[must_use]
    pub fn installer(&self) -> PathBuf {
        self.home.join("agent_installer_x64.sh")
    }

    #[must_use]
    pub fn agent_dir(&self) -> PathBuf {
        self.home.join("ir_agent")
    }

    #[must_use]
    pub fn agent_binary(&self) -> PathBuf {
        self.agent_dir().join("ir_agent")
    }

    #[must_use]
    pub fn proxy_config(&self) -> PathBuf {
        self.agent_dir()
            .join("components")
            .join("bootstrap")
            .join("common")
            .join("proxy.config")
    }

    #[must_use]
    pub fn audit_compat_marker(&self) -> PathBuf {
        self.agent_dir()
            .join("components")
            .join("insight_agent")
            .join("common")
            .join("audit.conf")
    }
}
