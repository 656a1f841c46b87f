//! Action plan model: typed action nodes with ordering and notification edges.
//!
//! A [`Plan`] is an explicit DAG. `requires` edges order a predecessor before
//! its dependent; `notify` edges order the source before the target and, at
//! apply time, re-trigger the target when the source changed something.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

use crate::domain::error::PlanError;

// ── Identifiers ───────────────────────────────────────────────────────────────

/// Node identity. A plan holds at most one action of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    EnsureAgentHome,
    StageInstaller,
    InstallAgent,
    UninstallAgent,
    StopAgentService,
    WriteProxyConfig,
    RemoveProxyConfig,
    WriteAuditCompatFile,
    RemoveAuditCompatFile,
    InstallAuditPackage,
    ApplyAuditRules,
    ApplyAuditUnixPlugin,
    SetAuditQueueDepth,
    SetAuditdServiceState,
    SetAgentServiceState,
    RestartService,
    RestoreAuditRules,
    RestoreAuditUnixConf,
    StartAuditd,
}

impl ActionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnsureAgentHome => "ensure_agent_home",
            Self::StageInstaller => "stage_installer",
            Self::InstallAgent => "install_agent",
            Self::UninstallAgent => "uninstall_agent",
            Self::StopAgentService => "stop_agent_service",
            Self::WriteProxyConfig => "write_proxy_config",
            Self::RemoveProxyConfig => "remove_proxy_config",
            Self::WriteAuditCompatFile => "write_audit_compat_file",
            Self::RemoveAuditCompatFile => "remove_audit_compat_file",
            Self::InstallAuditPackage => "install_audit_package",
            Self::ApplyAuditRules => "apply_audit_rules",
            Self::ApplyAuditUnixPlugin => "apply_audit_unix_plugin",
            Self::SetAuditQueueDepth => "set_audit_queue_depth",
            Self::SetAuditdServiceState => "set_auditd_service_state",
            Self::SetAgentServiceState => "set_agent_service_state",
            Self::RestartService => "restart_service",
            Self::RestoreAuditRules => "restore_audit_rules",
            Self::RestoreAuditUnixConf => "restore_audit_unix_conf",
            Self::StartAuditd => "start_auditd",
        }
    }

    /// Actions that belong to the host audit daemon rather than the agent.
    #[must_use]
    pub fn is_audit_daemon(self) -> bool {
        matches!(
            self,
            Self::InstallAuditPackage
                | Self::ApplyAuditRules
                | Self::ApplyAuditUnixPlugin
                | Self::SetAuditQueueDepth
                | Self::SetAuditdServiceState
                | Self::RestoreAuditRules
                | Self::RestoreAuditUnixConf
                | Self::StartAuditd
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ── Actions ───────────────────────────────────────────────────────────────────

/// Installer entrypoint used for the agent action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallMode {
    Install,
    Reinstall,
}

impl InstallMode {
    /// Installer subcommand for this mode.
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Self::Install => "install_start",
            Self::Reinstall => "reinstall_start",
        }
    }
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => f.write_str("install"),
            Self::Reinstall => f.write_str("reinstall"),
        }
    }
}

/// Declared service state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Running,
    Stopped,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}

/// One idempotent unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    EnsureAgentHome {
        path: PathBuf,
    },
    StageInstaller {
        source: String,
        path: PathBuf,
        mode: u32,
    },
    InstallAgent {
        mode: InstallMode,
        installer: PathBuf,
        #[serde(serialize_with = "serialize_redacted_args")]
        args: Vec<String>,
    },
    UninstallAgent {
        installer: PathBuf,
    },
    StopAgentService {
        service: String,
    },
    WriteProxyConfig {
        path: PathBuf,
        content: String,
        mode: u32,
    },
    RemoveProxyConfig {
        path: PathBuf,
    },
    WriteAuditCompatFile {
        path: PathBuf,
        enabled: bool,
    },
    RemoveAuditCompatFile {
        path: PathBuf,
    },
    InstallAuditPackage {
        package: String,
    },
    ApplyAuditRules {
        path: PathBuf,
        #[serde(skip)]
        content: String,
    },
    ApplyAuditUnixPlugin {
        path: PathBuf,
        #[serde(skip)]
        content: String,
    },
    SetAuditQueueDepth {
        path: PathBuf,
        depth: u32,
    },
    SetAuditdServiceState {
        service: String,
        state: ServiceState,
    },
    SetAgentServiceState {
        service: String,
        state: ServiceState,
    },
    RestartService {
        service: String,
    },
    RestoreAuditRules {
        path: PathBuf,
        #[serde(skip)]
        content: String,
    },
    RestoreAuditUnixConf {
        path: PathBuf,
        #[serde(skip)]
        content: String,
    },
    StartAuditd {
        service: String,
    },
}

impl Action {
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::EnsureAgentHome { .. } => ActionKind::EnsureAgentHome,
            Self::StageInstaller { .. } => ActionKind::StageInstaller,
            Self::InstallAgent { .. } => ActionKind::InstallAgent,
            Self::UninstallAgent { .. } => ActionKind::UninstallAgent,
            Self::StopAgentService { .. } => ActionKind::StopAgentService,
            Self::WriteProxyConfig { .. } => ActionKind::WriteProxyConfig,
            Self::RemoveProxyConfig { .. } => ActionKind::RemoveProxyConfig,
            Self::WriteAuditCompatFile { .. } => ActionKind::WriteAuditCompatFile,
            Self::RemoveAuditCompatFile { .. } => ActionKind::RemoveAuditCompatFile,
            Self::InstallAuditPackage { .. } => ActionKind::InstallAuditPackage,
            Self::ApplyAuditRules { .. } => ActionKind::ApplyAuditRules,
            Self::ApplyAuditUnixPlugin { .. } => ActionKind::ApplyAuditUnixPlugin,
            Self::SetAuditQueueDepth { .. } => ActionKind::SetAuditQueueDepth,
            Self::SetAuditdServiceState { .. } => ActionKind::SetAuditdServiceState,
            Self::SetAgentServiceState { .. } => ActionKind::SetAgentServiceState,
            Self::RestartService { .. } => ActionKind::RestartService,
            Self::RestoreAuditRules { .. } => ActionKind::RestoreAuditRules,
            Self::RestoreAuditUnixConf { .. } => ActionKind::RestoreAuditUnixConf,
            Self::StartAuditd { .. } => ActionKind::StartAuditd,
        }
    }

    /// Installer arguments with the token value masked, for display.
    #[must_use]
    pub fn redacted_args(args: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(args.len());
        let mut mask_next = false;
        for arg in args {
            if mask_next {
                out.push(mask_token(arg));
                mask_next = false;
            } else {
                mask_next = arg == "--token";
                out.push(arg.clone());
            }
        }
        out
    }

    /// One-line human description.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::EnsureAgentHome { path } => format!("directory {}", path.display()),
            Self::StageInstaller { source, path, mode } => {
                format!("stage {source} -> {} (mode {mode:04o})", path.display())
            }
            Self::InstallAgent { mode, installer, args } => format!(
                "{mode} agent: {} {} {}",
                installer.display(),
                mode.verb(),
                Self::redacted_args(args).join(" ")
            ),
            Self::UninstallAgent { installer } => format!("{} uninstall", installer.display()),
            Self::StopAgentService { service } => format!("stop service {service}"),
            Self::WriteProxyConfig { path, mode, .. } => {
                format!("write {} (mode {mode:04o})", path.display())
            }
            Self::RemoveProxyConfig { path } | Self::RemoveAuditCompatFile { path } => {
                format!("remove {}", path.display())
            }
            Self::WriteAuditCompatFile { path, enabled } => {
                format!("write {} (auditd-compatibility-mode={enabled})", path.display())
            }
            Self::InstallAuditPackage { package } => format!("package {package} installed"),
            Self::ApplyAuditRules { path, .. }
            | Self::ApplyAuditUnixPlugin { path, .. }
            | Self::RestoreAuditRules { path, .. }
            | Self::RestoreAuditUnixConf { path, .. } => format!("write {}", path.display()),
            Self::SetAuditQueueDepth { path, depth } => {
                format!("q_depth = {depth} in {}", path.display())
            }
            Self::SetAuditdServiceState { service, state }
            | Self::SetAgentServiceState { service, state } => {
                format!("service {service} {state}")
            }
            Self::RestartService { service } => format!("restart service {service}"),
            Self::StartAuditd { service } => format!("start service {service}"),
        }
    }
}

fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((region, _)) => format!("{region}:****"),
        None => "****".to_string(),
    }
}

fn serialize_redacted_args<S: Serializer>(args: &[String], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(Action::redacted_args(args))
}

// ── Guards and triggers ───────────────────────────────────────────────────────

/// Runtime precondition evaluated just before an action runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "path", rename_all = "snake_case")]
pub enum Guard {
    /// Run only if the path does not exist yet.
    Creates(PathBuf),
    /// Run unless the path exists.
    Unless(PathBuf),
    /// Run only if the path exists and is executable.
    OnlyIf(PathBuf),
}

/// When an action is eligible to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Every pass.
    #[default]
    Always,
    /// Only when notified by a predecessor that changed something.
    RefreshOnly,
}

// ── Nodes ─────────────────────────────────────────────────────────────────────

/// An action plus its edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanNode {
    pub action: Action,
    pub requires: Vec<ActionKind>,
    pub notify: Vec<ActionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<Guard>,
    pub trigger: Trigger,
}

impl PlanNode {
    #[must_use]
    pub fn new(action: Action) -> Self {
        Self {
            action,
            requires: Vec::new(),
            notify: Vec::new(),
            guard: None,
            trigger: Trigger::Always,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    #[must_use]
    pub fn requires(mut self, kind: ActionKind) -> Self {
        self.requires.push(kind);
        self
    }

    /// Add a predecessor when one was planned.
    #[must_use]
    pub fn requires_opt(self, kind: Option<ActionKind>) -> Self {
        match kind {
            Some(k) => self.requires(k),
            None => self,
        }
    }

    #[must_use]
    pub fn notifies(mut self, kind: ActionKind) -> Self {
        self.notify.push(kind);
        self
    }

    #[must_use]
    pub fn guarded(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    #[must_use]
    pub fn refresh_only(mut self) -> Self {
        self.trigger = Trigger::RefreshOnly;
        self
    }
}

// ── Plan ──────────────────────────────────────────────────────────────────────

/// Immutable, validated action graph with a resolved apply order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    nodes: Vec<PlanNode>,
    order: Vec<usize>,
}

impl Plan {
    /// Validate the graph and resolve its linear apply order.
    ///
    /// Ties between independent nodes are broken by declaration order, so
    /// the same inputs always yield the same order.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate kinds, edges to undeclared kinds, or cycles.
    pub fn build(nodes: Vec<PlanNode>) -> Result<Self, PlanError> {
        let mut index: HashMap<ActionKind, usize> = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.kind(), i).is_some() {
                return Err(PlanError::DuplicateAction(node.kind()));
            }
        }

        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut in_degree = vec![0usize; nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            for pred in &node.requires {
                let p = *index.get(pred).ok_or(PlanError::UnknownEdge {
                    from: node.kind(),
                    to: *pred,
                })?;
                successors[p].push(i);
                in_degree[i] += 1;
            }
            for target in &node.notify {
                let t = *index.get(target).ok_or(PlanError::UnknownEdge {
                    from: node.kind(),
                    to: *target,
                })?;
                successors[i].push(t);
                in_degree[t] += 1;
            }
        }

        let mut ready: BTreeSet<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(nodes.len());
        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &s in &successors[i] {
                in_degree[s] -= 1;
                if in_degree[s] == 0 {
                    ready.insert(s);
                }
            }
        }

        if let Some((_, stuck)) = nodes.iter().enumerate().find(|(i, _)| !order.contains(i)) {
            return Err(PlanError::Cycle(stuck.kind()));
        }

        Ok(Self { nodes, order })
    }

    /// Nodes in apply order.
    pub fn ordered(&self) -> impl Iterator<Item = &PlanNode> {
        self.order.iter().map(|&i| &self.nodes[i])
    }

    /// Action kinds in apply order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ActionKind> {
        self.ordered().map(PlanNode::kind).collect()
    }

    #[must_use]
    pub fn get(&self, kind: ActionKind) -> Option<&PlanNode> {
        self.nodes.iter().find(|n| n.kind() == kind)
    }

    #[must_use]
    pub fn contains(&self, kind: ActionKind) -> bool {
        self.get(kind).is_some()
    }

    /// Index of `kind` in apply order.
    #[must_use]
    pub fn position(&self, kind: ActionKind) -> Option<usize> {
        self.ordered().position(|n| n.kind() == kind)
    }

    /// Kinds whose `notify` list contains `kind`.
    #[must_use]
    pub fn notifiers_of(&self, kind: ActionKind) -> Vec<ActionKind> {
        self.ordered()
            .filter(|n| n.notify.contains(&kind))
            .map(PlanNode::kind)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Serialize for Plan {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(self.ordered())
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────
