//! Decision engine: `(facts, desired) → ordered action plan`.
//!
//! Pure and deterministic. Every action emitted here is independently
//! idempotent, so re-running a pass after a partial failure is safe.

use iragent_common::{AGENT_SERVICE, AUDIT_PACKAGE, AUDIT_SERVICE, AgentLayout, HostFacts};

use crate::domain::action::{Action, ActionKind, Guard, InstallMode, Plan, PlanNode, ServiceState};
use crate::domain::desired::{Desired, PresentState, ProxyAddr, Token};
use crate::domain::error::PlanError;
use crate::domain::platform::Platform;
use crate::domain::version::versions_match;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Audit dispatcher queue depth. Fixed, not configurable.
pub const QUEUE_DEPTH: u32 = 8192;

/// Anchor used to find an existing `q_depth` setting.
pub const QUEUE_DEPTH_MATCH: &str = r"^q_depth\s*=";

/// Owner-only permissions for the proxy config and the installer.
pub const OWNER_ONLY_MODE: u32 = 0o700;

// ── Context ───────────────────────────────────────────────────────────────────

/// Static file content shipped with the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContent {
    pub rules: String,
    pub af_unix: String,
    pub default_rules: String,
    pub default_af_unix: String,
}

/// Everything the engine needs besides facts and desired state.
#[derive(Debug, Clone)]
pub struct PlanContext {
    pub layout: AgentLayout,
    pub platform: Platform,
    pub audit: AuditContent,
}

// ── Content renderers ─────────────────────────────────────────────────────────

/// `{"https": "<proxy>"}` plus a trailing newline.
#[must_use]
pub fn proxy_config_content(proxy: &ProxyAddr) -> String {
    format!("{{\"https\": \"{proxy}\"}}\n")
}

/// `{"auditd-compatibility-mode":<enabled>}` with no trailing newline.
#[must_use]
pub fn compat_marker_content(enabled: bool) -> String {
    format!("{{\"auditd-compatibility-mode\":{enabled}}}")
}

#[must_use]
pub fn queue_depth_line(depth: u32) -> String {
    format!("q_depth = {depth}")
}

// ── Decisions ─────────────────────────────────────────────────────────────────

/// Choose the agent action for `ensure = present`.
///
/// `None` means the installed agent already matches and no install action is
/// planned. A missing version on either side counts as a mismatch.
#[must_use]
pub fn select_install_mode(
    facts: &HostFacts,
    target_version: Option<&str>,
) -> Option<InstallMode> {
    if !facts.agent_present {
        Some(InstallMode::Install)
    } else if versions_match(facts.agent_version.as_deref(), target_version) {
        None
    } else {
        Some(InstallMode::Reinstall)
    }
}

/// Installer arguments: token first, then the optional proxy.
#[must_use]
pub fn installer_args(token: &Token, proxy: Option<&ProxyAddr>) -> Vec<String> {
    let mut args = vec!["--token".to_string(), token.expose().to_string()];
    if let Some(proxy) = proxy {
        args.push("--https-proxy".to_string());
        args.push(proxy.to_string());
    }
    args
}

/// Compute the action plan for one pass.
///
/// # Errors
///
/// Returns an error only if the generated graph is malformed, which indicates
/// a bug in the engine rather than bad input.
pub fn plan(facts: &HostFacts, desired: &Desired, ctx: &PlanContext) -> Result<Plan, PlanError> {
    let nodes = match desired {
        Desired::Present(present) => install_nodes(facts, present, ctx),
        Desired::Absent { manage_auditd } => uninstall_nodes(*manage_auditd, ctx),
    };
    Plan::build(nodes)
}

fn install_nodes(facts: &HostFacts, desired: &PresentState, ctx: &PlanContext) -> Vec<PlanNode> {
    let layout = &ctx.layout;
    let marker = layout.audit_compat_marker();
    let mut nodes = vec![
        PlanNode::new(Action::EnsureAgentHome {
            path: layout.home.clone(),
        }),
        PlanNode::new(Action::StageInstaller {
            source: desired.source.clone(),
            path: layout.installer(),
            mode: OWNER_ONLY_MODE,
        })
        .requires(ActionKind::EnsureAgentHome),
    ];

    let mode = select_install_mode(facts, desired.target_version.as_deref());
    let install = mode.map(|_| ActionKind::InstallAgent);
    if let Some(mode) = mode {
        let node = PlanNode::new(Action::InstallAgent {
            mode,
            installer: layout.installer(),
            args: installer_args(&desired.token, desired.https_proxy.as_ref()),
        })
        .requires(ActionKind::StageInstaller);
        nodes.push(match mode {
            InstallMode::Install => node.guarded(Guard::Creates(layout.agent_binary())),
            InstallMode::Reinstall => node,
        });
    }

    if desired.audit_compatibility_mode {
        // One-time transition: once the marker exists the agent is not stopped again.
        nodes.push(
            PlanNode::new(Action::StopAgentService {
                service: AGENT_SERVICE.to_string(),
            })
            .requires_opt(install)
            .guarded(Guard::Unless(marker.clone())),
        );
    }

    let proxy = match &desired.https_proxy {
        Some(proxy) => PlanNode::new(Action::WriteProxyConfig {
            path: layout.proxy_config(),
            content: proxy_config_content(proxy),
            mode: OWNER_ONLY_MODE,
        }),
        None => PlanNode::new(Action::RemoveProxyConfig {
            path: layout.proxy_config(),
        }),
    };
    nodes.push(proxy.requires_opt(install).notifies(ActionKind::SetAgentServiceState));

    let compat = if desired.audit_compatibility_mode {
        PlanNode::new(Action::WriteAuditCompatFile {
            path: marker,
            enabled: true,
        })
    } else {
        PlanNode::new(Action::RemoveAuditCompatFile { path: marker })
    };
    nodes.push(compat.requires_opt(install).notifies(ActionKind::SetAgentServiceState));

    if desired.manage_auditd {
        nodes.extend(auditd_nodes(desired.audit_compatibility_mode, ctx));
    }

    nodes.push(
        PlanNode::new(Action::SetAgentServiceState {
            service: AGENT_SERVICE.to_string(),
            state: ServiceState::Running,
        })
        .requires_opt(install),
    );
    nodes
}

fn auditd_nodes(compat: bool, ctx: &PlanContext) -> Vec<PlanNode> {
    let audit = &ctx.platform.audit;
    let mut nodes = vec![PlanNode::new(Action::InstallAuditPackage {
        package: AUDIT_PACKAGE.to_string(),
    })];

    if compat {
        nodes.push(
            PlanNode::new(Action::ApplyAuditRules {
                path: audit.rules.into(),
                content: ctx.audit.rules.clone(),
            })
            .requires(ActionKind::InstallAuditPackage)
            .notifies(ActionKind::SetAuditdServiceState),
        );
        nodes.push(
            PlanNode::new(Action::ApplyAuditUnixPlugin {
                path: audit.af_unix_conf().into(),
                content: ctx.audit.af_unix.clone(),
            })
            .requires(ActionKind::InstallAuditPackage)
            .notifies(ActionKind::SetAuditdServiceState),
        );
        nodes.push(
            PlanNode::new(Action::SetAuditQueueDepth {
                path: audit.queue_depth_conf.into(),
                depth: QUEUE_DEPTH,
            })
            .requires(ActionKind::InstallAuditPackage)
            .notifies(ActionKind::SetAuditdServiceState),
        );
        // auditd takes over only after the agent's own audit shim is stopped.
        nodes.push(
            PlanNode::new(Action::SetAuditdServiceState {
                service: AUDIT_SERVICE.to_string(),
                state: ServiceState::Running,
            })
            .requires(ActionKind::InstallAuditPackage)
            .requires(ActionKind::StopAgentService)
            .notifies(ActionKind::SetAgentServiceState),
        );
    } else {
        nodes.push(
            PlanNode::new(Action::SetAuditdServiceState {
                service: AUDIT_SERVICE.to_string(),
                state: ServiceState::Stopped,
            })
            .requires(ActionKind::InstallAuditPackage)
            .notifies(ActionKind::SetAgentServiceState),
        );
    }
    nodes
}

fn uninstall_nodes(manage_auditd: bool, ctx: &PlanContext) -> Vec<PlanNode> {
    let installer = ctx.layout.installer();
    let mut uninstall = PlanNode::new(Action::UninstallAgent {
        installer: installer.clone(),
    })
    .guarded(Guard::OnlyIf(installer));

    if !manage_auditd {
        return vec![uninstall];
    }

    let audit = &ctx.platform.audit;
    let restores = [
        PlanNode::new(Action::RestoreAuditRules {
            path: audit.rules.into(),
            content: ctx.audit.default_rules.clone(),
        }),
        PlanNode::new(Action::RestoreAuditUnixConf {
            path: audit.af_unix_conf().into(),
            content: ctx.audit.default_af_unix.clone(),
        }),
        PlanNode::new(Action::StartAuditd {
            service: AUDIT_SERVICE.to_string(),
        }),
    ];
    for node in &restores {
        uninstall = uninstall.notifies(node.kind());
    }

    let mut nodes = vec![uninstall];
    nodes.extend(
        restores
            .into_iter()
            .map(|n| n.requires(ActionKind::UninstallAgent).refresh_only()),
    );
    nodes
}

// ── Unit tests ────────────────────────────────────────────────────────────────
