//! Executor tests: idempotence, notifications, guards, fail-fast and noop.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use iragent_cli::application::services::apply::{ApplyMode, ApplyReport, Outcome};
use iragent_cli::application::services::reconcile::{ReconcileOptions, reconcile};
use iragent_cli::domain::ActionKind;
use iragent_cli::infra::assets::audit_content;
use iragent_common::{AGENT_SERVICE, AUDIT_SERVICE, AgentLayout, DesiredState, Ensure};

use crate::mocks::{
    INSTALLED_VERSION, INSTALLER_SOURCE, MockHost, RecordingReporter, ServiceEntry, StaticProbe,
    TOKEN,
};

fn present() -> DesiredState {
    DesiredState {
        ensure: Ensure::Present,
        source: Some(INSTALLER_SOURCE.into()),
        token: Some(TOKEN.into()),
        target_version: Some(INSTALLED_VERSION.into()),
        ..DesiredState::default()
    }
}

async fn pass(host: &MockHost, major: u32, raw: &DesiredState, mode: ApplyMode) -> ApplyReport {
    let audit = audit_content().expect("assets");
    let layout = AgentLayout::default();
    let reporter = RecordingReporter::default();
    reconcile(
        host,
        &StaticProbe(major),
        raw,
        ReconcileOptions {
            reporter: &reporter,
            layout: &layout,
            audit: &audit,
            mode,
        },
    )
    .await
    .expect("pass runs")
    .report
}

// ── Install path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fresh_install_stages_and_runs_installer() {
    let host = MockHost::fresh();
    let layout = AgentLayout::default();

    let report = pass(&host, 8, &present(), ApplyMode::Commit).await;

    assert!(report.succeeded());
    assert_eq!(
        host.mutations(),
        vec![
            "mkdir /opt/rapid7".to_string(),
            "write /opt/rapid7/agent_installer_x64.sh".to_string(),
            "exec /opt/rapid7/agent_installer_x64.sh install_start".to_string(),
        ]
    );
    assert_eq!(host.file_mode(layout.installer()), Some(0o700));
    assert_eq!(report.outcome(ActionKind::InstallAgent), Some(Outcome::Changed));
    assert_eq!(
        report.outcome(ActionKind::SetAgentServiceState),
        Some(Outcome::Unchanged)
    );
}

#[tokio::test]
async fn test_second_pass_changes_nothing() {
    let host = MockHost::fresh();
    let mut raw = present();
    raw.https_proxy = Some("proxy.example.com:3128".into());
    raw.auditd_compatibility_mode = true;
    raw.manage_auditd = true;

    let first = pass(&host, 8, &raw, ApplyMode::Commit).await;
    assert!(first.succeeded());
    assert!(first.changed() > 0);

    host.clear_calls();
    let second = pass(&host, 8, &raw, ApplyMode::Commit).await;
    assert!(second.succeeded());
    assert!(host.mutations().is_empty(), "unexpected: {:?}", host.mutations());
    assert_eq!(second.changed(), 0);
    assert_eq!(
        second.outcome(ActionKind::StopAgentService),
        Some(Outcome::GuardSkip)
    );
}

#[tokio::test]
async fn test_version_mismatch_reinstalls() {
    let host = MockHost::with_agent("3.9.0.0");
    let report = pass(&host, 8, &present(), ApplyMode::Commit).await;

    assert!(report.succeeded());
    assert!(
        host.mutations()
            .contains(&"exec /opt/rapid7/agent_installer_x64.sh reinstall_start".to_string())
    );
}

#[tokio::test]
async fn test_matching_version_plans_no_install() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    let report = pass(&host, 8, &present(), ApplyMode::Commit).await;

    assert!(report.succeeded());
    assert_eq!(report.outcome(ActionKind::InstallAgent), None);
    assert!(host.mutations().is_empty(), "unexpected: {:?}", host.mutations());
}

#[tokio::test]
async fn test_proxy_change_restarts_running_agent() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    let mut raw = present();
    raw.https_proxy = Some("10.0.0.1:8080".into());

    let report = pass(&host, 8, &raw, ApplyMode::Commit).await;

    let layout = AgentLayout::default();
    assert_eq!(
        host.file(layout.proxy_config()).as_deref(),
        Some("{\"https\": \"10.0.0.1:8080\"}\n")
    );
    assert_eq!(host.file_mode(layout.proxy_config()), Some(0o700));
    assert_eq!(
        report.outcome(ActionKind::SetAgentServiceState),
        Some(Outcome::Refreshed)
    );
    let record = report
        .records
        .iter()
        .find(|r| r.action == ActionKind::SetAgentServiceState)
        .unwrap();
    assert_eq!(record.notified_by, vec![ActionKind::WriteProxyConfig]);
    assert_eq!(
        host.mutations(),
        vec![
            format!("write {}", layout.proxy_config().display()),
            format!("restart {AGENT_SERVICE}"),
        ]
    );
}

#[tokio::test]
async fn test_notified_running_agent_restarts_even_when_enabled_this_pass() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    host.set_service(AGENT_SERVICE, true, false);
    let mut raw = present();
    raw.https_proxy = Some("10.0.0.1:8080".into());

    let report = pass(&host, 8, &raw, ApplyMode::Commit).await;

    assert!(report.succeeded());
    let layout = AgentLayout::default();
    assert_eq!(
        host.mutations(),
        vec![
            format!("write {}", layout.proxy_config().display()),
            format!("enable {AGENT_SERVICE}"),
            format!("restart {AGENT_SERVICE}"),
        ]
    );
    let record = report
        .records
        .iter()
        .find(|r| r.action == ActionKind::SetAgentServiceState)
        .unwrap();
    assert_eq!(record.outcome, Outcome::Changed);
    assert_eq!(record.detail.as_deref(), Some("enabled, restarted"));
}

#[tokio::test]
async fn test_notified_stopped_agent_is_started_not_restarted() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    host.set_service(AGENT_SERVICE, false, true);
    let mut raw = present();
    raw.https_proxy = Some("10.0.0.1:8080".into());

    pass(&host, 8, &raw, ApplyMode::Commit).await;

    let calls = host.mutations();
    assert!(calls.contains(&format!("start {AGENT_SERVICE}")));
    assert!(!calls.iter().any(|c| c.starts_with("restart")));
}

#[tokio::test]
async fn test_removing_proxy_restarts_agent_once() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    let layout = AgentLayout::default();
    host.put_file(
        layout.proxy_config().to_str().unwrap(),
        b"{\"https\": \"old:1\"}\n",
        0o700,
    );
    host.put_file(
        layout.audit_compat_marker().to_str().unwrap(),
        b"{\"auditd-compatibility-mode\":true}",
        0o644,
    );

    pass(&host, 8, &present(), ApplyMode::Commit).await;

    let restarts = host
        .mutations()
        .iter()
        .filter(|m| m.starts_with("restart"))
        .count();
    assert_eq!(restarts, 1, "two notifications, one restart");
    assert!(host.file(layout.proxy_config()).is_none());
    assert!(host.file(layout.audit_compat_marker()).is_none());
}

// ── Audit daemon ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_compat_mode_hands_audit_over_to_auditd() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    host.put_file("/etc/audisp/audispd.conf", b"q_depth = 250\npriority_boost = 4\n", 0o640);
    let mut raw = present();
    raw.auditd_compatibility_mode = true;
    raw.manage_auditd = true;

    let report = pass(&host, 7, &raw, ApplyMode::Commit).await;

    assert!(report.succeeded());
    let calls = host.mutations();
    let pos = |label: &str| calls.iter().position(|c| c == label).unwrap();
    assert!(pos("stop ir_agent") < pos("start auditd"));
    assert!(pos("start auditd") < pos("start ir_agent"));
    assert!(!calls.iter().any(|c| c.starts_with("restart")));

    assert_eq!(
        host.file("/etc/audisp/audispd.conf").as_deref(),
        Some("q_depth = 8192\npriority_boost = 4\n")
    );
    assert!(host.file("/etc/audit/rules.d/audit.rules").is_some());
    assert!(
        host.file("/etc/audisp/plugins.d/af_unix.conf")
            .unwrap()
            .contains("active = yes")
    );
    assert_eq!(
        host.file(AgentLayout::default().audit_compat_marker()).as_deref(),
        Some("{\"auditd-compatibility-mode\":true}")
    );
    assert!(host.service(AUDIT_SERVICE).enabled);
    assert!(host.service(AGENT_SERVICE).running);
}

#[tokio::test]
async fn test_without_compat_mode_auditd_is_stopped() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    host.packages.borrow_mut().insert("audit".into());
    host.set_service(AUDIT_SERVICE, true, true);
    let mut raw = present();
    raw.manage_auditd = true;

    let report = pass(&host, 8, &raw, ApplyMode::Commit).await;

    assert!(!host.service(AUDIT_SERVICE).running);
    assert_eq!(
        report.outcome(ActionKind::SetAgentServiceState),
        Some(Outcome::Refreshed)
    );
}

#[tokio::test]
async fn test_unmanaged_auditd_is_never_touched() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    host.set_service(AUDIT_SERVICE, true, true);
    let mut raw = present();
    raw.auditd_compatibility_mode = true;

    let report = pass(&host, 8, &raw, ApplyMode::Commit).await;

    assert!(report.records.iter().all(|r| !r.action.is_audit_daemon()));
    assert!(!host.mutations().iter().any(|c| c.ends_with(" auditd")));
    assert!(host.packages.borrow().is_empty());
    assert_eq!(host.service(AUDIT_SERVICE), ServiceEntry { running: true, enabled: true });
}

// ── Uninstall path ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_uninstall_without_installer_skips_restores() {
    let host = MockHost::fresh();
    let raw = DesiredState {
        ensure: Ensure::Absent,
        manage_auditd: true,
        ..DesiredState::default()
    };

    let report = pass(&host, 8, &raw, ApplyMode::Commit).await;

    assert_eq!(report.outcome(ActionKind::UninstallAgent), Some(Outcome::GuardSkip));
    for kind in [
        ActionKind::RestoreAuditRules,
        ActionKind::RestoreAuditUnixConf,
        ActionKind::StartAuditd,
    ] {
        assert_eq!(report.outcome(kind), Some(Outcome::NotTriggered));
    }
    assert!(host.mutations().is_empty());
}

#[tokio::test]
async fn test_uninstall_restores_audit_defaults() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    host.put_file("/etc/audit/plugins.d/af_unix.conf", b"active = yes\n", 0o640);
    let raw = DesiredState {
        ensure: Ensure::Absent,
        manage_auditd: true,
        ..DesiredState::default()
    };

    let report = pass(&host, 9, &raw, ApplyMode::Commit).await;

    assert!(report.succeeded());
    assert_eq!(report.outcome(ActionKind::UninstallAgent), Some(Outcome::Changed));
    assert_eq!(report.outcome(ActionKind::StartAuditd), Some(Outcome::Changed));
    assert!(
        host.file("/etc/audit/plugins.d/af_unix.conf")
            .unwrap()
            .contains("active = no")
    );
    assert!(host.file("/etc/audit/rules.d/audit.rules").is_some());
    assert!(host.service(AUDIT_SERVICE).running);
    assert!(host.file(AgentLayout::default().agent_binary()).is_none());
}

#[tokio::test]
async fn test_second_absent_pass_changes_nothing() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    let layout = AgentLayout::default();
    let raw = DesiredState {
        ensure: Ensure::Absent,
        manage_auditd: true,
        ..DesiredState::default()
    };

    let first = pass(&host, 8, &raw, ApplyMode::Commit).await;
    assert_eq!(first.outcome(ActionKind::UninstallAgent), Some(Outcome::Changed));
    assert!(host.file(layout.installer()).is_none());
    assert!(
        host.mutations()
            .contains(&format!("rm {}", layout.installer().display()))
    );

    host.clear_calls();
    let second = pass(&host, 8, &raw, ApplyMode::Commit).await;

    assert!(second.succeeded());
    assert_eq!(second.outcome(ActionKind::UninstallAgent), Some(Outcome::GuardSkip));
    assert_eq!(second.changed(), 0);
    assert!(host.mutations().is_empty(), "unexpected: {:?}", host.mutations());
}

// ── Failure and noop ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_installer_failure_stops_the_pass() {
    let host = MockHost::fresh();
    host.fail_on("exec /opt/rapid7/agent_installer_x64.sh");
    let mut raw = present();
    raw.https_proxy = Some("proxy:3128".into());

    let report = pass(&host, 8, &raw, ApplyMode::Commit).await;

    let failure = report.failure.clone().expect("failed");
    assert_eq!(failure.action, ActionKind::InstallAgent);
    assert!(!failure.error.contains(TOKEN));
    assert_eq!(report.outcome(ActionKind::WriteProxyConfig), None);
    assert_eq!(report.records.last().unwrap().action, ActionKind::StageInstaller);

    let err = report.into_result().unwrap_err();
    assert_eq!(err.action, ActionKind::InstallAgent);
}

#[tokio::test]
async fn test_noop_reports_without_mutating() {
    let host = MockHost::fresh();
    let mut raw = present();
    raw.manage_auditd = true;
    raw.auditd_compatibility_mode = true;

    let report = pass(&host, 8, &raw, ApplyMode::Noop).await;

    assert!(host.mutations().is_empty());
    assert_eq!(report.mode, ApplyMode::Noop);
    assert_eq!(
        report.outcome(ActionKind::InstallAgent),
        Some(Outcome::WouldChange)
    );
    assert_eq!(
        report.outcome(ActionKind::InstallAuditPackage),
        Some(Outcome::WouldChange)
    );
}

#[tokio::test]
async fn test_missing_installer_source_fails_staging() {
    let host = MockHost::default();
    let report = pass(&host, 8, &present(), ApplyMode::Commit).await;

    let failure = report.failure.clone().expect("failed");
    assert_eq!(failure.action, ActionKind::StageInstaller);
    assert!(failure.error.contains("not found"));
}
