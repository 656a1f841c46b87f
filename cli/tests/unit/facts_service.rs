//! Fact collection: degraded observations fall back to defaults.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use iragent_cli::application::services::facts::{collect_facts, observe};
use iragent_cli::domain::ObservationError;
use iragent_common::AgentLayout;

use crate::mocks::{INSTALLED_VERSION, MockHost, StaticProbe};

#[tokio::test]
async fn test_absent_binary_yields_absent_facts() {
    let host = MockHost::fresh();
    let facts = collect_facts(&host, &AgentLayout::default()).await;

    assert!(!facts.agent_present);
    assert_eq!(facts.agent_version, None);
    assert!(!facts.audit_compat_file_present);
    assert!(!facts.audit_compat_enabled);
}

#[tokio::test]
async fn test_installed_agent_reports_semantic_version() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    let facts = collect_facts(&host, &AgentLayout::default()).await;

    assert!(facts.agent_present);
    assert_eq!(facts.agent_version.as_deref(), Some(INSTALLED_VERSION));
    assert_eq!(facts.build_version.as_deref(), Some("4.0.0.1.10"));
}

#[tokio::test]
async fn test_unparseable_version_output_is_unknown_version() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    *host.version_output.borrow_mut() = Some(b"segmentation fault".to_vec());

    let facts = collect_facts(&host, &AgentLayout::default()).await;

    assert!(facts.agent_present);
    assert_eq!(facts.agent_version, None);
}

#[tokio::test]
async fn test_version_output_with_log_noise_still_parses() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    *host.version_output.borrow_mut() =
        Some(b"INFO starting\n{\"semantic_version\":\"3.2.1.0\"}\n".to_vec());

    let facts = collect_facts(&host, &AgentLayout::default()).await;

    assert_eq!(facts.agent_version.as_deref(), Some("3.2.1.0"));
    assert_eq!(facts.build_version, None);
}

#[tokio::test]
async fn test_invalid_marker_counts_as_present_but_disabled() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    let marker = AgentLayout::default().audit_compat_marker();
    host.put_file(marker.to_str().unwrap(), b"not json", 0o644);

    let facts = collect_facts(&host, &AgentLayout::default()).await;

    assert!(facts.audit_compat_file_present);
    assert!(!facts.audit_compat_enabled);
}

#[tokio::test]
async fn test_enabled_marker_is_read() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    let marker = AgentLayout::default().audit_compat_marker();
    host.put_file(
        marker.to_str().unwrap(),
        br#"{"auditd-compatibility-mode":true}"#,
        0o644,
    );

    let facts = collect_facts(&host, &AgentLayout::default()).await;

    assert!(facts.audit_compat_enabled);
}

#[tokio::test]
async fn test_unsupported_release_fails_observation() {
    let host = MockHost::fresh();
    let err = observe(&host, &StaticProbe(5), &AgentLayout::default())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ObservationError::UnsupportedRelease {
            os_id: "rhel".into(),
            major: 5
        }
    );
}

#[tokio::test]
async fn test_observation_snapshot_resolves_back() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    let observed = observe(&host, &StaticProbe(7), &AgentLayout::default())
        .await
        .expect("supported");

    let snapshot = observed.snapshot();
    assert_eq!(snapshot.platform.major, 7);

    let resolved =
        iragent_cli::application::services::facts::Observed::from_snapshot(&snapshot).unwrap();
    assert_eq!(resolved.platform, observed.platform);
    assert_eq!(resolved.facts, observed.facts);
}

#[tokio::test]
async fn test_observation_does_not_mutate() {
    let host = MockHost::with_agent(INSTALLED_VERSION);
    observe(&host, &StaticProbe(8), &AgentLayout::default())
        .await
        .expect("supported");
    assert!(host.mutations().is_empty());
}
