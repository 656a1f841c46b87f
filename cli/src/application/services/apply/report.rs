//! Apply results: per-action outcomes and the pass-level report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::action::ActionKind;

/// Whether a pass mutates the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    /// Perform every needed change.
    #[default]
    Commit,
    /// Evaluate guards and checks only; report what would change.
    Noop,
}

/// What happened to one plan node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The action mutated the host.
    Changed,
    /// The host already matched.
    Unchanged,
    /// A notified service was restarted.
    Refreshed,
    /// The guard evaluated false.
    GuardSkip,
    /// Refresh-only node that received no notification.
    NotTriggered,
    /// Noop mode: the action would have mutated the host.
    WouldChange,
}

impl Outcome {
    /// Whether this outcome delivers notifications to the node's targets.
    #[must_use]
    pub fn notifies(self) -> bool {
        matches!(self, Self::Changed | Self::WouldChange)
    }

    /// Whether the host was (or would be) touched.
    #[must_use]
    pub fn is_change(self) -> bool {
        matches!(self, Self::Changed | Self::Refreshed | Self::WouldChange)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
            Self::Refreshed => "refreshed",
            Self::GuardSkip => "guard_skip",
            Self::NotTriggered => "not_triggered",
            Self::WouldChange => "would_change",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one plan node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub action: ActionKind,
    pub description: String,
    pub outcome: Outcome,
    /// Nodes whose change notified this one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notified_by: Vec<ActionKind>,
    /// Short note on what changed (digests, modes, service transitions).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// The failed node of an aborted pass.
#[derive(Debug, Error)]
#[error("action '{action}' failed")]
pub struct ActionError {
    pub action: ActionKind,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl ActionError {
    #[must_use]
    pub fn new(action: ActionKind, source: anyhow::Error) -> Self {
        Self {
            action,
            source: source.into(),
        }
    }
}

/// Serializable summary of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureSummary {
    pub action: ActionKind,
    pub error: String,
}

/// Outcome of a whole pass.
#[derive(Debug, Serialize)]
pub struct ApplyReport {
    pub mode: ApplyMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub records: Vec<ActionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureSummary>,
    #[serde(skip)]
    error: Option<ActionError>,
}

impl ApplyReport {
    pub(super) fn new(mode: ApplyMode, started_at: DateTime<Utc>) -> Self {
        Self {
            mode,
            started_at,
            finished_at: started_at,
            records: Vec::new(),
            failure: None,
            error: None,
        }
    }

    pub(super) fn fail(&mut self, action: ActionKind, source: anyhow::Error) {
        self.failure = Some(FailureSummary {
            action,
            error: format!("{source:#}"),
        });
        self.error = Some(ActionError::new(action, source));
    }

    /// Outcome recorded for `kind`, if the node was reached.
    #[must_use]
    pub fn outcome(&self, kind: ActionKind) -> Option<Outcome> {
        self.records.iter().find(|r| r.action == kind).map(|r| r.outcome)
    }

    /// Number of nodes that changed (or would change) the host.
    #[must_use]
    pub fn changed(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_change()).count()
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Split off the failure, if any.
    ///
    /// # Errors
    ///
    /// Returns the [`ActionError`] that aborted the pass.
    pub fn into_result(mut self) -> Result<Self, ActionError> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }

    /// Take the failure out while keeping the report for rendering.
    pub fn take_error(&mut self) -> Option<ActionError> {
        self.error.take()
    }
}
