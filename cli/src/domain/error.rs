//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

use crate::domain::action::ActionKind;

// ── Validation errors ─────────────────────────────────────────────────────────

/// Desired-state parameters that are missing or contradictory.
///
/// Always fatal: raised before any action runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'{0}' is required when ensure is 'present'")]
    MissingParameter(&'static str),

    #[error("'{0}' must not be blank")]
    Blank(&'static str),

    #[error("'{key}' must not contain whitespace or control characters")]
    IllegalCharacters { key: &'static str },

    #[error("invalid https_proxy '{value}': {reason}")]
    InvalidProxy { value: String, reason: &'static str },

    #[error("installer source '{0}' must be an absolute local path or a file:// URL")]
    UnsupportedSource(String),
}

// ── Observation errors ────────────────────────────────────────────────────────

/// Host facts that could not be observed and have no safe default.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObservationError {
    #[error("unsupported kernel '{0}': only Linux hosts are managed")]
    UnsupportedKernel(String),

    #[error("unsupported distribution '{0}': only RHEL and its rebuilds are managed")]
    UnsupportedDistribution(String),

    #[error("unsupported OS release {os_id} {major}: supported major releases are 6, 7, 8 and 9")]
    UnsupportedRelease { os_id: String, major: u32 },

    #[error("cannot determine OS release: {0}")]
    UnknownRelease(String),
}

// ── Plan errors ───────────────────────────────────────────────────────────────

/// Structural defects in a plan graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("action '{0}' declared twice")]
    DuplicateAction(ActionKind),

    #[error("action '{from}' references '{to}', which is not part of the plan")]
    UnknownEdge { from: ActionKind, to: ActionKind },

    #[error("dependency cycle through '{0}'")]
    Cycle(ActionKind),
}
