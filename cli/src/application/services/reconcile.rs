//! Application service — one reconciliation pass.
//!
//! validate → observe → plan → apply. Validation and observation errors
//! surface before any action runs.

use anyhow::Result;
use iragent_common::{AgentLayout, DesiredState};
use tracing::warn;

use crate::application::ports::{Host, PlatformProbe, ProgressReporter};
use crate::application::services::apply::{ApplyMode, ApplyReport, apply_plan};
use crate::application::services::facts::{Observed, observe};
use crate::domain::desired::{Desired, validate};
use crate::domain::engine::{AuditContent, PlanContext, plan};
use crate::domain::Plan;

/// Inputs shared by `plan` and `apply`.
pub struct ReconcileOptions<'a, R: ProgressReporter> {
    pub reporter: &'a R,
    pub layout: &'a AgentLayout,
    pub audit: &'a AuditContent,
    pub mode: ApplyMode,
}

/// Everything one pass produced.
#[derive(Debug)]
pub struct ReconcileOutcome {
    pub observed: Observed,
    pub plan: Plan,
    pub report: ApplyReport,
}

/// Compute the plan for already-validated input.
///
/// # Errors
///
/// Returns an error if the engine produced a malformed graph.
pub fn build_plan(
    desired: &Desired,
    observed: &Observed,
    layout: &AgentLayout,
    audit: &AuditContent,
) -> Result<Plan> {
    if let Desired::Present(present) = desired {
        if present.target_version.is_none() && observed.facts.agent_present {
            warn!("no target_version declared: the installed agent is reinstalled on every pass");
        }
    }
    let ctx = PlanContext {
        layout: layout.clone(),
        platform: observed.platform.clone(),
        audit: audit.clone(),
    };
    Ok(plan(&observed.facts, desired, &ctx)?)
}

/// Run one full pass against `host`.
///
/// An action failure does not make this return `Err`; it is carried in the
/// returned report so the caller can render what ran before it.
///
/// # Errors
///
/// Returns an error on invalid desired state, an unsupported platform, or a
/// malformed plan. Nothing on the host has been changed in those cases.
pub async fn reconcile(
    host: &impl Host,
    probe: &impl PlatformProbe,
    raw: &DesiredState,
    opts: ReconcileOptions<'_, impl ProgressReporter>,
) -> Result<ReconcileOutcome> {
    let ReconcileOptions {
        reporter,
        layout,
        audit,
        mode,
    } = opts;

    let desired = validate(raw)?;

    reporter.step("collecting host facts");
    let observed = observe(host, probe, layout).await?;

    let plan = build_plan(&desired, &observed, layout, audit)?;
    reporter.step(&format!("applying {} actions", plan.len()));
    let report = apply_plan(host, &plan, mode, reporter).await;

    Ok(ReconcileOutcome {
        observed,
        plan,
        report,
    })
}
