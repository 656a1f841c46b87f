//! Application service — plan executor.
//!
//! Walks a [`Plan`] in its resolved order, strictly one action at a time.
//! Guards and triggers are evaluated at apply time, notifications flow
//! along `notify` edges, and the first failure aborts the pass.

mod perform;
mod report;

use std::collections::{HashMap, HashSet};

use anyhow::anyhow;
use chrono::Utc;
use tracing::{debug, error, info};

use crate::application::ports::{Host, ProgressReporter};
use crate::domain::action::{Action, ActionKind, Guard, Plan, PlanNode, ServiceState, Trigger};

pub use perform::INSTALLER_TIMEOUT;
pub use report::{ActionError, ActionRecord, ApplyMode, ApplyReport, FailureSummary, Outcome};

use perform::{Effect, perform};

/// Apply `plan` to `host`.
///
/// Never returns early with an error: a failing action is recorded in the
/// report (see [`ApplyReport::take_error`]) and no later action runs.
pub async fn apply_plan(
    host: &impl Host,
    plan: &Plan,
    mode: ApplyMode,
    reporter: &impl ProgressReporter,
) -> ApplyReport {
    let mut report = ApplyReport::new(mode, Utc::now());
    let mut inbox: HashMap<ActionKind, Vec<ActionKind>> = HashMap::new();
    let mut done: HashSet<ActionKind> = HashSet::new();

    for node in plan.ordered() {
        let kind = node.kind();
        if let Some(missing) = node.requires.iter().find(|k| !done.contains(k)) {
            let e = anyhow!("predecessor '{missing}' did not complete");
            error!(action = %kind, error = %e, "action failed");
            report.fail(kind, e);
            break;
        }

        let notified_by = inbox.remove(&kind).unwrap_or_default();
        let effect = match apply_node(host, node, &notified_by, mode).await {
            Ok(effect) => effect,
            Err(e) => {
                error!(action = %kind, error = %format!("{e:#}"), "action failed");
                reporter.warn(&format!("{}: {e:#}", node.action.describe()));
                report.fail(kind, e);
                break;
            }
        };

        log_effect(kind, &effect);
        if effect.outcome.is_change() {
            let detail = effect.detail.as_deref().unwrap_or(effect.outcome.as_str());
            reporter.success(&format!("{} ({detail})", node.action.describe()));
        }
        if effect.outcome.notifies() {
            for target in &node.notify {
                debug!(from = %kind, to = %target, "notification queued");
                inbox.entry(*target).or_default().push(kind);
            }
        }

        done.insert(kind);
        report.records.push(ActionRecord {
            action: kind,
            description: node.action.describe(),
            outcome: effect.outcome,
            notified_by,
            detail: effect.detail,
        });
    }

    report.finished_at = Utc::now();
    info!(
        mode = ?report.mode,
        actions = report.records.len(),
        changed = report.changed(),
        failed = !report.succeeded(),
        "pass finished"
    );
    report
}

async fn apply_node(
    host: &impl Host,
    node: &PlanNode,
    notified_by: &[ActionKind],
    mode: ApplyMode,
) -> anyhow::Result<Effect> {
    if node.trigger == Trigger::RefreshOnly && notified_by.is_empty() {
        return Ok(Effect {
            outcome: Outcome::NotTriggered,
            detail: None,
        });
    }

    if let Some(guard) = &node.guard {
        if !guard_allows(host, guard) {
            return Ok(Effect {
                outcome: Outcome::GuardSkip,
                detail: Some(guard_note(guard)),
            });
        }
    }

    let refresh = match &node.action {
        Action::SetAgentServiceState {
            service,
            state: ServiceState::Running,
        }
        | Action::SetAuditdServiceState {
            service,
            state: ServiceState::Running,
        } if !notified_by.is_empty() => Some(service),
        _ => None,
    };
    // A service started by this action is not restarted on top.
    let was_running = match refresh {
        Some(service) => host.is_running(service).await?,
        None => false,
    };

    let effect = perform(host, &node.action, mode).await?;
    let Some(service) = refresh.filter(|_| was_running) else {
        return Ok(effect);
    };
    debug!(action = %node.kind(), %service, "refreshing notified service");
    let restart = Action::RestartService {
        service: service.clone(),
    };
    let restarted = perform(host, &restart, mode).await?;
    let detail = match (effect.detail, restarted.detail) {
        (Some(own), Some(restart)) => Some(format!("{own}, {restart}")),
        (own, restart) => restart.or(own),
    };
    // An own change keeps its outcome so notifications still flow from it.
    let outcome = match effect.outcome {
        Outcome::Unchanged => Outcome::Refreshed,
        own => own,
    };
    Ok(Effect { outcome, detail })
}

fn guard_allows(host: &impl Host, guard: &Guard) -> bool {
    match guard {
        Guard::Creates(path) | Guard::Unless(path) => !host.exists(path),
        Guard::OnlyIf(path) => host.is_executable(path),
    }
}

fn guard_note(guard: &Guard) -> String {
    match guard {
        Guard::Creates(path) | Guard::Unless(path) => format!("{} exists", path.display()),
        Guard::OnlyIf(path) => format!("{} is not executable", path.display()),
    }
}

fn log_effect(kind: ActionKind, effect: &Effect) {
    let detail = effect.detail.as_deref().unwrap_or("");
    match effect.outcome {
        Outcome::Changed | Outcome::Refreshed | Outcome::WouldChange => {
            info!(action = %kind, outcome = %effect.outcome, detail, "action applied");
        }
        Outcome::GuardSkip => {
            debug!(action = %kind, outcome = %effect.outcome, detail, "guard skipped action");
        }
        Outcome::Unchanged | Outcome::NotTriggered => {
            debug!(action = %kind, outcome = %effect.outcome, "action skipped");
        }
    }
}
