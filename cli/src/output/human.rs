//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::application::services::apply::{ApplyMode, ApplyReport, Outcome};
use crate::application::services::facts::Observed;
use crate::domain::action::{Guard, PlanNode, Trigger};
use crate::domain::Plan;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("iragent {version}");
    }

    pub fn render_facts(&self, observed: &Observed) {
        let facts = &observed.facts;
        let id = &observed.platform.id;
        self.ctx.kv("Platform:", &format!("{} {} ({})", id.os_id, id.major, id.kernel));
        self.ctx.kv("Agent:", if facts.agent_present { "installed" } else { "not installed" });
        if facts.agent_present {
            let version = facts.agent_version.as_deref().unwrap_or("unknown");
            let build = facts
                .build_version
                .as_deref()
                .map_or_else(String::new, |b| format!(" (build {b})"));
            self.ctx.kv("Version:", &format!("{version}{build}"));
        }
        self.ctx.kv("Audit compat:", &compat_display(facts));
    }

    pub fn render_plan(&self, plan: &Plan) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.header(&format!("Plan ({} actions)", plan.len()));
        println!();
        for (i, node) in plan.ordered().enumerate() {
            println!(
                "  {:>2}. {:<26} {}",
                i + 1,
                node.kind().style(self.ctx.styles.bold),
                node.action.describe()
            );
            for line in node_annotations(node) {
                println!("      {}", line.style(self.ctx.styles.dim));
            }
        }
    }

    pub fn render_report(&self, report: &ApplyReport) {
        if self.ctx.quiet {
            return;
        }
        println!();
        let changed = report.changed();
        let total = report.records.len();
        let summary = match report.mode {
            ApplyMode::Commit => format!("{changed} of {total} actions changed the host"),
            ApplyMode::Noop => format!("noop: {changed} of {total} actions would change the host"),
        };
        match &report.failure {
            Some(f) => self.ctx.error(&format!("{summary}; '{}' failed", f.action)),
            None if changed == 0 => self.ctx.success("host already in desired state"),
            None => self.ctx.success(&summary),
        }
        for record in report
            .records
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::GuardSkip | Outcome::Refreshed))
        {
            let detail = record.detail.as_deref().unwrap_or("");
            println!(
                "  {:<26} {} {detail}",
                record.action,
                record.outcome.style(self.ctx.styles.outcome(record.outcome))
            );
        }
    }
}

fn compat_display(facts: &iragent_common::HostFacts) -> String {
    match (facts.audit_compat_file_present, facts.audit_compat_enabled) {
        (false, _) => "marker absent".to_string(),
        (true, true) => "enabled".to_string(),
        (true, false) => "disabled".to_string(),
    }
}

/// Edge, guard and trigger notes shown under a plan line.
#[must_use]
pub fn node_annotations(node: &PlanNode) -> Vec<String> {
    let mut lines = Vec::new();
    if !node.requires.is_empty() {
        let list: Vec<&str> = node.requires.iter().map(|k| k.as_str()).collect();
        lines.push(format!("requires {}", list.join(", ")));
    }
    if !node.notify.is_empty() {
        let list: Vec<&str> = node.notify.iter().map(|k| k.as_str()).collect();
        lines.push(format!("notifies {}", list.join(", ")));
    }
    match &node.guard {
        Some(Guard::Creates(p)) => lines.push(format!("creates {}", p.display())),
        Some(Guard::Unless(p)) => lines.push(format!("unless {} exists", p.display())),
        Some(Guard::OnlyIf(p)) => lines.push(format!("only if {} is executable", p.display())),
        None => {}
    }
    if node.trigger == Trigger::RefreshOnly {
        lines.push("refresh only".to_string());
    }
    lines
}
