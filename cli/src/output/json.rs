//! JSON output: the error-object formatter and the `--json` renderer.
//!
//! Everything goes to stdout as one pretty-printed document; logs stay on
//! stderr.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::services::apply::{ActionError, ApplyReport};
use crate::application::services::facts::Observed;
use crate::domain::Plan;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Error object for a failed command in `--json` mode.
///
/// `None` for an action failure: the apply report already went to stdout with
/// its `failure` field set, and stdout carries exactly one document.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn error_document(error: &anyhow::Error, code: &str) -> Result<Option<String>> {
    if error.downcast_ref::<ActionError>().is_some() {
        return Ok(None);
    }
    format_error(&format!("{error:#}"), code).map(Some)
}

/// Machine-readable renderer.
pub struct JsonRenderer;

fn print(value: &impl Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    println!("{out}");
    Ok(())
}

#[derive(Serialize)]
struct FactsDoc<'a> {
    platform: &'a iragent_common::PlatformId,
    facts: &'a iragent_common::HostFacts,
    record: iragent_common::FactsRecord,
}

#[derive(Serialize)]
struct PlanDoc<'a> {
    #[serde(flatten)]
    observed: FactsDoc<'a>,
    actions: &'a Plan,
}

fn facts_doc(observed: &Observed) -> FactsDoc<'_> {
    FactsDoc {
        platform: &observed.platform.id,
        facts: &observed.facts,
        record: observed.facts.record(),
    }
}

impl JsonRenderer {
    /// The document doubles as a `--facts` snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_facts(&self, observed: &Observed) -> Result<()> {
        print(&facts_doc(observed))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_plan(&self, observed: &Observed, plan: &Plan) -> Result<()> {
        print(&PlanDoc {
            observed: facts_doc(observed),
            actions: plan,
        })
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_report(&self, report: &ApplyReport) -> Result<()> {
        print(report)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        print(&serde_json::json!({ "version": version }))
    }
}
