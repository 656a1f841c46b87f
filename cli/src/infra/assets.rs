//! Embedded audit assets compiled into the binary from `cli/assets/`:
//!   - `audit.rules`           — rules installed when auditd runs beside the agent
//!   - `af_unix.conf`          — dispatcher plugin feeding events to the agent
//!   - `audit.rules.default`   — distribution default restored on uninstall
//!   - `af_unix.default.conf`  — disabled plugin restored on uninstall

use anyhow::{Context, Result};
use include_dir::{Dir, include_dir};

use crate::domain::AuditContent;

static EMBEDDED_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets");

/// Return a single embedded asset as UTF-8 text.
///
/// # Errors
///
/// Returns an error if no asset with the given `name` exists or it is not UTF-8.
pub fn get_asset(name: &str) -> Result<&'static str> {
    EMBEDDED_ASSETS
        .get_file(name)
        .ok_or_else(|| anyhow::anyhow!("embedded asset not found: {name}"))?
        .contents_utf8()
        .with_context(|| format!("embedded asset {name} is not UTF-8"))
}

/// Load every audit asset the decision engine needs.
///
/// # Errors
///
/// Returns an error if any asset is missing.
pub fn audit_content() -> Result<AuditContent> {
    Ok(AuditContent {
        rules: get_asset("audit.rules")?.to_string(),
        af_unix: get_asset("af_unix.conf")?.to_string(),
        default_rules: get_asset("audit.rules.default")?.to_string(),
        default_af_unix: get_asset("af_unix.default.conf")?.to_string(),
    })
}
