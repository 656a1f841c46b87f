//! Facts snapshot files for offline planning.

use std::path::Path;

use anyhow::{Context, Result};
use iragent_common::Observation;

/// Load an [`Observation`] written by `iragent --json facts`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid snapshot.
pub fn load_snapshot(path: &Path) -> Result<Observation> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read facts snapshot {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("cannot parse facts snapshot {}", path.display()))
}
