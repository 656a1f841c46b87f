//! Infrastructure implementation of the `DesiredStateStore` port.

use std::path::PathBuf;

use anyhow::{Context, Result};
use iragent_common::DesiredState;

use crate::application::ports::DesiredStateStore;

/// Default location of the desired-state document.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/iragent/desired.yaml";

/// Environment variable overriding the document location.
pub const CONFIG_ENV: &str = "IRAGENT_CONFIG";

/// YAML document on disk.
///
/// Path precedence: explicit `--config`, then `IRAGENT_CONFIG`, then
/// [`DEFAULT_CONFIG_PATH`].
#[derive(Debug, Default)]
pub struct YamlDesiredStateStore {
    explicit: Option<PathBuf>,
}

impl YamlDesiredStateStore {
    #[must_use]
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self { explicit }
    }
}

impl DesiredStateStore for YamlDesiredStateStore {
    fn load(&self) -> Result<DesiredState> {
        let path = self.path();
        if !path.exists() {
            // An explicitly named file must exist.
            if self.explicit.is_some() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(DesiredState::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(DesiredState::default());
        }
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    fn path(&self) -> PathBuf {
        if let Some(path) = &self.explicit {
            return path.clone();
        }
        if let Ok(val) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(val);
        }
        PathBuf::from(DEFAULT_CONFIG_PATH)
    }
}
