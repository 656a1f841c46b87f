//! Infrastructure implementation of the `PlatformProbe` port.

use std::path::PathBuf;

use iragent_common::PlatformId;

use crate::application::ports::PlatformProbe;
use crate::domain::error::ObservationError;
use crate::domain::platform::parse_os_release;

/// Reads the compile-time OS and `/etc/os-release`.
#[derive(Debug)]
pub struct OsReleaseProbe {
    os_release: PathBuf,
}

impl Default for OsReleaseProbe {
    fn default() -> Self {
        Self {
            os_release: PathBuf::from("/etc/os-release"),
        }
    }
}

impl PlatformProbe for OsReleaseProbe {
    fn identify(&self) -> Result<PlatformId, ObservationError> {
        let kernel = std::env::consts::OS;
        if kernel != "linux" {
            return Err(ObservationError::UnsupportedKernel(kernel.to_string()));
        }
        let content = std::fs::read_to_string(&self.os_release).map_err(|e| {
            ObservationError::UnknownRelease(format!("{}: {e}", self.os_release.display()))
        })?;
        let (os_id, major) = parse_os_release(&content)?;
        Ok(PlatformId {
            kernel: kernel.to_string(),
            os_id,
            major,
        })
    }
}
