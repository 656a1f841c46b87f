//! `PackageManager` for `LinuxHost`: `rpm` queries, `yum`/`dnf` installs.

use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{CommandRunner, PackageManager};
use crate::infra::host::{LinuxHost, check};

const RPM: &str = "/bin/rpm";

/// Package installs may download from remote repositories.
const INSTALL_TIMEOUT: Duration = Duration::from_secs(600);

impl PackageManager for LinuxHost {
    async fn is_installed(&self, package: &str) -> Result<bool> {
        let out = self.runner.run(RPM, &["-q", package]).await?;
        Ok(out.status.success())
    }

    async fn install(&self, package: &str) -> Result<()> {
        let tool = self.package_tool.program();
        tracing::info!(package, tool, "installing package");
        let out = self
            .runner
            .run_with_timeout(tool, &["-y", "install", package], INSTALL_TIMEOUT)
            .await?;
        check(&out, &format!("{tool} install {package}"))
    }
}
