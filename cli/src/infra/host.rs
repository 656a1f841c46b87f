//! `LinuxHost` — the production `Host`: processes, files, services, packages.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::application::ports::{CommandRunner, HostFs, PlatformProbe};
use crate::domain::platform::{self, InitSystem, PackageTool};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::LocalHostFs;

/// Production host adapter for RHEL-family systems.
pub struct LinuxHost {
    pub(super) runner: TokioCommandRunner,
    fs: LocalHostFs,
    pub(super) init: InitSystem,
    pub(super) package_tool: PackageTool,
}

impl LinuxHost {
    #[must_use]
    pub fn new(init: InitSystem, package_tool: PackageTool) -> Self {
        Self {
            runner: TokioCommandRunner::default(),
            fs: LocalHostFs,
            init,
            package_tool,
        }
    }

    /// Pick service and package tooling for the running OS.
    ///
    /// Falls back to systemd + yum when the platform is unsupported; fact
    /// collection rejects such hosts before anything is changed.
    #[must_use]
    pub fn detect(probe: &impl PlatformProbe) -> Self {
        match probe.identify().and_then(|id| platform::resolve(&id)) {
            Ok(p) => Self::new(p.init, p.package_tool),
            Err(e) => {
                tracing::debug!(error = %e, "platform not resolved; using default tooling");
                Self::new(InitSystem::Systemd, PackageTool::Yum)
            }
        }
    }
}

/// Fail with the program's stderr unless it exited zero.
pub(super) fn check(output: &Output, what: &str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    bail!("{what} failed ({}): {}", output.status, stderr.trim())
}

impl CommandRunner for LinuxHost {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.runner.run(program, args).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        self.runner.run_with_timeout(program, args, timeout).await
    }
}

impl HostFs for LinuxHost {
    fn exists(&self, path: &Path) -> bool {
        self.fs.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.fs.is_dir(path)
    }

    fn is_executable(&self, path: &Path) -> bool {
        self.fs.is_executable(path)
    }

    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        self.fs.read(path)
    }

    fn mode(&self, path: &Path) -> Result<Option<u32>> {
        self.fs.mode(path)
    }

    fn write_atomic(&self, path: &Path, content: &[u8], mode: Option<u32>) -> Result<()> {
        self.fs.write_atomic(path, content, mode)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        self.fs.set_mode(path, mode)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.fs.remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.fs.create_dir_all(path)
    }
}
