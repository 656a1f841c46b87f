//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `iragent_common` — never
//! from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use iragent_common::{DesiredState, PlatformId};

use crate::domain::ObservationError;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Abstracts the host filesystem. Missing files are not errors.
pub trait HostFs {
    /// Whether `path` exists (file, directory or symlink target).
    fn exists(&self, path: &Path) -> bool;
    /// Whether `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;
    /// Whether `path` is a regular file with any execute bit set.
    fn is_executable(&self, path: &Path) -> bool;
    /// Read a file; `Ok(None)` when it does not exist.
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>>;
    /// Permission bits of `path`; `Ok(None)` when it does not exist.
    fn mode(&self, path: &Path) -> Result<Option<u32>>;
    /// Replace `path` atomically with `content`, optionally setting its mode.
    fn write_atomic(&self, path: &Path, content: &[u8], mode: Option<u32>) -> Result<()>;
    /// Change permission bits.
    fn set_mode(&self, path: &Path, mode: u32) -> Result<()>;
    /// Remove a file. Removing a missing file is an error.
    fn remove_file(&self, path: &Path) -> Result<()>;
    /// Create a directory and its parents.
    fn create_dir_all(&self, path: &Path) -> Result<()>;
}

// ── Service and Package Ports ─────────────────────────────────────────────────

/// Init-system service control.
#[allow(async_fn_in_trait)]
pub trait ServiceManager {
    async fn is_running(&self, service: &str) -> Result<bool>;
    async fn is_enabled(&self, service: &str) -> Result<bool>;
    async fn start(&self, service: &str) -> Result<()>;
    async fn stop(&self, service: &str) -> Result<()>;
    async fn restart(&self, service: &str) -> Result<()>;
    async fn enable(&self, service: &str) -> Result<()>;
}

/// OS package queries and installation.
#[allow(async_fn_in_trait)]
pub trait PackageManager {
    async fn is_installed(&self, package: &str) -> Result<bool>;
    async fn install(&self, package: &str) -> Result<()>;
}

/// Composite trait — everything the executor mutates on a host.
pub trait Host: CommandRunner + HostFs + ServiceManager + PackageManager {}

/// Blanket implementation: any type implementing all four sub-traits is a `Host`.
impl<T> Host for T where T: CommandRunner + HostFs + ServiceManager + PackageManager {}

// ── Platform Port ─────────────────────────────────────────────────────────────

/// Identifies the running OS.
pub trait PlatformProbe {
    /// Read kernel name and OS release.
    ///
    /// # Errors
    ///
    /// Returns an error when the release cannot be determined.
    fn identify(&self) -> Result<PlatformId, ObservationError>;
}

// ── Desired State Port ────────────────────────────────────────────────────────

/// Loads the declared desired-state document.
pub trait DesiredStateStore {
    /// Load the document. A missing file yields the defaults.
    fn load(&self) -> Result<DesiredState>;
    /// Location the document is read from.
    fn path(&self) -> PathBuf;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
