//! Shared mock infrastructure for unit tests.
//!
//! `MockHost` is an in-memory host: files, directories, services and
//! packages live in maps, and every mutation is appended to a call log so
//! tests can assert exactly what a pass changed.

#![allow(clippy::expect_used, dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::{Result, bail};
use iragent_cli::application::ports::{
    CommandRunner, HostFs, PackageManager, PlatformProbe, ProgressReporter, ServiceManager,
};
use iragent_cli::domain::ObservationError;
use iragent_common::{AGENT_SERVICE, AgentLayout, PlatformId};

// ── Output helpers ────────────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(stderr: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(1 << 8),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Mock host ─────────────────────────────────────────────────────────────────

pub const INSTALLER_SOURCE: &str = "/srv/agent_installer.sh";
pub const TOKEN: &str = "us:01234567-89ab-cdef-0123-4567890abcde";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub content: Vec<u8>,
    pub mode: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceEntry {
    pub running: bool,
    pub enabled: bool,
}

#[derive(Default)]
pub struct MockHost {
    pub files: RefCell<BTreeMap<PathBuf, FileEntry>>,
    pub dirs: RefCell<BTreeSet<PathBuf>>,
    pub services: RefCell<BTreeMap<String, ServiceEntry>>,
    pub packages: RefCell<BTreeSet<String>>,
    pub calls: RefCell<Vec<String>>,
    /// stdout of `ir_agent --version`; `None` makes the query fail.
    pub version_output: RefCell<Option<Vec<u8>>>,
    fail_on: RefCell<Option<String>>,
}

impl MockHost {
    /// A host with only the installer payload present.
    pub fn fresh() -> Self {
        let host = Self::default();
        host.put_file(INSTALLER_SOURCE, b"#!/bin/sh\n# installer\n", 0o644);
        host
    }

    /// A host with the agent installed at `version` and running.
    pub fn with_agent(version: &str) -> Self {
        let host = Self::fresh();
        let layout = AgentLayout::default();
        host.dirs.borrow_mut().insert(layout.home.clone());
        host.put_file(
            layout.installer().to_str().expect("utf-8"),
            b"#!/bin/sh\n# installer\n",
            0o700,
        );
        host.install_agent_files(version);
        host
    }

    pub fn put_file(&self, path: &str, content: &[u8], mode: u32) {
        self.files.borrow_mut().insert(
            PathBuf::from(path),
            FileEntry {
                content: content.to_vec(),
                mode,
            },
        );
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files
            .borrow()
            .get(path.as_ref())
            .map(|f| String::from_utf8_lossy(&f.content).into_owned())
    }

    pub fn file_mode(&self, path: impl AsRef<Path>) -> Option<u32> {
        self.files.borrow().get(path.as_ref()).map(|f| f.mode)
    }

    pub fn set_service(&self, name: &str, running: bool, enabled: bool) {
        self.services
            .borrow_mut()
            .insert(name.to_string(), ServiceEntry { running, enabled });
    }

    pub fn service(&self, name: &str) -> ServiceEntry {
        self.services.borrow().get(name).copied().unwrap_or_default()
    }

    /// Make any call whose log label starts with `prefix` fail.
    pub fn fail_on(&self, prefix: &str) {
        *self.fail_on.borrow_mut() = Some(prefix.to_string());
    }

    /// Mutations recorded so far.
    pub fn mutations(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, label: String) -> Result<()> {
        let fail = self
            .fail_on
            .borrow()
            .as_deref()
            .is_some_and(|p| label.starts_with(p));
        self.calls.borrow_mut().push(label.clone());
        if fail {
            bail!("injected failure: {label}");
        }
        Ok(())
    }

    fn install_agent_files(&self, version: &str) {
        let layout = AgentLayout::default();
        self.dirs.borrow_mut().insert(layout.agent_dir());
        self.put_file(
            layout.agent_binary().to_str().expect("utf-8"),
            b"\x7fELF",
            0o755,
        );
        *self.version_output.borrow_mut() = Some(
            format!(r#"{{"build_version":"{version}.10","semantic_version":"{version}"}}"#)
                .into_bytes(),
        );
        self.set_service(AGENT_SERVICE, true, true);
    }

    fn uninstall_agent_files(&self) {
        let layout = AgentLayout::default();
        let agent_dir = layout.agent_dir();
        self.files
            .borrow_mut()
            .retain(|path, _| !path.starts_with(&agent_dir));
        self.dirs.borrow_mut().remove(&agent_dir);
        self.services.borrow_mut().remove(AGENT_SERVICE);
        *self.version_output.borrow_mut() = None;
    }
}

/// Version the mock installer "installs".
pub const INSTALLED_VERSION: &str = "4.0.0.1";

impl CommandRunner for MockHost {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, Duration::from_secs(1)).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        if args == ["--version"] {
            return Ok(match self.version_output.borrow().as_deref() {
                Some(out) => ok_output(out),
                None => err_output(b"no such file"),
            });
        }
        let verb = args.first().copied().unwrap_or_default();
        self.record(format!("exec {program} {verb}"))?;
        match verb {
            "install_start" | "reinstall_start" => self.install_agent_files(INSTALLED_VERSION),
            "uninstall" => self.uninstall_agent_files(),
            _ => {}
        }
        Ok(ok_output(b""))
    }
}

impl HostFs for MockHost {
    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path) || self.dirs.borrow().contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.borrow().contains(path)
    }

    fn is_executable(&self, path: &Path) -> bool {
        self.files
            .borrow()
            .get(path)
            .is_some_and(|f| f.mode & 0o111 != 0)
    }

    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        Ok(self.files.borrow().get(path).map(|f| f.content.clone()))
    }

    fn mode(&self, path: &Path) -> Result<Option<u32>> {
        Ok(self.files.borrow().get(path).map(|f| f.mode))
    }

    fn write_atomic(&self, path: &Path, content: &[u8], mode: Option<u32>) -> Result<()> {
        self.record(format!("write {}", path.display()))?;
        let mode = mode
            .or_else(|| self.files.borrow().get(path).map(|f| f.mode))
            .unwrap_or(0o644);
        self.files.borrow_mut().insert(
            path.to_path_buf(),
            FileEntry {
                content: content.to_vec(),
                mode,
            },
        );
        Ok(())
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        self.record(format!("chmod {mode:o} {}", path.display()))?;
        match self.files.borrow_mut().get_mut(path) {
            Some(f) => {
                f.mode = mode;
                Ok(())
            }
            None => bail!("{} not found", path.display()),
        }
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.record(format!("rm {}", path.display()))?;
        match self.files.borrow_mut().remove(path) {
            Some(_) => Ok(()),
            None => bail!("{} not found", path.display()),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.record(format!("mkdir {}", path.display()))?;
        self.dirs.borrow_mut().insert(path.to_path_buf());
        Ok(())
    }
}

impl ServiceManager for MockHost {
    async fn is_running(&self, service: &str) -> Result<bool> {
        Ok(self.service(service).running)
    }

    async fn is_enabled(&self, service: &str) -> Result<bool> {
        Ok(self.service(service).enabled)
    }

    async fn start(&self, service: &str) -> Result<()> {
        self.record(format!("start {service}"))?;
        self.services.borrow_mut().entry(service.to_string()).or_default().running = true;
        Ok(())
    }

    async fn stop(&self, service: &str) -> Result<()> {
        self.record(format!("stop {service}"))?;
        self.services.borrow_mut().entry(service.to_string()).or_default().running = false;
        Ok(())
    }

    async fn restart(&self, service: &str) -> Result<()> {
        self.record(format!("restart {service}"))?;
        self.services.borrow_mut().entry(service.to_string()).or_default().running = true;
        Ok(())
    }

    async fn enable(&self, service: &str) -> Result<()> {
        self.record(format!("enable {service}"))?;
        self.services.borrow_mut().entry(service.to_string()).or_default().enabled = true;
        Ok(())
    }
}

impl PackageManager for MockHost {
    async fn is_installed(&self, package: &str) -> Result<bool> {
        Ok(self.packages.borrow().contains(package))
    }

    async fn install(&self, package: &str) -> Result<()> {
        self.record(format!("install-package {package}"))?;
        self.packages.borrow_mut().insert(package.to_string());
        Ok(())
    }
}

// ── Platform probe ────────────────────────────────────────────────────────────

pub struct StaticProbe(pub u32);

impl PlatformProbe for StaticProbe {
    fn identify(&self) -> Result<PlatformId, ObservationError> {
        Ok(PlatformId {
            kernel: "linux".into(),
            os_id: "rhel".into(),
            major: self.0,
        })
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

/// Collects reporter messages.
#[derive(Default)]
pub struct RecordingReporter {
    pub messages: RefCell<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.messages.borrow_mut().push(format!("step: {message}"));
    }
    fn success(&self, message: &str) {
        self.messages.borrow_mut().push(format!("ok: {message}"));
    }
    fn warn(&self, message: &str) {
        self.messages.borrow_mut().push(format!("warn: {message}"));
    }
}
