//! `ServiceManager` for `LinuxHost`.
//!
//! Runtime state always goes through `/sbin/service`, which redirects to
//! systemd where present. Boot enablement uses `systemctl` or `chkconfig`.

use anyhow::Result;

use crate::application::ports::{CommandRunner, ServiceManager};
use crate::domain::platform::InitSystem;
use crate::infra::host::{LinuxHost, check};

const SERVICE: &str = "/sbin/service";
const SYSTEMCTL: &str = "/usr/bin/systemctl";
const CHKCONFIG: &str = "/sbin/chkconfig";

impl LinuxHost {
    async fn service(&self, name: &str, verb: &str) -> Result<()> {
        tracing::debug!(service = name, verb, "service command");
        let out = self.runner.run(SERVICE, &[name, verb]).await?;
        check(&out, &format!("service {name} {verb}"))
    }
}

impl ServiceManager for LinuxHost {
    async fn is_running(&self, service: &str) -> Result<bool> {
        let out = self.runner.run(SERVICE, &[service, "status"]).await?;
        Ok(out.status.success())
    }

    async fn is_enabled(&self, service: &str) -> Result<bool> {
        let out = match self.init {
            InitSystem::Systemd => self.runner.run(SYSTEMCTL, &["is-enabled", service]).await?,
            InitSystem::SysV => self.runner.run(CHKCONFIG, &[service]).await?,
        };
        Ok(out.status.success())
    }

    async fn start(&self, service: &str) -> Result<()> {
        self.service(service, "start").await
    }

    async fn stop(&self, service: &str) -> Result<()> {
        self.service(service, "stop").await
    }

    async fn restart(&self, service: &str) -> Result<()> {
        self.service(service, "restart").await
    }

    async fn enable(&self, service: &str) -> Result<()> {
        let out = match self.init {
            InitSystem::Systemd => self.runner.run(SYSTEMCTL, &["enable", service]).await?,
            InitSystem::SysV => self.runner.run(CHKCONFIG, &[service, "on"]).await?,
        };
        check(&out, &format!("enable {service}"))
    }
}
