//! Desired-state validation.
//!
//! Pure functions only — no I/O, no async, no filesystem access.
//! Turns the raw [`DesiredState`] document into a fully-typed [`Desired`].

use std::fmt;

use iragent_common::{DesiredState, Ensure};

use crate::domain::error::ValidationError;

/// Validated desired state for one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Desired {
    Present(PresentState),
    Absent { manage_auditd: bool },
}

/// Parameters for `ensure = present`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentState {
    pub source: String,
    pub token: Token,
    pub target_version: Option<String>,
    pub https_proxy: Option<ProxyAddr>,
    pub audit_compatibility_mode: bool,
    pub manage_auditd: bool,
}

/// Registration token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// `host:port` proxy address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAddr {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for ProxyAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl ProxyAddr {
    /// Parse `host:port`.
    ///
    /// # Errors
    ///
    /// Returns an error when the host is empty or the port is not in 1..=65535.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let invalid = |reason| ValidationError::InvalidProxy {
            value: value.to_string(),
            reason,
        };
        if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(invalid("must not contain whitespace"));
        }
        if value.contains("://") {
            return Err(invalid("expected host:port without a scheme"));
        }
        let (host, port) = value.rsplit_once(':').ok_or_else(|| invalid("expected host:port"))?;
        if host.is_empty() {
            return Err(invalid("host is empty"));
        }
        let port: u16 = port.parse().map_err(|_| invalid("port is not a number in 1-65535"))?;
        if port == 0 {
            return Err(invalid("port is not a number in 1-65535"));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

/// Validate a raw desired-state document.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found. Nothing has been applied at
/// this point, so the caller can surface it directly.
pub fn validate(raw: &DesiredState) -> Result<Desired, ValidationError> {
    match raw.ensure {
        Ensure::Absent => Ok(Desired::Absent {
            manage_auditd: raw.manage_auditd,
        }),
        Ensure::Present => {
            let source = required(raw.source.as_deref(), "source")?;
            if local_source_path(&source).is_none() {
                return Err(ValidationError::UnsupportedSource(source));
            }
            let token = required(raw.token.as_deref(), "token")?;
            let target_version = match raw.target_version.as_deref() {
                Some(v) if v.trim().is_empty() => {
                    return Err(ValidationError::Blank("target_version"));
                }
                Some(v) => Some(v.trim().to_string()),
                None => None,
            };
            let https_proxy = match raw.https_proxy.as_deref() {
                Some(p) if p.trim().is_empty() => None,
                Some(p) => Some(ProxyAddr::parse(p.trim())?),
                None => None,
            };
            Ok(Desired::Present(PresentState {
                source,
                token: Token(token),
                target_version,
                https_proxy,
                audit_compatibility_mode: raw.auditd_compatibility_mode,
                manage_auditd: raw.manage_auditd,
            }))
        }
    }
}

/// Filesystem path of an installer source, if it is local.
#[must_use]
pub fn local_source_path(source: &str) -> Option<&str> {
    let path = source.strip_prefix("file://").unwrap_or(source);
    path.starts_with('/').then_some(path)
}

fn required(value: Option<&str>, key: &'static str) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::MissingParameter(key))?.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingParameter(key));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::IllegalCharacters { key });
    }
    Ok(value.to_string())
}

// ── Unit tests ────────────────────────────────────────────────────────────────
