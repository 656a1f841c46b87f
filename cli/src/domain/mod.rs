//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod action;
pub mod desired;
pub mod engine;
pub mod error;
pub mod facts;
pub mod file_line;
pub mod platform;
pub mod version;

pub use action::{Action, ActionKind, Guard, InstallMode, Plan, PlanNode, ServiceState, Trigger};
pub use desired::{Desired, PresentState, ProxyAddr, Token, validate};
pub use engine::{AuditContent, PlanContext, plan, select_install_mode};
pub use error::{ObservationError, PlanError, ValidationError};
pub use platform::{InitSystem, PackageTool, Platform};
