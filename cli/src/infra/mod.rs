//! Infrastructure layer — concrete implementations of application port traits.
//!
//! All I/O lives here: process execution, filesystem access, service and
//! package tooling, the YAML config store and embedded assets.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod assets;
pub mod command_runner;
pub mod config;
pub mod fs;
pub mod host;
pub mod package;
pub mod platform;
pub mod service;
pub mod snapshot;
