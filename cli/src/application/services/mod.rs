//! Application services — use-case orchestration.
//!
//! Services compose domain logic with port trait calls and import only from
//! `crate::domain` and `crate::application::ports`.

pub mod apply;
pub mod facts;
pub mod reconcile;
