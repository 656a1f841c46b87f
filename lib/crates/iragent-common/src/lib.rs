//! Types shared between the reconciler and anything that reads its output:
//! the desired-state document, host facts snapshots and the agent layout.

pub mod desired;
pub mod facts;
pub mod layout;

pub use desired::{DesiredState, Ensure, ParseEnsureError};
pub use facts::{
    AgentVersionRecord, AuditCompatRecord, FactsRecord, HostFacts, Observation, PlatformId,
};
pub use layout::{AGENT_SERVICE, AUDIT_PACKAGE, AUDIT_SERVICE, AgentLayout};
