//! Agent system
//!
//! - `agent` - Definitions and the validated, registered form
//! - `registry` - Discovery, validation and lookup
//! - `builtin` - Agents shipped with the service
//! - `error` - Error types

pub mod agent;
pub mod builtin;
pub mod error;
pub mod registry;

pub use agent::{Agent, AgentDefinition, AgentInfo, ExecuteFn};
pub use error::{AgentError, AgentResult};
pub use registry::{AgentCandidate, AgentRegistry, InitializationReport};
