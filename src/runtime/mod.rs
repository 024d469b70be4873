//! Embedded Lua evaluation bridge
//!
//! Owns the single in-process Lua runtime, serializes every access to it,
//! loads named code fragments at most once, runs code under exception
//! protection and publishes what comes back as result objects.
//!
//! # Architecture
//!
//! - [`Session`](session::Session) - gate + lifecycle, the public entry points
//! - [`CodeRegistry`](registry::CodeRegistry) - fragments loaded so far
//! - `ProtectedEvaluator` - protected load / eval inside one Lua state
//! - [`ResultMarshaller`](marshal::ResultMarshaller) - values and errors to result objects
//! - [`ScriptValue`](value::ScriptValue) - Lua values translated at the boundary
//! - `primitives` - the `ipylua` table Lua code uses to reach the store

pub mod errors;
pub mod evaluator;
pub mod kernel_info;
pub mod marshal;
mod primitives;
pub mod registry;
pub mod session;
pub mod value;

pub use errors::{BridgeError, BridgeResult};
pub use evaluator::LoadOutcome;
pub use kernel_info::KernelInfo;
pub use marshal::ResultMarshaller;
pub use primitives::PRIMITIVES_TABLE;
pub use registry::CodeRegistry;
pub use session::{Session, StopStatus, BOOTSTRAP_FRAGMENT, BOOTSTRAP_SOURCE};
pub use value::{Number, ScriptValue};

/// Version descriptor of the embedded interpreter.
pub const RUNTIME_VERSION: &str = "Lua 5.4";

#[cfg(test)]
mod tests;
