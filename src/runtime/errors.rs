//! Bridge errors
//!
//! Interpreter exceptions are not errors at this level: they are caught at
//! the protected call site and turned into data. Only lifecycle failures
//! and broken call contracts are reported through [`BridgeError`].

use thiserror::Error;

/// Bridge result
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Bridge errors
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The interpreter could not be brought up. Fatal for the process.
    #[error("Lua runtime failed to initialize: {0}")]
    RuntimeInit(String),

    #[error("Lua runtime is not running")]
    NotStarted,

    #[error("bootstrap fragment `{0}` has not been loaded")]
    BootstrapMissing(String),
}

impl BridgeError {
    /// Whether the host should abort instead of retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BridgeError::RuntimeInit(_))
    }
}
