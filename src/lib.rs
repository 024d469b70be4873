//! ipylua - Lua evaluation bridge for notebook kernels
//!
//! Embeds a Lua 5.4 interpreter in the host process, loads named code
//! fragments at most once, evaluates ad-hoc code under exception
//! protection and publishes every outcome as a MIME-keyed result object.
//!
//! # Example
//!
//! ```no_run
//! use ipylua::{Result, Session};
//!
//! fn main() -> Result<()> {
//!     let session = Session::global();
//!     session.start()?;
//!     let id = session.eval_string("cell-1", "1 + 1")?;
//!     let result = session.result(id).expect("result object");
//!     assert_eq!(result.data_text("text/plain"), Some("2"));
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/ipylua")]
#![warn(rust_2018_idioms)]

// Public modules
pub mod repl;
pub mod runtime;
pub mod store;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use runtime::{
    BridgeError, BridgeResult, KernelInfo, LoadOutcome, ScriptValue, Session, StopStatus,
};
pub use store::{MemoryStore, ObjectId, ObjectStore, ResultObject, Status};

use std::fs;
use std::path::Path;

use tracing::debug;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Kernel name
pub const NAME: &str = "ipylua";

/// Start the global session and evaluate `source` as one cell.
pub fn eval(
    name: &str,
    source: &str,
) -> Result<ResultObject> {
    let session = Session::global();
    session.start()?;
    let id = session.eval_string(name, source)?;
    debug!("evaluated `{}` into {}", name, id);
    session
        .result(id)
        .with_context(|| format!("result object {} vanished from the store", id))
}

/// Evaluate the contents of a Lua file, named after its path.
pub fn eval_file(path: &Path) -> Result<ResultObject> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    eval(&path.display().to_string(), &source)
}
