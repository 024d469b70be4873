//! Helpers shared by the integration tests.
//!
//! All tests here share the process-wide session and never stop it; each
//! test uses fragment names and globals of its own.

use ipylua::{ResultObject, Session};

/// The global session, started.
pub fn session() -> &'static Session {
    let session = Session::global();
    session.start().expect("Lua runtime failed to start");
    session
}

/// Evaluate one cell and fetch its result object.
pub fn eval(
    name: &str,
    source: &str,
) -> ResultObject {
    let session = session();
    let id = session.eval_string(name, source).unwrap();
    session.result(id).expect("result object missing from store")
}

pub fn plain(result: &ResultObject) -> &str {
    result.data_text("text/plain").unwrap_or("")
}
