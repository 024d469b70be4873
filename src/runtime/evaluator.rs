//! Protected evaluation
//!
//! Every call into Lua goes through [`ProtectedEvaluator::protected`]:
//! interpreter exceptions come back as `mlua::Error` and are turned into a
//! message string right there, and objects the failed call allocated are
//! rolled back from the store.

use mlua::{Function, Lua, Value};
use tracing::{debug, warn};

use crate::runtime::marshal::ResultMarshaller;
use crate::runtime::primitives::PendingObjects;
use crate::runtime::registry::CodeRegistry;
use crate::runtime::value::ScriptValue;
use crate::store::ObjectId;

/// Traceback line of an error raised while running ad-hoc code.
pub const EVAL_PHASE: &str = "evalString";
/// Traceback line of an entry point that did not hand back an object.
pub const ENTRY_POINT_PHASE: &str = "evalString: entry point";

const TRACEBACK_MARKER: &str = "\nstack traceback:";

/// Result of loading a named code fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Executed and registered; carries the published return value, if any.
    Loaded(Option<ObjectId>),
    /// Registered earlier; nothing was executed.
    AlreadyLoaded,
    /// Raised; not registered, may be retried.
    Failed(String),
}

impl LoadOutcome {
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            LoadOutcome::Loaded(id) => *id,
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            LoadOutcome::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        !matches!(self, LoadOutcome::Failed(_))
    }
}

/// Split an interpreter error into its message and traceback lines.
pub(crate) fn split_error(message: &str) -> (&str, Vec<&str>) {
    match message.split_once(TRACEBACK_MARKER) {
        Some((summary, trace)) => (
            summary.trim_end(),
            trace
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect(),
        ),
        None => (message.trim_end(), Vec::new()),
    }
}

/// Lua chunk names starting with `=` are shown verbatim in messages.
fn chunk_name(name: &str) -> String {
    format!("={}", name.replace('\0', "\\0"))
}

/// Runs code inside one Lua state. Borrowed for the span of a gated call.
pub(crate) struct ProtectedEvaluator<'a> {
    lua: &'a Lua,
    marshaller: &'a ResultMarshaller,
    max_depth: usize,
}

impl<'a> ProtectedEvaluator<'a> {
    pub(crate) fn new(
        lua: &'a Lua,
        marshaller: &'a ResultMarshaller,
        max_depth: usize,
    ) -> Self {
        Self {
            lua,
            marshaller,
            max_depth,
        }
    }

    /// Run `f` with allocation tracking; a raised error becomes its message.
    ///
    /// On success the objects allocated during the call are handed back.
    fn protected<T, F>(
        &self,
        f: F,
    ) -> Result<(T, Vec<ObjectId>), String>
    where
        F: FnOnce(&Lua) -> mlua::Result<T>,
    {
        self.lua.set_app_data(PendingObjects::default());
        let result = f(self.lua);
        let pending = self
            .lua
            .remove_app_data::<PendingObjects>()
            .unwrap_or_default();

        match result {
            Ok(value) => Ok((value, pending.0)),
            Err(err) => {
                self.marshaller.rollback(&pending.0);
                Err(err.to_string())
            }
        }
    }

    /// Load `source` under `name` at most once.
    pub(crate) fn load(
        &self,
        registry: &mut CodeRegistry,
        name: &str,
        source: &[u8],
    ) -> LoadOutcome {
        if registry.is_loaded(name) {
            debug!("code fragment `{}` already loaded", name);
            return LoadOutcome::AlreadyLoaded;
        }

        let result = self.protected(|lua| {
            lua.load(source)
                .set_name(chunk_name(name))
                .eval::<Value>()
        });

        match result {
            Ok((value, _)) => {
                registry.mark_loaded(name);
                let value = ScriptValue::from_lua(&value, self.max_depth);
                let id = (!value.is_nil()).then(|| self.marshaller.publish(&value));
                debug!("code fragment `{}` loaded", name);
                LoadOutcome::Loaded(id)
            }
            Err(message) => {
                warn!("code fragment `{}` failed to load: {}", name, message);
                let (summary, _) = split_error(&message);
                LoadOutcome::Failed(summary.to_string())
            }
        }
    }

    /// Evaluate `source` through the entry point; always yields an object.
    pub(crate) fn eval(
        &self,
        entry_point: &str,
        name: &str,
        source: &[u8],
    ) -> ObjectId {
        let result = self.protected(|lua| {
            let entry: Function = lua.globals().get(entry_point)?;
            let code = lua.create_string(source)?;
            let value: Value = entry.call((name, code))?;
            Ok(value)
        });

        match result {
            Ok((value, allocated)) => match self.returned_object(&value) {
                Some(id) => id,
                None => {
                    warn!("entry point `{}` returned no result object for `{}`", entry_point, name);
                    self.marshaller.rollback(&allocated);
                    let message = format!("no result object returned from {}", entry_point);
                    self.marshaller.publish_error(&message, ENTRY_POINT_PHASE)
                }
            },
            Err(message) => {
                debug!("evaluation of `{}` raised: {}", name, message);
                let (summary, trace) = split_error(&message);
                let id = self.marshaller.publish_error(summary, EVAL_PHASE);
                for line in trace {
                    self.marshaller.store().append_traceback(id, line);
                }
                id
            }
        }
    }

    /// The object id handed back by the entry point, if it names a live object.
    fn returned_object(
        &self,
        value: &Value,
    ) -> Option<ObjectId> {
        let id = match value {
            Value::Integer(raw) => ObjectId::from_raw(*raw)?,
            Value::Number(raw) if raw.fract() == 0.0 => ObjectId::from_raw(*raw as i64)?,
            _ => return None,
        };
        self.marshaller.store().get(id).map(|_| id)
    }
}
