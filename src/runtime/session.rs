//! The evaluation session
//!
//! A [`Session`] owns the single Lua runtime of the process and the
//! registry of loaded fragments, both behind one `parking_lot::Mutex`: the
//! gate. Every public entry point holds the gate for its whole duration,
//! time spent inside Lua included, so at most one of start, stop, load and
//! eval runs at any instant.
//!
//! ```text
//! caller ─► gate.lock ─► ensure_started ─► registry check ─► protected call
//!                                                                 │
//! caller ◄─ ObjectId / LoadOutcome ◄─ gate.unlock ◄─ marshal ◄────┘
//! ```
//!
//! The gate is not reentrant. Nothing reachable from Lua takes it: the
//! primitives only talk to the result store.

use std::fmt;
use std::fs;
use std::sync::Arc;

use mlua::{Lua, LuaOptions, StdLib};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::runtime::errors::{BridgeError, BridgeResult};
use crate::runtime::evaluator::{LoadOutcome, ProtectedEvaluator};
use crate::runtime::kernel_info::KernelInfo;
use crate::runtime::marshal::ResultMarshaller;
use crate::runtime::primitives;
use crate::runtime::registry::CodeRegistry;
use crate::runtime::RUNTIME_VERSION;
use crate::store::{self, MimeTypes, ObjectId, ObjectStore, ResultObject};
use crate::util::config::RuntimeConfig;

/// Registry name of the fragment defining the eval entry point.
pub const BOOTSTRAP_FRAGMENT: &str = "ipylua/bootstrap.lua";

/// Built-in bootstrap: entry point plus `display` helpers.
pub const BOOTSTRAP_SOURCE: &str = include_str!("lua/bootstrap.lua");

static SESSION: OnceCell<Session> = OnceCell::new();

/// Status returned by [`Session::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStatus {
    Stopped,
    NotRunning,
}

impl StopStatus {
    pub fn as_code(self) -> i32 {
        match self {
            StopStatus::Stopped => 0,
            StopStatus::NotRunning => 1,
        }
    }
}

/// The live interpreter. Exists only while the runtime is running.
struct RuntimeHandle {
    lua: Lua,
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("used_memory", &self.lua.used_memory())
            .finish()
    }
}

/// Everything the gate protects.
#[derive(Debug, Default)]
struct RuntimeState {
    handle: Option<RuntimeHandle>,
    registry: CodeRegistry,
}

/// Owner of the process-wide Lua runtime.
#[derive(Debug)]
pub struct Session {
    gate: Mutex<RuntimeState>,
    marshaller: ResultMarshaller,
    config: RuntimeConfig,
}

impl Session {
    /// Install the process-wide session, or return the one already installed.
    ///
    /// Only the first call's configuration and store are used.
    pub fn install(
        config: RuntimeConfig,
        store: Arc<dyn ObjectStore>,
    ) -> &'static Session {
        let mut installed_now = false;
        let session = SESSION.get_or_init(|| {
            installed_now = true;
            Session::new(config, store)
        });
        if !installed_now {
            warn!("session already installed, keeping its configuration");
        }
        session
    }

    /// The process-wide session, installed with defaults and the global store
    /// if nothing was installed before.
    pub fn global() -> &'static Session {
        SESSION.get_or_init(|| Session::new(RuntimeConfig::default(), store::global()))
    }

    pub(crate) fn new(
        config: RuntimeConfig,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        let mime_types = MimeTypes::with_extra(config.extra_mime_types.iter().cloned());
        Self {
            gate: Mutex::new(RuntimeState::default()),
            marshaller: ResultMarshaller::new(store, mime_types),
            config,
        }
    }

    /// Start the runtime if it is not running. Idempotent.
    ///
    /// An error here is fatal for the host: the runtime could not be built
    /// or the bootstrap fragment could not be loaded.
    pub fn start(&self) -> BridgeResult<()> {
        let mut state = self.gate.lock();
        self.ensure_started(&mut state)
    }

    /// Tear the runtime down and forget every loaded fragment. Idempotent.
    pub fn stop(&self) -> StopStatus {
        let mut state = self.gate.lock();
        match state.handle.take() {
            Some(handle) => {
                drop(handle);
                state.registry.clear();
                info!("Lua runtime stopped");
                StopStatus::Stopped
            }
            None => {
                debug!("stop requested but Lua runtime is not running");
                StopStatus::NotRunning
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.gate.lock().handle.is_some()
    }

    /// Load a named code fragment at most once, starting the runtime first.
    ///
    /// `Err` only reports a fatal start failure; a fragment that raises is
    /// reported as [`LoadOutcome::Failed`].
    pub fn load_code(
        &self,
        name: &str,
        source: impl AsRef<[u8]>,
    ) -> BridgeResult<LoadOutcome> {
        debug!("load_code `{}`", name);
        let mut state = self.gate.lock();
        self.ensure_started(&mut state)?;
        Ok(self.load_locked(&mut state, name, source.as_ref()))
    }

    /// Load the built-in bootstrap fragment.
    pub fn load_bootstrap(&self) -> BridgeResult<LoadOutcome> {
        self.load_code(BOOTSTRAP_FRAGMENT, BOOTSTRAP_SOURCE)
    }

    pub fn is_code_loaded(
        &self,
        name: &str,
    ) -> bool {
        self.gate.lock().registry.is_loaded(name)
    }

    /// Evaluate ad-hoc code through the entry point.
    ///
    /// The returned id always names a complete result object, either the
    /// evaluation's output or an error result. `Err` means the call was made
    /// before the runtime was started or the bootstrap loaded.
    pub fn eval_string(
        &self,
        name: &str,
        source: impl AsRef<[u8]>,
    ) -> BridgeResult<ObjectId> {
        debug!("eval_string `{}`", name);
        let state = self.gate.lock();
        let handle = state.handle.as_ref().ok_or(BridgeError::NotStarted)?;
        if !state.registry.is_loaded(BOOTSTRAP_FRAGMENT) {
            return Err(BridgeError::BootstrapMissing(BOOTSTRAP_FRAGMENT.to_string()));
        }

        let evaluator =
            ProtectedEvaluator::new(&handle.lua, &self.marshaller, self.config.max_render_depth);
        Ok(evaluator.eval(&self.config.entry_point, name, source.as_ref()))
    }

    /// Static description of the embedded interpreter.
    pub fn runtime_version(&self) -> &'static str {
        RUNTIME_VERSION
    }

    /// Names of loaded fragments, in load order.
    pub fn loaded_fragments(&self) -> Vec<String> {
        self.gate
            .lock()
            .registry
            .names()
            .map(str::to_string)
            .collect()
    }

    pub fn kernel_info(&self) -> KernelInfo {
        KernelInfo::current()
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        self.marshaller.store()
    }

    /// Snapshot of a result object from the session's store.
    pub fn result(
        &self,
        id: ObjectId,
    ) -> Option<ResultObject> {
        self.store().get(id)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    fn ensure_started(
        &self,
        state: &mut RuntimeState,
    ) -> BridgeResult<()> {
        if state.handle.is_some() {
            return Ok(());
        }

        debug!("starting Lua runtime");
        let lua = Lua::new_with(StdLib::ALL_SAFE, LuaOptions::new())
            .map_err(|e| BridgeError::RuntimeInit(e.to_string()))?;
        primitives::install(&lua, &self.marshaller, self.config.max_render_depth)
            .map_err(|e| BridgeError::RuntimeInit(e.to_string()))?;

        state.registry.clear();
        state.handle = Some(RuntimeHandle { lua });

        if self.config.autoload_bootstrap {
            let outcome = self
                .bootstrap_source()
                .map(|source| self.load_locked(state, BOOTSTRAP_FRAGMENT, source.as_bytes()));
            let failure = match outcome {
                Ok(LoadOutcome::Failed(message)) => Some(message),
                Ok(_) => None,
                Err(e) => Some(e.to_string()),
            };
            if let Some(message) = failure {
                state.handle = None;
                state.registry.clear();
                return Err(BridgeError::RuntimeInit(format!(
                    "bootstrap fragment failed to load: {}",
                    message
                )));
            }
        }

        info!("Lua runtime started ({})", RUNTIME_VERSION);
        Ok(())
    }

    fn bootstrap_source(&self) -> std::io::Result<String> {
        match &self.config.bootstrap {
            Some(path) => fs::read_to_string(path),
            None => Ok(BOOTSTRAP_SOURCE.to_string()),
        }
    }

    fn load_locked(
        &self,
        state: &mut RuntimeState,
        name: &str,
        source: &[u8],
    ) -> LoadOutcome {
        let RuntimeState { handle, registry } = state;
        let Some(handle) = handle.as_ref() else {
            return LoadOutcome::Failed(BridgeError::NotStarted.to_string());
        };
        ProtectedEvaluator::new(&handle.lua, &self.marshaller, self.config.max_render_depth)
            .load(registry, name, source)
    }
}
