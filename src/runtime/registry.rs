//! Loaded code fragment registry
//!
//! The registry has no lock of its own: it is only ever reached through the
//! session gate, so the check, the load and the insert of one fragment
//! happen inside a single critical section.

use indexmap::IndexSet;

/// Names of code fragments that loaded successfully, in load order.
#[derive(Debug, Default)]
pub struct CodeRegistry {
    loaded: IndexSet<String>,
}

impl CodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(
        &self,
        name: &str,
    ) -> bool {
        self.loaded.contains(name)
    }

    /// Record `name` as loaded. Returns `false` if it already was.
    pub fn mark_loaded(
        &mut self,
        name: &str,
    ) -> bool {
        if self.loaded.contains(name) {
            return false;
        }
        self.loaded.insert(name.to_string())
    }

    /// Forget every fragment. Only used when the runtime is torn down.
    pub(crate) fn clear(&mut self) {
        self.loaded.clear();
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.loaded.iter().map(String::as_str)
    }
}
