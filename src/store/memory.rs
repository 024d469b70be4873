//! In-process result object store
//!
//! Objects are indexed by a counter that starts at 1, so `0` can be used
//! by callers as "no object". The map sits behind a `parking_lot::RwLock`
//! and every public operation takes the lock for its whole duration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::trace;

use super::{ObjectId, ObjectStore, ResultObject};

/// Ids above this bound are never handed out.
const MAX_OBJECT_ID: u64 = u64::MAX - 10;

static GLOBAL_STORE: Lazy<Arc<MemoryStore>> = Lazy::new(|| Arc::new(MemoryStore::new()));

/// The process-wide default store.
pub fn global() -> Arc<MemoryStore> {
    Arc::clone(&GLOBAL_STORE)
}

/// Thread-safe in-memory [`ObjectStore`].
#[derive(Debug)]
pub struct MemoryStore {
    next_id: AtomicU64,
    objects: RwLock<HashMap<ObjectId, ResultObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    pub fn contains(
        &self,
        id: ObjectId,
    ) -> bool {
        self.objects.read().contains_key(&id)
    }

    /// The id most recently handed out, `0` if none.
    pub fn last_id(&self) -> ObjectId {
        ObjectId(self.next_id.load(Ordering::SeqCst))
    }

    fn update<F>(
        &self,
        id: ObjectId,
        f: F,
    ) where
        F: FnOnce(&mut ResultObject),
    {
        if let Some(object) = self.objects.write().get_mut(&id) {
            f(object);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MemoryStore {
    /// # Panics
    ///
    /// Panics when the id space is exhausted; the store cannot continue.
    fn new_object(&self) -> ObjectId {
        let raw = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        if raw >= MAX_OBJECT_ID {
            panic!("ran out of object ids in the result store");
        }
        let id = ObjectId(raw);
        self.objects.write().insert(id, ResultObject::new());
        trace!("allocated result object {}", id);
        id
    }

    fn add_data(
        &self,
        id: ObjectId,
        mime_type: &str,
        payload: &[u8],
    ) {
        self.update(id, |object| {
            object.data.insert(mime_type.to_string(), payload.to_vec());
        });
    }

    fn add_metadata(
        &self,
        id: ObjectId,
        mime_type: &str,
        meta_key: &str,
        payload: &[u8],
    ) {
        self.update(id, |object| {
            object
                .metadata
                .entry(mime_type.to_string())
                .or_default()
                .insert(meta_key.to_string(), payload.to_vec());
        });
    }

    fn append_traceback(
        &self,
        id: ObjectId,
        line: &str,
    ) {
        self.update(id, |object| object.traceback.push(line.to_string()));
    }

    fn delete(
        &self,
        id: ObjectId,
    ) {
        if self.objects.write().remove(&id).is_some() {
            trace!("deleted result object {}", id);
        }
    }

    fn get(
        &self,
        id: ObjectId,
    ) -> Option<ResultObject> {
        if !id.is_valid() {
            return None;
        }
        self.objects.read().get(&id).cloned()
    }
}
