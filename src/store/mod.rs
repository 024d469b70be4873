//! Result object store
//!
//! Result objects live outside the bridge and are referenced by opaque
//! 64-bit ids. The bridge only talks to a store through the narrow
//! [`ObjectStore`] interface: allocate, upsert data/metadata, append a
//! traceback line and delete.
//!
//! # Architecture
//!
//! - [`ObjectId`] - opaque handle, `0` is never a valid id
//! - [`ResultObject`](object::ResultObject) - the MIME-keyed display container
//! - [`MemoryStore`](memory::MemoryStore) - thread-safe in-process store
//! - [`global`] - the process-wide default store

pub mod memory;
pub mod mime;
pub mod object;

use std::fmt;

pub use memory::{global, MemoryStore};
pub use mime::MimeTypes;
pub use object::{ResultObject, Status};

/// Opaque handle of a result object inside an [`ObjectStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Convert an interpreter-side integer into an id.
    ///
    /// Returns `None` for zero and negative values.
    pub fn from_raw(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().filter(|v| *v != 0).map(ObjectId)
    }

    /// Returns the inner value of the id.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Ids handed out by a store are always non-zero.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

/// Narrow interface the bridge uses to build result objects.
///
/// Every mutating operation on an unknown id is a silent no-op. Payloads
/// are byte slices and are copied by length, so embedded NUL bytes survive.
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Allocate an empty result object.
    fn new_object(&self) -> ObjectId;

    /// Upsert `data[mime_type] = payload`.
    fn add_data(
        &self,
        id: ObjectId,
        mime_type: &str,
        payload: &[u8],
    );

    /// Upsert `metadata[mime_type][meta_key] = payload`.
    fn add_metadata(
        &self,
        id: ObjectId,
        mime_type: &str,
        meta_key: &str,
        payload: &[u8],
    );

    /// Append one traceback line.
    fn append_traceback(
        &self,
        id: ObjectId,
        line: &str,
    );

    /// Release an object. Deleting an unknown id is a no-op.
    fn delete(
        &self,
        id: ObjectId,
    );

    /// Snapshot of the object, if it exists.
    fn get(
        &self,
        id: ObjectId,
    ) -> Option<ResultObject>;
}
