//! Result marshalling
//!
//! Turns translated interpreter values and caught exceptions into result
//! objects in the external store.
//!
//! Policy:
//! - a mapping keyed only by recognized MIME types becomes the `data` map,
//!   payloads copied byte for byte
//! - a mapping `{data = <mime map>, metadata = {<mime> = {<key> = v}}}`
//!   additionally fills the metadata map
//! - `nil` publishes an empty result
//! - anything else is pretty-printed into `text/plain`

use std::sync::Arc;

use tracing::trace;

use crate::runtime::value::ScriptValue;
use crate::store::mime::{MimeTypes, MIME_TYPE_TEXT};
use crate::store::object::STATUS_KEY;
use crate::store::{ObjectId, ObjectStore};

pub const ENAME_KEY: &str = "ename";
pub const EVALUE_KEY: &str = "evalue";
pub const ERROR_NAME: &str = "ERROR";

const DISPLAY_DATA_KEY: &str = "data";
const DISPLAY_METADATA_KEY: &str = "metadata";

/// Writes results into an [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct ResultMarshaller {
    store: Arc<dyn ObjectStore>,
    mime_types: Arc<MimeTypes>,
}

impl ResultMarshaller {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        mime_types: MimeTypes,
    ) -> Self {
        Self {
            store,
            mime_types: Arc::new(mime_types),
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Non-empty mapping whose keys are all recognized MIME types.
    pub fn is_mime_map(
        &self,
        value: &ScriptValue,
    ) -> bool {
        match value.as_mapping() {
            Some(entries) if !entries.is_empty() => entries.iter().all(|(key, _)| {
                key.as_text()
                    .is_some_and(|mime_type| self.mime_types.contains(mime_type))
            }),
            _ => false,
        }
    }

    /// Allocate a new result object holding `value`.
    pub fn publish(
        &self,
        value: &ScriptValue,
    ) -> ObjectId {
        let id = self.store.new_object();
        self.write(id, value);
        id
    }

    /// Write `value` into an existing result object.
    pub fn write(
        &self,
        id: ObjectId,
        value: &ScriptValue,
    ) {
        if let Some((data, metadata)) = self.display_parts(value) {
            self.write_data(id, data);
            if let Some(metadata) = metadata {
                self.write_metadata(id, metadata);
            }
        } else if self.is_mime_map(value) {
            self.write_data(id, value);
        } else if !value.is_nil() {
            trace!("rendering {} result as text", id);
            self.store
                .add_data(id, MIME_TYPE_TEXT, value.to_string().as_bytes());
        }
    }

    /// Attach one metadata entry, e.g. the width of an image.
    pub fn add_metadata(
        &self,
        id: ObjectId,
        mime_type: &str,
        meta_key: &str,
        value: &ScriptValue,
    ) {
        self.store
            .add_metadata(id, mime_type, meta_key, &value.to_payload());
    }

    /// Build a fresh error result.
    pub fn publish_error(
        &self,
        message: &str,
        phase: &str,
    ) -> ObjectId {
        let id = self.store.new_object();
        self.store.add_data(id, ENAME_KEY, ERROR_NAME.as_bytes());
        self.store.add_data(id, EVALUE_KEY, message.as_bytes());
        self.store.append_traceback(id, phase);
        self.store.add_data(id, STATUS_KEY, b"error");
        id
    }

    /// Drop objects left behind by a failed call.
    pub fn rollback(
        &self,
        ids: &[ObjectId],
    ) {
        for id in ids {
            trace!("rolling back {}", id);
            self.store.delete(*id);
        }
    }

    /// Split the `{data = ..., metadata = ...}` shape.
    fn display_parts<'a>(
        &self,
        value: &'a ScriptValue,
    ) -> Option<(&'a ScriptValue, Option<&'a ScriptValue>)> {
        let entries = value.as_mapping()?;
        let only_display_keys = entries.iter().all(|(key, _)| {
            matches!(key.as_text(), Some(DISPLAY_DATA_KEY | DISPLAY_METADATA_KEY))
        });
        if !only_display_keys {
            return None;
        }
        let data = value.get(DISPLAY_DATA_KEY).filter(|d| self.is_mime_map(d))?;
        let metadata = value
            .get(DISPLAY_METADATA_KEY)
            .filter(|m| m.as_mapping().is_some());
        Some((data, metadata))
    }

    fn write_data(
        &self,
        id: ObjectId,
        mime_map: &ScriptValue,
    ) {
        for (key, payload) in mime_map.as_mapping().unwrap_or_default() {
            if let Some(mime_type) = key.as_text() {
                self.store.add_data(id, mime_type, &payload.to_payload());
            }
        }
    }

    fn write_metadata(
        &self,
        id: ObjectId,
        metadata: &ScriptValue,
    ) {
        for (mime_key, entries) in metadata.as_mapping().unwrap_or_default() {
            let (Some(mime_type), Some(entries)) = (mime_key.as_text(), entries.as_mapping())
            else {
                continue;
            };
            for (meta_key, payload) in entries {
                if let Some(meta_key) = meta_key.as_text() {
                    self.add_metadata(id, mime_type, meta_key, payload);
                }
            }
        }
    }
}
