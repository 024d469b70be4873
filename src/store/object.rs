//! Result object representation

use base64::Engine;
use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};

use super::mime;

/// Payload key marking an error result.
pub const STATUS_KEY: &str = "status";

/// Outcome recorded on a result object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// One evaluation's display output.
///
/// `data` maps MIME types to byte payloads, `metadata` maps MIME types to
/// key/payload maps. Both are upserts: the last write for a key wins.
/// The traceback only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultObject {
    pub data: IndexMap<String, Vec<u8>>,
    pub metadata: IndexMap<String, IndexMap<String, Vec<u8>>>,
    pub traceback: Vec<String>,
}

impl ResultObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Error` once `data["status"]` holds `"error"`, `Ok` otherwise.
    pub fn status(&self) -> Status {
        match self.data.get(STATUS_KEY) {
            Some(value) if value.as_slice() == b"error" => Status::Error,
            _ => Status::Ok,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status() == Status::Error
    }

    /// Raw payload stored under `mime_type`.
    pub fn data_bytes(
        &self,
        mime_type: &str,
    ) -> Option<&[u8]> {
        self.data.get(mime_type).map(Vec::as_slice)
    }

    /// Payload under `mime_type` as text, if it is valid UTF-8.
    pub fn data_text(
        &self,
        mime_type: &str,
    ) -> Option<&str> {
        self.data_bytes(mime_type)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    pub fn metadata_bytes(
        &self,
        mime_type: &str,
        meta_key: &str,
    ) -> Option<&[u8]> {
        self.metadata
            .get(mime_type)
            .and_then(|entries| entries.get(meta_key))
            .map(Vec::as_slice)
    }

    /// Render as a Jupyter-style JSON document.
    pub fn to_json(&self) -> serde_json::Value {
        // Serializing string keyed maps of strings cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// A payload as it appears in JSON: text when it is UTF-8 and not a binary
/// MIME type, base64 otherwise.
struct Payload<'a> {
    mime_type: &'a str,
    bytes: &'a [u8],
}

impl Serialize for Payload<'_> {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        if !mime::is_binary(self.mime_type) {
            if let Ok(text) = std::str::from_utf8(self.bytes) {
                return serializer.serialize_str(text);
            }
        }
        let b64 = base64::engine::general_purpose::STANDARD;
        serializer.serialize_str(&b64.encode(self.bytes))
    }
}

#[derive(serde::Serialize)]
struct ResultObjectView<'a> {
    data: IndexMap<&'a str, Payload<'a>>,
    metadata: IndexMap<&'a str, IndexMap<&'a str, Payload<'a>>>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    traceback: &'a [String],
    status: Status,
}

impl Serialize for ResultObject {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let data = self
            .data
            .iter()
            .map(|(mime_type, bytes)| (mime_type.as_str(), Payload { mime_type, bytes }))
            .collect();
        let metadata = self
            .metadata
            .iter()
            .map(|(mime_type, entries)| {
                let entries = entries
                    .iter()
                    .map(|(key, bytes)| (key.as_str(), Payload { mime_type, bytes }))
                    .collect();
                (mime_type.as_str(), entries)
            })
            .collect();

        ResultObjectView {
            data,
            metadata,
            traceback: &self.traceback,
            status: self.status(),
        }
        .serialize(serializer)
    }
}
