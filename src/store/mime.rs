//! MIME type keys understood by notebook front ends
//!
//! The set is open: callers may register additional keys through
//! [`MimeTypes::with_extra`]. The bridge treats every key as an opaque
//! string and never validates its syntax.

use indexmap::IndexSet;

pub const MIME_TYPE_HTML: &str = "text/html";
pub const MIME_TYPE_JAVASCRIPT: &str = "application/javascript";
pub const MIME_TYPE_JPEG: &str = "image/jpeg";
pub const MIME_TYPE_JSON: &str = "application/json";
pub const MIME_TYPE_LATEX: &str = "text/latex";
pub const MIME_TYPE_MARKDOWN: &str = "text/markdown";
pub const MIME_TYPE_PNG: &str = "image/png";
pub const MIME_TYPE_PDF: &str = "application/pdf";
pub const MIME_TYPE_SVG: &str = "image/svg+xml";
pub const MIME_TYPE_TEXT: &str = "text/plain";

/// Display types every front end is expected to know.
pub const BUILTIN_MIME_TYPES: [&str; 10] = [
    MIME_TYPE_HTML,
    MIME_TYPE_JAVASCRIPT,
    MIME_TYPE_JPEG,
    MIME_TYPE_JSON,
    MIME_TYPE_LATEX,
    MIME_TYPE_MARKDOWN,
    MIME_TYPE_PNG,
    MIME_TYPE_PDF,
    MIME_TYPE_SVG,
    MIME_TYPE_TEXT,
];

/// Payloads of these types are raw bytes and travel base64-encoded in JSON.
pub fn is_binary(mime_type: &str) -> bool {
    matches!(mime_type, MIME_TYPE_PNG | MIME_TYPE_JPEG | MIME_TYPE_PDF)
}

/// The set of keys recognized when deciding whether a mapping is a MIME map.
#[derive(Debug, Clone)]
pub struct MimeTypes {
    known: IndexSet<String>,
}

impl MimeTypes {
    /// Built-in display types only.
    pub fn new() -> Self {
        Self {
            known: BUILTIN_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Built-in display types plus caller supplied keys.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut types = Self::new();
        types.known.extend(extra.into_iter().map(Into::into));
        types
    }

    pub fn contains(
        &self,
        mime_type: &str,
    ) -> bool {
        self.known.contains(mime_type)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

impl Default for MimeTypes {
    fn default() -> Self {
        Self::new()
    }
}
