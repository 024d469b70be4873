//! Interpreter values as seen by the bridge
//!
//! Lua values are translated once, at the embedding boundary, into the
//! closed [`ScriptValue`] set. Everything the marshaller needs is decided
//! on that set; exotic Lua types collapse into [`ScriptValue::Other`].
//!
//! Translation is bounded: a table already on the current path becomes
//! `Other("cycle")`, tables below the depth limit become `Other("table")`,
//! and at most [`MAX_ENTRIES`] table entries are translated per value.

use std::cmp::Ordering;
use std::ffi::c_void;
use std::fmt;

use mlua::{Table, Value};

/// Table entries translated for one value; later entries are dropped.
pub const MAX_ENTRIES: usize = 10_000;

/// Lua keywords cannot be printed as bare table keys.
const LUA_KEYWORDS: [&str; 22] = [
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Lua 5.4 keeps integers and floats apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

/// A translated interpreter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Nil,
    Boolean(bool),
    Number(Number),
    /// A string that is valid UTF-8.
    Text(String),
    /// A string that is not valid UTF-8 (images, archives, ...).
    Bytes(Vec<u8>),
    /// Table entries, sorted by key.
    Mapping(Vec<(ScriptValue, ScriptValue)>),
    /// Anything else, carrying the Lua type name.
    Other(String),
}

impl ScriptValue {
    /// Translate a Lua value, descending at most `max_depth` tables deep.
    pub fn from_lua(
        value: &Value,
        max_depth: usize,
    ) -> Self {
        Translator::new(MAX_ENTRIES).translate(value, max_depth)
    }

    /// `Text` when the bytes are UTF-8, `Bytes` otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => ScriptValue::Text(text.to_string()),
            Err(_) => ScriptValue::Bytes(bytes.to_vec()),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, ScriptValue::Nil)
    }

    /// The key as a string, if it is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScriptValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(ScriptValue, ScriptValue)]> {
        match self {
            ScriptValue::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a textual key in a mapping.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&ScriptValue> {
        self.as_mapping()?
            .iter()
            .find(|(k, _)| k.as_text() == Some(key))
            .map(|(_, v)| v)
    }

    /// Payload bytes: strings verbatim, everything else pretty-printed.
    pub fn to_payload(&self) -> Vec<u8> {
        match self {
            ScriptValue::Text(text) => text.as_bytes().to_vec(),
            ScriptValue::Bytes(bytes) => bytes.clone(),
            other => other.to_string().into_bytes(),
        }
    }

    /// JSON form: sequences become arrays, other tables objects keyed by
    /// the key's text. Strings that are not UTF-8 are decoded lossily.
    pub fn to_json(&self) -> Result<serde_json::Value, String> {
        use serde_json::Value as Json;

        let json = match self {
            ScriptValue::Nil => Json::Null,
            ScriptValue::Boolean(b) => Json::Bool(*b),
            ScriptValue::Number(Number::Integer(i)) => Json::from(*i),
            ScriptValue::Number(Number::Float(f)) => {
                serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number)
            }
            ScriptValue::Text(text) => Json::String(text.clone()),
            ScriptValue::Bytes(bytes) => Json::String(String::from_utf8_lossy(bytes).into_owned()),
            ScriptValue::Mapping(entries) => match self.as_sequence() {
                Some(items) => Json::Array(
                    items
                        .into_iter()
                        .map(ScriptValue::to_json)
                        .collect::<Result<_, _>>()?,
                ),
                None => {
                    let mut object = serde_json::Map::new();
                    for (key, value) in entries {
                        object.insert(key.json_key(), value.to_json()?);
                    }
                    Json::Object(object)
                }
            },
            ScriptValue::Other(type_name) => {
                return Err(format!("cannot encode a {} as JSON", type_name))
            }
        };
        Ok(json)
    }

    fn json_key(&self) -> String {
        match self {
            ScriptValue::Text(text) => text.clone(),
            ScriptValue::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            other => other.to_string(),
        }
    }

    /// Entries of a mapping whose keys are `1..=n`, in order.
    fn as_sequence(&self) -> Option<Vec<&ScriptValue>> {
        let entries = self.as_mapping()?;
        entries
            .iter()
            .enumerate()
            .map(|(index, (key, value))| match key {
                ScriptValue::Number(Number::Integer(i)) if *i == index as i64 + 1 => Some(value),
                _ => None,
            })
            .collect()
    }
}

/// Walks one Lua value, tracking the tables on the current path.
struct Translator {
    path: Vec<*const c_void>,
    remaining: usize,
}

impl Translator {
    fn new(max_entries: usize) -> Self {
        Self {
            path: Vec::new(),
            remaining: max_entries,
        }
    }

    fn translate(
        &mut self,
        value: &Value,
        depth: usize,
    ) -> ScriptValue {
        match value {
            Value::Nil => ScriptValue::Nil,
            Value::Boolean(b) => ScriptValue::Boolean(*b),
            Value::Integer(i) => ScriptValue::Number(Number::Integer(*i)),
            Value::Number(n) => ScriptValue::Number(Number::Float(*n)),
            Value::String(s) => ScriptValue::from_bytes(&s.as_bytes()),
            Value::Table(table) => self.translate_table(table, depth),
            other => ScriptValue::Other(other.type_name().to_string()),
        }
    }

    fn translate_table(
        &mut self,
        table: &Table,
        depth: usize,
    ) -> ScriptValue {
        if depth == 0 || self.remaining == 0 {
            return ScriptValue::Other("table".to_string());
        }
        let pointer = table.to_pointer();
        if self.path.contains(&pointer) {
            return ScriptValue::Other("cycle".to_string());
        }

        self.path.push(pointer);
        let mut entries = Vec::new();
        // Iteration only fails on keys that cannot be read; keep what was seen.
        let _ = table.for_each(|key: Value, value: Value| {
            if self.remaining > 0 {
                self.remaining -= 1;
                let key = self.translate(&key, depth - 1);
                let value = self.translate(&value, depth - 1);
                entries.push((key, value));
            }
            Ok(())
        });
        self.path.pop();

        entries.sort_by(|a, b| compare_keys(&a.0, &b.0));
        ScriptValue::Mapping(entries)
    }
}

/// Numbers first (by value), then text, then everything else by rendering.
fn compare_keys(
    a: &ScriptValue,
    b: &ScriptValue,
) -> Ordering {
    fn rank(value: &ScriptValue) -> u8 {
        match value {
            ScriptValue::Number(_) => 0,
            ScriptValue::Text(_) => 1,
            ScriptValue::Bytes(_) => 2,
            ScriptValue::Boolean(_) => 3,
            _ => 4,
        }
    }

    match (a, b) {
        (ScriptValue::Number(x), ScriptValue::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (ScriptValue::Text(x), ScriptValue::Text(y)) => x.cmp(y),
        (ScriptValue::Bytes(x), ScriptValue::Bytes(y)) => x.cmp(y),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !LUA_KEYWORDS.contains(&key)
}

fn write_quoted(
    f: &mut fmt::Formatter<'_>,
    bytes: &[u8],
) -> fmt::Result {
    f.write_str("\"")?;
    for &byte in bytes {
        match byte {
            b'"' => f.write_str("\\\"")?,
            b'\\' => f.write_str("\\\\")?,
            b'\n' => f.write_str("\\n")?,
            b'\r' => f.write_str("\\r")?,
            b'\t' => f.write_str("\\t")?,
            0x20..=0x7e => write!(f, "{}", byte as char)?,
            _ => write!(f, "\\{}", byte)?,
        }
    }
    f.write_str("\"")
}

fn write_float(
    f: &mut fmt::Formatter<'_>,
    value: f64,
) -> fmt::Result {
    if value.is_nan() {
        f.write_str("nan")
    } else if value.is_infinite() {
        f.write_str(if value > 0.0 { "inf" } else { "-inf" })
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        write!(f, "{:.1}", value)
    } else {
        write!(f, "{}", value)
    }
}

/// The fixed textual pretty-printer.
impl fmt::Display for ScriptValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ScriptValue::Nil => f.write_str("nil"),
            ScriptValue::Boolean(b) => write!(f, "{}", b),
            ScriptValue::Number(Number::Integer(i)) => write!(f, "{}", i),
            ScriptValue::Number(Number::Float(n)) => write_float(f, *n),
            ScriptValue::Text(text) => write_quoted(f, text.as_bytes()),
            ScriptValue::Bytes(bytes) => write_quoted(f, bytes),
            ScriptValue::Other(type_name) => write!(f, "<{}>", type_name),
            ScriptValue::Mapping(entries) if entries.is_empty() => f.write_str("{}"),
            ScriptValue::Mapping(entries) => {
                f.write_str("{")?;
                if let Some(items) = self.as_sequence() {
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", item)?;
                    }
                } else {
                    for (i, (key, value)) in entries.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        match key.as_text() {
                            Some(name) if is_identifier(name) => write!(f, "{} = {}", name, value)?,
                            _ => write!(f, "[{}] = {}", key, value)?,
                        }
                    }
                }
                f.write_str("}")
            }
        }
    }
}
