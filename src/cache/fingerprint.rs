//! Argument fingerprinting for memoized calls
//!
//! A fingerprint is the SHA-256 digest of a canonical text rendering of
//! the call arguments. The rendering is the layout produced by Python's
//! `json.dumps(..., sort_keys=True)`: `", "` between items, `": "` between
//! keys and values, object keys sorted, and every non-ASCII character
//! escaped as `\uXXXX`. The text is therefore pure ASCII and hashes to the
//! same value on every platform.
//!
//! Numbers render through serde_json's `Display`: integers verbatim and
//! floats in shortest round-trip form (`1.5`, `1e20`).

use super::faithful;
use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt::{self, Write};

/// Stable identity of a set of call arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already-computed identifier (used by custom key functions)
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Hex-encode a raw digest
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the fingerprint of positional and named arguments
pub fn derive(positional: &[Value], named: &Map<String, Value>) -> Fingerprint {
    let text = canonical_text(positional, named);
    let digest = Sha256::digest(text.as_bytes());
    Fingerprint::from_digest(&digest)
}

/// Render arguments as the canonical text that gets hashed
pub fn canonical_text(positional: &[Value], named: &Map<String, Value>) -> String {
    let mut out = String::new();
    write_array(&mut out, positional);
    write_object(&mut out, named);
    out
}

/// Convert a value into its key representation
///
/// Fails when the value has no unambiguous JSON form: a map keyed by
/// tuples, a NaN or infinite float, `Some(None)`, or a type whose
/// `Serialize` impl refuses.
pub fn to_key_value<T: Serialize + ?Sized>(value: &T) -> CacheResult<Value> {
    faithful::ensure_faithful(value).map_err(|e| CacheError::Derivation(e.to_string()))?;
    serde_json::to_value(value).map_err(|e| CacheError::Derivation(e.to_string()))
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => {
            let _ = write!(out, "{}", n);
        }
        Value::String(s) => write_string(out, s),
        Value::Array(items) => write_array(out, items),
        Value::Object(map) => write_object(out, map),
    }
}

fn write_array(out: &mut String, items: &[Value]) {
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_value(out, item);
    }
    out.push(']');
}

fn write_object(out: &mut String, map: &Map<String, Value>) {
    // Sorted here rather than relying on Map ordering, which changes under
    // serde_json's preserve_order feature
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_string(out, key);
        out.push_str(": ");
        write_value(out, value);
    }
    out.push('}');
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if c.is_ascii() && c >= ' ' => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{:04x}", unit);
                }
            }
        }
    }
    out.push('"');
}
