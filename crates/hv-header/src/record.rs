//! Typed header values and the ordered record they live in.

use std::collections::HashSet;
use std::fmt;

/// Maximum keyword length of a FITS card.
pub const MAX_KEY_LEN: usize = 8;

/// Maximum length (bytes) of a FITS string value.
pub const MAX_TEXT_LEN: usize = 68;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A scalar that can be stored in a single FITS card.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Integer(i64),
    /// Always finite.
    Float(f64),
    /// Pure ASCII, no `\n` / `\r`, at most [`MAX_TEXT_LEN`] bytes.
    Text(String),
    /// Only produced by callers (e.g. the synthetic `FLIPUD` flag); the
    /// transcoder never emits it.
    Logical(bool),
}

impl TypedValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TypedValue::Integer(_) => "integer",
            TypedValue::Float(_) => "float",
            TypedValue::Text(_) => "text",
            TypedValue::Logical(_) => "logical",
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Integer(v) => write!(f, "{v}"),
            TypedValue::Float(v) => write!(f, "{v:?}"),
            TypedValue::Text(s) => write!(f, "{s}"),
            TypedValue::Logical(b) => write!(f, "{}", if *b { "T" } else { "F" }),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by caller-side record mutation ([`HeaderRecord::set_flag`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Key is empty, longer than 8 chars, or not uppercase ASCII.
    InvalidKey(String),
    /// Key already present in the record.
    DuplicateKey(String),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::InvalidKey(k) => write!(f, "invalid header key '{k}'"),
            RecordError::DuplicateKey(k) => write!(f, "header key '{k}' already present"),
        }
    }
}

impl std::error::Error for RecordError {}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Ordered key -> value mapping. Insertion order is serialization order.
///
/// Keys are unique by construction. Only the transcoder inserts through
/// [`HeaderRecord::insert_new`]; callers may append a logical flag via
/// [`HeaderRecord::set_flag`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderRecord {
    entries: Vec<(String, TypedValue)>,
    index: HashSet<String>,
}

impl HeaderRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains(key)
    }

    pub fn get(&self, key: &str) -> Option<&TypedValue> {
        if !self.index.contains(key) {
            return None;
        }
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Insert only if `key` is absent. Returns `false` (and leaves the record
    /// untouched) on collision.
    pub(crate) fn insert_new(&mut self, key: String, value: TypedValue) -> bool {
        if self.index.contains(&key) {
            return false;
        }
        self.index.insert(key.clone());
        self.entries.push((key, value));
        true
    }

    /// Append a caller-side logical flag such as `FLIPUD`.
    pub fn set_flag(&mut self, key: &str, value: bool) -> Result<(), RecordError> {
        if !is_valid_key(key) {
            return Err(RecordError::InvalidKey(key.to_string()));
        }
        if !self.insert_new(key.to_string(), TypedValue::Logical(value)) {
            return Err(RecordError::DuplicateKey(key.to_string()));
        }
        Ok(())
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_graphic() && !c.is_ascii_lowercase())
}
