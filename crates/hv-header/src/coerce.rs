//! Text -> [`TypedValue`] coercion for header fields.
//!
//! Ordering matters: sentinel tokens are matched before any numeric parse so
//! that `nan` / `inf` style text never reaches `str::parse::<f64>` (which would
//! happily accept them) and always maps to the same fixed substitute.

use crate::record::{TypedValue, MAX_TEXT_LEN};

/// Value used for absent fields.
const MISSING_TEXT: &str = "N/A";

/// Immutable table of textual sentinels and their numeric substitutes.
///
/// Tokens are compared against the trimmed, ASCII-lowercased field text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentinelTable {
    /// Tokens that become `Integer(0)`.
    pub zero: &'static [&'static str],
    /// Tokens that become `Float(+infinity_substitute)`.
    pub positive_infinity: &'static [&'static str],
    /// Tokens that become `Float(-infinity_substitute)`.
    pub negative_infinity: &'static [&'static str],
    pub infinity_substitute: f64,
}

impl SentinelTable {
    pub const HELIOVIEWER: SentinelTable = SentinelTable {
        zero: &["nan", "null", "n/a", ""],
        positive_infinity: &["inf", "+inf"],
        negative_infinity: &["-inf"],
        infinity_substitute: 1.0e9,
    };

    fn lookup(&self, lowered: &str) -> Option<TypedValue> {
        if self.zero.contains(&lowered) {
            return Some(TypedValue::Integer(0));
        }
        if self.positive_infinity.contains(&lowered) {
            return Some(TypedValue::Float(self.infinity_substitute));
        }
        if self.negative_infinity.contains(&lowered) {
            return Some(TypedValue::Float(-self.infinity_substitute));
        }
        None
    }
}

impl Default for SentinelTable {
    fn default() -> Self {
        SentinelTable::HELIOVIEWER
    }
}

/// Converts a single field's text into a FITS-storable scalar.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValueCoercer {
    sentinels: SentinelTable,
}

impl ValueCoercer {
    pub fn new(sentinels: SentinelTable) -> Self {
        Self { sentinels }
    }

    pub fn sentinels(&self) -> &SentinelTable {
        &self.sentinels
    }

    pub fn coerce(&self, raw: Option<&str>) -> TypedValue {
        let Some(raw) = raw else {
            return TypedValue::Text(MISSING_TEXT.to_string());
        };

        let s = raw.trim();
        if let Some(v) = self.sentinels.lookup(&s.to_ascii_lowercase()) {
            return v;
        }

        if s.contains('.') || s.contains('e') || s.contains('E') {
            if let Ok(f) = s.parse::<f64>() {
                return TypedValue::Float(self.finite_or_substitute(f));
            }
        } else if let Ok(i) = s.parse::<i64>() {
            return TypedValue::Integer(i);
        }

        TypedValue::Text(sanitize_text(s))
    }

    // Overflowing literals such as `1e400` parse to infinity; clamp them to
    // the same substitute the textual sentinels use.
    fn finite_or_substitute(&self, f: f64) -> f64 {
        if f.is_finite() {
            f
        } else if f.is_sign_negative() {
            -self.sentinels.infinity_substitute
        } else {
            self.sentinels.infinity_substitute
        }
    }
}

/// Coerce with the default Helioviewer sentinel table.
pub fn coerce(raw: Option<&str>) -> TypedValue {
    ValueCoercer::default().coerce(raw)
}

/// Make text card-safe: newlines -> spaces, trimmed, ASCII only, at most
/// [`MAX_TEXT_LEN`] bytes.
pub fn sanitize_text(raw: &str) -> String {
    let flattened = raw.replace(['\n', '\r'], " ");
    let mut out: String = flattened.trim().chars().filter(|c| c.is_ascii()).collect();
    out.truncate(MAX_TEXT_LEN);
    out
}
