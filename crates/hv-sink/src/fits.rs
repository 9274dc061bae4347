//! Minimal FITS writer: empty primary HDU + one `IMAGE` extension.
//!
//! Layout:
//! - primary HDU: `SIMPLE`, `BITPIX = 8`, `NAXIS = 0`, `EXTEND`, `END`
//! - image HDU `JP2_IMAGE`: structural cards, then the header record in
//!   record order, then big-endian pixel data
//!
//! Headers are 80-column ASCII cards padded to 2880-byte blocks with spaces;
//! data is padded to 2880 bytes with zeros. 16-bit pixels are stored as
//! signed `BITPIX = 16` with `BZERO = 32768`.

use std::path::{Path, PathBuf};

use hv_header::{HeaderRecord, TypedValue};

use crate::pixels::{PixelBuffer, PixelData};
use crate::{write_artifact, HeaderSink, WriteError};

const BLOCK: usize = 2880;
const CARD: usize = 80;
pub const EXTNAME: &str = "JP2_IMAGE";

/// Keywords the writer owns; record entries with these names are skipped.
const STRUCTURAL: &[&str] = &[
    "SIMPLE", "BITPIX", "NAXIS", "EXTEND", "XTENSION", "PCOUNT", "GCOUNT", "EXTNAME", "BZERO",
    "BSCALE", "END",
];

const COMMENTARY: &[&str] = &["COMMENT", "HISTORY"];

#[derive(Debug, Clone)]
pub struct FitsWriter {
    path: PathBuf,
}

impl FitsWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HeaderSink for FitsWriter {
    fn write(&self, record: &HeaderRecord, pixels: &PixelBuffer) -> Result<PathBuf, WriteError> {
        let bytes = encode(record, pixels);
        write_artifact(&self.path, &bytes)
    }
}

/// Serialize a complete two-HDU FITS file.
pub fn encode(record: &HeaderRecord, pixels: &PixelBuffer) -> Vec<u8> {
    let mut out = Vec::new();

    let mut primary = Vec::new();
    primary.push(value_card("SIMPLE", &logical(true)));
    primary.push(value_card("BITPIX", &integer(8)));
    primary.push(value_card("NAXIS", &integer(0)));
    primary.push(value_card("EXTEND", &logical(true)));
    push_header(&mut out, &primary);

    let bitpix = match pixels.data() {
        PixelData::Gray8(_) => 8,
        PixelData::Gray16(_) => 16,
    };
    let mut ext = vec![
        value_card("XTENSION", &string("IMAGE")),
        value_card("BITPIX", &integer(bitpix)),
        value_card("NAXIS", &integer(2)),
        value_card("NAXIS1", &integer(pixels.width() as i64)),
        value_card("NAXIS2", &integer(pixels.height() as i64)),
        value_card("PCOUNT", &integer(0)),
        value_card("GCOUNT", &integer(1)),
    ];
    if bitpix == 16 {
        ext.push(value_card("BZERO", &integer(32768)));
        ext.push(value_card("BSCALE", &integer(1)));
    }
    ext.push(value_card("EXTNAME", &string(EXTNAME)));

    let mut skipped = 0usize;
    for (key, value) in record.iter() {
        match record_card(key, value) {
            Some(card) => ext.push(card),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "fits: record keys not written as cards");
    }
    push_header(&mut out, &ext);

    push_data(&mut out, pixels.data());
    out
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

fn record_card(key: &str, value: &TypedValue) -> Option<String> {
    if is_structural(key) {
        return None;
    }
    if !is_fits_keyword(key) {
        tracing::warn!(key, "fits: key is not a valid keyword, skipped");
        return None;
    }
    if COMMENTARY.contains(&key) {
        return Some(commentary_card(key, &value.to_string()));
    }
    let rendered = match value {
        TypedValue::Integer(i) => integer(*i),
        TypedValue::Float(f) => float(*f),
        TypedValue::Text(s) => string(s),
        TypedValue::Logical(b) => logical(*b),
    };
    Some(value_card(key, &rendered))
}

fn is_structural(key: &str) -> bool {
    STRUCTURAL.contains(&key)
        || key
            .strip_prefix("NAXIS")
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

fn is_fits_keyword(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 8
        && key
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

fn value_card(key: &str, rendered: &str) -> String {
    pad_card(format!("{key:<8}= {rendered}"))
}

fn commentary_card(key: &str, text: &str) -> String {
    pad_card(format!("{key:<8}{}", printable(text)))
}

fn pad_card(mut card: String) -> String {
    card.truncate(CARD);
    while card.len() < CARD {
        card.push(' ');
    }
    card
}

fn integer(i: i64) -> String {
    format!("{i:>20}")
}

fn logical(b: bool) -> String {
    format!("{:>20}", if b { "T" } else { "F" })
}

/// FITS real: always has a decimal point, exponent marker `E`.
fn float(f: f64) -> String {
    let mut s = format!("{f:?}").replace('e', "E");
    if !s.contains('.') {
        match s.find('E') {
            Some(pos) => s.insert_str(pos, ".0"),
            None => s.push_str(".0"),
        }
    }
    format!("{s:>20}")
}

/// Quoted string, `'` doubled, padded to 8 chars, fitting in columns 11..=80.
fn string(s: &str) -> String {
    let mut body = String::new();
    for c in printable(s).chars() {
        let piece = if c == '\'' { "''" } else { "" };
        let add = if piece.is_empty() { 1 } else { 2 };
        if body.len() + add > CARD - 12 {
            break;
        }
        if piece.is_empty() {
            body.push(c);
        } else {
            body.push_str(piece);
        }
    }
    format!("'{body:<8}'")
}

fn printable(s: &str) -> String {
    s.chars()
        .map(|c| if (' '..='~').contains(&c) { c } else { ' ' })
        .collect()
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

fn push_header(out: &mut Vec<u8>, cards: &[String]) {
    let start = out.len();
    for c in cards {
        out.extend_from_slice(c.as_bytes());
    }
    out.extend_from_slice(pad_card("END".to_string()).as_bytes());
    let used = out.len() - start;
    out.resize(out.len() + padding(used), b' ');
}

fn push_data(out: &mut Vec<u8>, data: &PixelData) {
    let start = out.len();
    match data {
        PixelData::Gray8(v) => out.extend_from_slice(v),
        PixelData::Gray16(v) => {
            for &px in v {
                let signed = (i32::from(px) - 32768) as i16;
                out.extend_from_slice(&signed.to_be_bytes());
            }
        }
    }
    let used = out.len() - start;
    out.resize(out.len() + padding(used), 0);
}

fn padding(used: usize) -> usize {
    (BLOCK - used % BLOCK) % BLOCK
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(bytes: &[u8]) -> Vec<String> {
        bytes
            .chunks(CARD)
            .map(|c| String::from_utf8(c.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn float_rendering_always_has_point() {
        assert_eq!(float(3.14).trim(), "3.14");
        assert_eq!(float(1.0e9).trim(), "1000000000.0");
        assert_eq!(float(1e-7).trim(), "1.0E-7");
        assert_eq!(float(-2.5e300).trim(), "-2.5E300");
    }

    #[test]
    fn string_quotes_are_doubled_and_bounded() {
        assert_eq!(string("SDO"), "'SDO     '");
        assert_eq!(string("it's"), "'it''s   '");
        let long = "'".repeat(68);
        let s = string(&long);
        assert!(s.len() <= CARD - 10);
        // doubled quotes are never split
        assert_eq!((s.len() - 2) % 2, 0);
    }

    #[test]
    fn value_card_is_80_columns() {
        let c = value_card("NAXIS1", &integer(4096));
        assert_eq!(c.len(), 80);
        assert!(c.starts_with("NAXIS1  =                 4096"));
    }

    #[test]
    fn structural_and_invalid_keys_are_skipped() {
        assert!(record_card("NAXIS1", &TypedValue::Integer(1)).is_none());
        assert!(record_card("SIMPLE", &TypedValue::Integer(1)).is_none());
        assert!(record_card("{U}K", &TypedValue::Integer(1)).is_none());
        assert!(record_card("NAXISX", &TypedValue::Integer(1)).is_some());
        assert!(record_card("DATE-OBS", &TypedValue::Text("x".into())).is_some());
    }

    #[test]
    fn history_is_commentary() {
        let c = record_card("HISTORY", &TypedValue::Text("rotated".into())).unwrap();
        assert!(c.starts_with("HISTORY rotated"));
    }

    #[test]
    fn encode_produces_block_aligned_two_hdu_file() {
        let mut rec = HeaderRecord::new();
        rec.set_flag("FLIPUD", true).unwrap();
        let px = PixelBuffer::new(2, 2, PixelData::Gray16(vec![0, 1, 32768, 65535])).unwrap();
        let bytes = encode(&rec, &px);

        assert_eq!(bytes.len() % BLOCK, 0);
        let all = cards(&bytes[..2 * BLOCK]);
        assert!(all[0].starts_with("SIMPLE  =                    T"));
        assert!(all[4].starts_with("END "));
        let ext = &all[36..];
        assert!(ext[0].starts_with("XTENSION= 'IMAGE   '"));
        assert!(ext.iter().any(|c| c.starts_with("BZERO   =                32768")));
        assert!(ext.iter().any(|c| c.starts_with("EXTNAME = 'JP2_IMAGE'")));
        assert!(ext.iter().any(|c| c.starts_with("FLIPUD  =                    T")));

        let data = &bytes[2 * BLOCK..2 * BLOCK + 8];
        assert_eq!(data, &[0x80, 0x00, 0x80, 0x01, 0x00, 0x00, 0x7F, 0xFF]);
    }
}
