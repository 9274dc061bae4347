//! XML header document -> [`HeaderRecord`].
//!
//! Every element is visited in document order (pre-order, root included).
//! Its tag becomes a candidate key (uppercased, trimmed, ASCII only, first 8
//! chars) and its leading text is coerced with [`ValueCoercer`].
//!
//! Collisions are resolved by replacing the 8th char with a digit `0`..=`9`,
//! first free slot wins. When all ten slots are taken the element is dropped;
//! drops are reported in [`TranscodeReport::dropped`] and logged by
//! [`transcode`].

use std::fmt;

use roxmltree::{Document, Node, ParsingOptions};

use crate::coerce::ValueCoercer;
use crate::record::{HeaderRecord, MAX_KEY_LEN};

/// Number of digit-suffixed variants probed on a key collision.
const COLLISION_SLOTS: u8 = 10;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// The input is not well-formed XML. No partial record is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "header markup parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<roxmltree::Error> for ParseError {
    fn from(e: roxmltree::Error) -> Self {
        ParseError {
            message: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The candidate key and all ten digit-suffixed variants were taken.
    CollisionSlotsExhausted,
    /// The tag had no ASCII characters left after normalization.
    EmptyKey,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::CollisionSlotsExhausted => "collision_slots_exhausted",
            DropReason::EmptyKey => "empty_key",
        }
    }
}

/// An element that contributed no key to the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedField {
    /// Tag as written in the document (namespace in `{uri}local` form).
    pub tag: String,
    pub candidate_key: String,
    pub reason: DropReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeReport {
    pub record: HeaderRecord,
    /// Elements visited (root included).
    pub elements_seen: usize,
    pub dropped: Vec<DroppedField>,
}

// ---------------------------------------------------------------------------
// Transcoder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderTranscoder {
    coercer: ValueCoercer,
}

impl HeaderTranscoder {
    pub fn new(coercer: ValueCoercer) -> Self {
        Self { coercer }
    }

    pub fn transcode_with_report(&self, xml_text: &str) -> Result<TranscodeReport, ParseError> {
        let opts = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(xml_text, opts)?;

        let mut record = HeaderRecord::new();
        let mut dropped = Vec::new();
        let mut elements_seen = 0usize;

        for node in doc.root_element().descendants().filter(Node::is_element) {
            elements_seen += 1;

            let tag = qualified_tag(&node);
            let candidate = candidate_key(&tag);
            if candidate.is_empty() {
                dropped.push(DroppedField {
                    tag,
                    candidate_key: candidate,
                    reason: DropReason::EmptyKey,
                });
                continue;
            }

            let value = self.coercer.coerce(leading_text(&node).as_deref());

            match free_key(&record, &candidate) {
                Some(key) => {
                    record.insert_new(key, value);
                }
                None => dropped.push(DroppedField {
                    tag,
                    candidate_key: candidate,
                    reason: DropReason::CollisionSlotsExhausted,
                }),
            }
        }

        Ok(TranscodeReport {
            record,
            elements_seen,
            dropped,
        })
    }

    /// Transcode and log every dropped element at `warn`.
    pub fn transcode(&self, xml_text: &str) -> Result<HeaderRecord, ParseError> {
        let report = self.transcode_with_report(xml_text)?;
        for d in &report.dropped {
            tracing::warn!(
                tag = %d.tag,
                candidate_key = %d.candidate_key,
                reason = d.reason.as_str(),
                "header field dropped"
            );
        }
        if !report.dropped.is_empty() {
            tracing::warn!(
                dropped = report.dropped.len(),
                elements = report.elements_seen,
                kept = report.record.len(),
                "header transcode lost fields"
            );
        }
        Ok(report.record)
    }
}

/// Transcode with the default Helioviewer sentinel table.
pub fn transcode(xml_text: &str) -> Result<HeaderRecord, ParseError> {
    HeaderTranscoder::default().transcode(xml_text)
}

pub fn transcode_with_report(xml_text: &str) -> Result<TranscodeReport, ParseError> {
    HeaderTranscoder::default().transcode_with_report(xml_text)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Text before the first child element. Comments and processing
/// instructions in between are skipped, so the text around them joins up.
fn leading_text(node: &Node<'_, '_>) -> Option<String> {
    let mut text: Option<String> = None;
    for child in node.children() {
        if child.is_element() {
            break;
        }
        if let Some(t) = child.text().filter(|_| child.is_text()) {
            text.get_or_insert_with(String::new).push_str(t);
        }
    }
    text
}

fn qualified_tag(node: &Node<'_, '_>) -> String {
    let name = node.tag_name();
    match name.namespace() {
        Some(ns) => format!("{{{}}}{}", ns, name.name()),
        None => name.name().to_string(),
    }
}

fn candidate_key(tag: &str) -> String {
    tag.to_uppercase()
        .trim()
        .chars()
        .filter(|c| c.is_ascii())
        .take(MAX_KEY_LEN)
        .collect()
}

/// First key not yet in `record`: the candidate itself, else `base7 + digit`.
fn free_key(record: &HeaderRecord, candidate: &str) -> Option<String> {
    if !record.contains_key(candidate) {
        return Some(candidate.to_string());
    }
    // candidate is ASCII, so byte slicing is char slicing
    let base = &candidate[..candidate.len().min(MAX_KEY_LEN - 1)];
    (0..COLLISION_SLOTS)
        .map(|d| format!("{base}{d}"))
        .find(|k| !record.contains_key(k))
}
