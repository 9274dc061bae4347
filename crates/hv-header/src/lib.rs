//! hv-header
//!
//! Header transcoding for Helioviewer JP2 metadata.
//!
//! Converts the XML header document served by `getJP2Header` into a flat,
//! ordered [`HeaderRecord`] whose shape is storable as FITS cards:
//! - keys are unique, uppercase ASCII, at most 8 characters
//! - values are integers, finite floats, or ASCII text of at most 68 bytes
//!
//! Pure logic. No IO, no network; the only side effect is `tracing` output
//! for fields that could not be assigned a key.

pub mod coerce;
pub mod record;
pub mod transcode;

pub use coerce::{coerce, sanitize_text, SentinelTable, ValueCoercer};
pub use record::{HeaderRecord, RecordError, TypedValue, MAX_KEY_LEN, MAX_TEXT_LEN};
pub use transcode::{
    transcode, transcode_with_report, DropReason, DroppedField, HeaderTranscoder, ParseError,
    TranscodeReport,
};
