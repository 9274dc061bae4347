//! hv-sink
//!
//! Artifact writers for the heliofits tools:
//! - [`fits::FitsWriter`]: header record + grayscale pixels -> FITS file
//! - [`pixels`]: JPEG 2000 / PNG decoding into a grayscale [`PixelBuffer`]
//! - [`naming`]: deterministic output file names
//! - [`failed_log::FailedLog`]: tab-separated skip/failure log
//!
//! Writers never decide *whether* to write; callers gate on match outcomes.

pub mod failed_log;
pub mod fits;
pub mod naming;
pub mod pixels;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use hv_header::HeaderRecord;

pub use failed_log::FailedLog;
pub use fits::FitsWriter;
pub use pixels::{decode_jp2_gray, decode_png_gray, PixelBuffer, PixelData};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum WriteError {
    Io { path: PathBuf, message: String },
    /// Pixel buffer dimensions do not match its data.
    Pixels(String),
    /// Raster payload could not be decoded.
    Decode(String),
}

impl WriteError {
    pub(crate) fn io(path: &Path, e: std::io::Error) -> Self {
        WriteError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::Io { path, message } => {
                write!(f, "write failed for {}: {message}", path.display())
            }
            WriteError::Pixels(msg) => write!(f, "invalid pixel buffer: {msg}"),
            WriteError::Decode(msg) => write!(f, "raster decode error: {msg}"),
        }
    }
}

impl std::error::Error for WriteError {}

// ---------------------------------------------------------------------------
// Sink trait
// ---------------------------------------------------------------------------

/// Destination for a transcoded header plus its pixels.
pub trait HeaderSink {
    fn write(&self, record: &HeaderRecord, pixels: &PixelBuffer) -> Result<PathBuf, WriteError>;
}

/// Write `bytes` to `path`, creating parent directories. Overwrites.
pub fn write_artifact(path: &Path, bytes: &[u8]) -> Result<PathBuf, WriteError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| WriteError::io(parent, e))?;
        }
    }
    fs::write(path, bytes).map_err(|e| WriteError::io(path, e))?;
    Ok(path.to_path_buf())
}
