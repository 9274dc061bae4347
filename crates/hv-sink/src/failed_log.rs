//! Append-only log of dates that produced no artifact.
//!
//! One tab-separated line per date:
//! `{date}\tsourceId={id}\t{TAG}[\t{detail}]`

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::WriteError;

pub const TAG_NO_CLOSEST: &str = "FAIL:no_closest";
pub const TAG_BAD_REQUESTED_DATE: &str = "FAIL:bad_requested_date_format";
pub const TAG_BAD_CLOSEST_DATE: &str = "FAIL:bad_closest_date_format";
pub const TAG_OUT_OF_RANGE: &str = "SKIP:closest_out_of_range";
pub const TAG_DOWNLOAD: &str = "FAIL:download";
pub const TAG_EXCEPTION: &str = "FAIL:exception";

/// Disabled when constructed without a path; every append is then a no-op.
#[derive(Debug, Default)]
pub struct FailedLog {
    path: Option<PathBuf>,
    // serializes appends from concurrent per-date tasks
    lock: Mutex<()>,
}

impl FailedLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn append(
        &self,
        date: &str,
        source_id: i64,
        tag: &str,
        detail: Option<&str>,
    ) -> Result<(), WriteError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let line = format_line(date, source_id, tag, detail);

        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| WriteError::io(parent, e))?;
            }
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| WriteError::io(path, e))?;
        writeln!(f, "{line}").map_err(|e| WriteError::io(path, e))
    }
}

pub fn format_line(date: &str, source_id: i64, tag: &str, detail: Option<&str>) -> String {
    let mut line = format!("{date}\tsourceId={source_id}\t{tag}");
    if let Some(d) = detail.map(|d| d.replace(['\n', '\r'], " ")) {
        if !d.trim().is_empty() {
            line.push('\t');
            line.push_str(d.trim_end());
        }
    }
    line
}
