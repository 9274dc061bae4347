//! Output file names.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

const STEM_FORMAT: &str = "%Y-%m-%d_%H%M%SZ";

/// File-name-safe form of a display name. Never empty.
pub fn slug(name: &str) -> String {
    let mapped: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = mapped.trim_matches('_');
    if trimmed.is_empty() {
        "source".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `2014-01-01 12:00:04` -> `2014-01-01_120004Z`.
pub fn time_stem(t: DateTime<Utc>) -> String {
    t.format(STEM_FORMAT).to_string()
}

/// `helioviewer_{observed stem}_{slug(name)}.fits`; a missing name becomes `source{id}`.
pub fn fits_file_name(
    observed: DateTime<Utc>,
    display_name: Option<&str>,
    source_id: i64,
) -> String {
    let name = match display_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => slug(n),
        None => slug(&format!("source{source_id}")),
    };
    format!("helioviewer_{}_{name}.fits", time_stem(observed))
}

pub fn header_txt_name(image_id: i64) -> String {
    format!("helioviewer_{image_id}.xml.txt")
}

/// `png/{YYYY-MM-DD}/helioviewer_{requested stem}_source_{id}.png`, relative to the output root.
pub fn png_relative_path(requested: DateTime<Utc>, source_id: i64) -> PathBuf {
    PathBuf::from("png")
        .join(requested.format("%Y-%m-%d").to_string())
        .join(format!(
            "helioviewer_{}_source_{source_id}.png",
            time_stem(requested)
        ))
}
