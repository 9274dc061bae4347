//! Helioviewer `sourceId` catalog for the commonly used instruments.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    /// Stable lookup name, e.g. `SDO_AIA_171`.
    pub key: &'static str,
    pub source_id: i64,
    /// Helioviewer nickname, e.g. `AIA 171`.
    pub nickname: &'static str,
}

const fn src(key: &'static str, source_id: i64, nickname: &'static str) -> SourceInfo {
    SourceInfo {
        key,
        source_id,
        nickname,
    }
}

pub const SOURCES: &[SourceInfo] = &[
    src("SOHO_EIT_171", 0, "EIT 171"),
    src("SOHO_EIT_195", 1, "EIT 195"),
    src("SOHO_EIT_284", 2, "EIT 284"),
    src("SOHO_EIT_304", 3, "EIT 304"),
    src("SOHO_LASCO_C2", 4, "LASCO C2"),
    src("SOHO_LASCO_C3", 5, "LASCO C3"),
    src("SOHO_MDI_magnetogram", 6, "MDI Mag"),
    src("SOHO_MDI_continuum", 7, "MDI Int"),
    src("SDO_AIA_94", 8, "AIA 94"),
    src("SDO_AIA_131", 9, "AIA 131"),
    src("SDO_AIA_171", 10, "AIA 171"),
    src("SDO_AIA_193", 11, "AIA 193"),
    src("SDO_AIA_211", 12, "AIA 211"),
    src("SDO_AIA_304", 13, "AIA 304"),
    src("SDO_AIA_335", 14, "AIA 335"),
    src("SDO_AIA_1600", 15, "AIA 1600"),
    src("SDO_AIA_1700", 16, "AIA 1700"),
    src("SDO_AIA_4500", 17, "AIA 4500"),
    src("SDO_HMI_continuum", 18, "HMI Int"),
    src("SDO_HMI_magnetogram", 19, "HMI Mag"),
];

/// Case-insensitive lookup by catalog key.
pub fn source_by_name(name: &str) -> Option<&'static SourceInfo> {
    let name = name.trim();
    SOURCES.iter().find(|s| s.key.eq_ignore_ascii_case(name))
}

pub fn source_by_id(source_id: i64) -> Option<&'static SourceInfo> {
    SOURCES.iter().find(|s| s.source_id == source_id)
}
