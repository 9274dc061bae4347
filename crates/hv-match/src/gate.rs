//! Temporal-proximity acceptance.
//!
//! The two timestamp sources use different text formats:
//! - requested dates: `YYYY-MM-DDTHH:MM:SSZ`
//! - resolver dates:  `YYYY-MM-DD HH:MM:SS` (implicitly UTC)
//!
//! Both are parsed to `DateTime<Utc>` at whole-second resolution.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};

pub const REQUESTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
pub const OBSERVED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why a requested date produced no accepted match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionKind {
    /// The resolver found no observation for the date/source pair.
    NoMatch,
    BadRequestedFormat { raw: String },
    BadObservedFormat { raw: String },
    /// `|observed - requested|` exceeded the tolerance.
    OutOfTolerance { delta_seconds: i64 },
}

impl RejectionKind {
    /// Stable snake-case code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            RejectionKind::NoMatch => "no_closest",
            RejectionKind::BadRequestedFormat { .. } => "bad_requested_date_format",
            RejectionKind::BadObservedFormat { .. } => "bad_closest_date_format",
            RejectionKind::OutOfTolerance { .. } => "closest_out_of_range",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionKind::NoMatch => write!(f, "no closest image"),
            RejectionKind::BadRequestedFormat { raw } => {
                write!(f, "requested date '{raw}' is not YYYY-MM-DDTHH:MM:SSZ")
            }
            RejectionKind::BadObservedFormat { raw } => {
                write!(f, "closest date '{raw}' is not YYYY-MM-DD HH:MM:SS")
            }
            RejectionKind::OutOfTolerance { delta_seconds } => {
                write!(f, "closest image is {delta_seconds}s away")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tolerance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToleranceError {
    Negative(f64),
    NotFinite,
}

impl fmt::Display for ToleranceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToleranceError::Negative(v) => write!(f, "tolerance must be >= 0, got {v}"),
            ToleranceError::NotFinite => write!(f, "tolerance must be finite"),
        }
    }
}

impl std::error::Error for ToleranceError {}

/// Maximum allowed `|observed - requested|`, in seconds. Non-negative, finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tolerance(f64);

impl Tolerance {
    pub fn from_secs(secs: f64) -> Result<Self, ToleranceError> {
        if !secs.is_finite() {
            return Err(ToleranceError::NotFinite);
        }
        if secs < 0.0 {
            return Err(ToleranceError::Negative(secs));
        }
        Ok(Tolerance(secs))
    }

    pub fn as_secs(&self) -> f64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

// Shape templates: `d` is one ASCII digit, anything else must match literally.
const REQUESTED_SHAPE: &[u8] = b"dddd-dd-ddTdd:dd:ddZ";
const DATE_SHAPE: &[u8] = b"dddd-dd-dd";
const TIME_SHAPE: &[u8] = b"dd:dd:dd";

pub fn parse_requested(s: &str) -> Result<DateTime<Utc>, RejectionKind> {
    let bad = || RejectionKind::BadRequestedFormat { raw: s.to_string() };
    if !has_shape(s, REQUESTED_SHAPE) {
        return Err(bad());
    }
    parse_utc(s, REQUESTED_FORMAT).ok_or_else(bad)
}

/// Date and time fields may be separated by any run of whitespace.
pub fn parse_observed(s: &str) -> Result<DateTime<Utc>, RejectionKind> {
    let bad = || RejectionKind::BadObservedFormat { raw: s.to_string() };
    let (Some(date), Some(rest)) = (s.get(..DATE_SHAPE.len()), s.get(DATE_SHAPE.len()..)) else {
        return Err(bad());
    };
    let time = rest.trim_start();
    if time.len() == rest.len() || !has_shape(date, DATE_SHAPE) || !has_shape(time, TIME_SHAPE) {
        return Err(bad());
    }
    parse_utc(&format!("{date} {time}"), OBSERVED_FORMAT).ok_or_else(bad)
}

fn has_shape(s: &str, shape: &[u8]) -> bool {
    s.len() == shape.len()
        && s.bytes().zip(shape).all(|(c, &want)| match want {
            b'd' => c.is_ascii_digit(),
            lit => c == lit,
        })
}

/// Leap seconds (`:60`) parse with a nanosecond overflow in chrono; refuse them.
fn parse_utc(s: &str, fmt: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, fmt)
        .ok()
        .filter(|naive| naive.nanosecond() == 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Accept iff no tolerance is set or `|observed - requested| <= tolerance`.
pub fn accept(
    requested: DateTime<Utc>,
    observed: DateTime<Utc>,
    tolerance: Option<Tolerance>,
) -> Result<(), RejectionKind> {
    let Some(tol) = tolerance else {
        return Ok(());
    };
    let delta_seconds = (observed - requested).num_seconds().abs();
    if delta_seconds as f64 <= tol.as_secs() {
        Ok(())
    } else {
        Err(RejectionKind::OutOfTolerance { delta_seconds })
    }
}

/// [`accept`] with a tolerance bound at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProximityGate {
    tolerance: Option<Tolerance>,
}

impl ProximityGate {
    pub fn new(tolerance: Option<Tolerance>) -> Self {
        Self { tolerance }
    }

    /// Gate that accepts any distance.
    pub fn unbounded() -> Self {
        Self { tolerance: None }
    }

    pub fn tolerance(&self) -> Option<Tolerance> {
        self.tolerance
    }

    pub fn check(
        &self,
        requested: DateTime<Utc>,
        observed: DateTime<Utc>,
    ) -> Result<(), RejectionKind> {
        accept(requested, observed, self.tolerance)
    }
}
