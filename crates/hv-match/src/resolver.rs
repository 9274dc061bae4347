//! Resolver boundary: "which observation is closest to this date?".
//!
//! Only the trait and its data types live here. The HTTP implementation is in
//! `hv-api`.

use std::fmt;

/// The resolver's answer for a date/source pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosestImage {
    pub id: i64,
    /// Observation time as reported upstream, `YYYY-MM-DD HH:MM:SS` (UTC).
    /// Kept verbatim; validated by the gate.
    pub date: String,
    /// Display name of the source (e.g. `"HMI Int"`), when provided.
    pub name: Option<String>,
}

/// Failures that prevent the resolver from answering at all.
///
/// "Nothing found" is not an error; it is `Ok(None)`.
#[derive(Debug)]
pub enum ResolverError {
    /// Network or transport failure.
    Transport(String),
    /// A response payload could not be decoded.
    Decode(String),
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverError::Transport(msg) => write!(f, "transport error: {msg}"),
            ResolverError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for ResolverError {}

/// Closest-observation lookup.
///
/// Object safe and `Send + Sync` so callers can share one resolver across
/// tasks as `Arc<dyn ClosestImageResolver>`.
#[async_trait::async_trait]
pub trait ClosestImageResolver: Send + Sync {
    fn name(&self) -> &'static str;

    async fn closest(
        &self,
        date: &str,
        source_id: i64,
    ) -> Result<Option<ClosestImage>, ResolverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_error_display() {
        let err = ResolverError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "transport error: connection refused");
        let err = ResolverError::Decode("expected value".to_string());
        assert_eq!(err.to_string(), "decode error: expected value");
    }
}
