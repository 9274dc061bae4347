//! Per-date match pipeline: resolve -> parse -> gate.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::gate::{parse_observed, parse_requested, ProximityGate, RejectionKind, Tolerance};
use crate::resolver::{ClosestImageResolver, ResolverError};

/// An observation accepted for a requested date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedMatch {
    pub observed_id: i64,
    pub observed_time: DateTime<Utc>,
    pub display_name: Option<String>,
}

/// Terminal value for one requested date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Accepted(ObservedMatch),
    Rejected(RejectionKind),
}

impl MatchOutcome {
    pub fn accepted(&self) -> Option<&ObservedMatch> {
        match self {
            MatchOutcome::Accepted(m) => Some(m),
            MatchOutcome::Rejected(_) => None,
        }
    }
}

/// Resolve one requested date against `resolver` and gate the answer.
///
/// Order of checks: not found, requested format, observed format, distance.
/// The requested date is only parsed once the resolver has answered.
pub async fn resolve(
    requested: &str,
    source_id: i64,
    tolerance: Option<Tolerance>,
    resolver: &dyn ClosestImageResolver,
) -> Result<MatchOutcome, ResolverError> {
    let Some(closest) = resolver.closest(requested, source_id).await? else {
        return Ok(MatchOutcome::Rejected(RejectionKind::NoMatch));
    };

    let requested_at = match parse_requested(requested) {
        Ok(t) => t,
        Err(kind) => return Ok(MatchOutcome::Rejected(kind)),
    };
    let observed_at = match parse_observed(&closest.date) {
        Ok(t) => t,
        Err(kind) => return Ok(MatchOutcome::Rejected(kind)),
    };

    if let Err(kind) = ProximityGate::new(tolerance).check(requested_at, observed_at) {
        return Ok(MatchOutcome::Rejected(kind));
    }

    Ok(MatchOutcome::Accepted(ObservedMatch {
        observed_id: closest.id,
        observed_time: observed_at,
        display_name: closest.name,
    }))
}

/// A resolver bound to a gate, shareable across concurrent per-date tasks.
#[derive(Clone)]
pub struct MatchPipeline {
    resolver: Arc<dyn ClosestImageResolver>,
    gate: ProximityGate,
}

impl MatchPipeline {
    pub fn new(resolver: Arc<dyn ClosestImageResolver>, gate: ProximityGate) -> Self {
        Self { resolver, gate }
    }

    pub fn resolver_name(&self) -> &'static str {
        self.resolver.name()
    }

    pub fn gate(&self) -> &ProximityGate {
        &self.gate
    }

    pub async fn resolve(
        &self,
        requested: &str,
        source_id: i64,
    ) -> Result<MatchOutcome, ResolverError> {
        resolve(
            requested,
            source_id,
            self.gate.tolerance(),
            self.resolver.as_ref(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ClosestImage;

    struct FixedResolver(Option<ClosestImage>);

    #[async_trait::async_trait]
    impl ClosestImageResolver for FixedResolver {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn closest(
            &self,
            _date: &str,
            _source_id: i64,
        ) -> Result<Option<ClosestImage>, ResolverError> {
            Ok(self.0.clone())
        }
    }

    fn image(date: &str) -> ClosestImage {
        ClosestImage {
            id: 79_096_751,
            date: date.to_string(),
            name: Some("HMI Int".to_string()),
        }
    }

    #[tokio::test]
    async fn not_found_is_no_match_even_for_bad_request() {
        let r = FixedResolver(None);
        let out = resolve("not a date", 18, None, &r).await.unwrap();
        assert_eq!(out, MatchOutcome::Rejected(RejectionKind::NoMatch));
    }

    #[tokio::test]
    async fn accepted_match_carries_id_time_and_name() {
        let r = FixedResolver(Some(image("2014-01-01 23:59:53")));
        let out = resolve("2014-01-01T23:59:59Z", 18, None, &r).await.unwrap();
        let m = out.accepted().unwrap();
        assert_eq!(m.observed_id, 79_096_751);
        assert_eq!(m.observed_time, parse_observed("2014-01-01 23:59:53").unwrap());
        assert_eq!(m.display_name.as_deref(), Some("HMI Int"));
    }

    #[tokio::test]
    async fn requested_format_checked_before_observed() {
        let r = FixedResolver(Some(image("garbage")));
        let out = resolve("2014-01-01", 18, None, &r).await.unwrap();
        assert!(matches!(
            out,
            MatchOutcome::Rejected(RejectionKind::BadRequestedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn bad_observed_rejects_even_without_tolerance() {
        let r = FixedResolver(Some(image("")));
        let out = resolve("2014-01-01T00:00:00Z", 18, None, &r).await.unwrap();
        assert_eq!(
            out,
            MatchOutcome::Rejected(RejectionKind::BadObservedFormat { raw: String::new() })
        );
    }

    #[tokio::test]
    async fn pipeline_applies_bound_tolerance() {
        let gate = ProximityGate::new(Some(Tolerance::from_secs(5.0).unwrap()));
        let resolver = Arc::new(FixedResolver(Some(image("2014-01-02 00:00:10"))));
        let p = MatchPipeline::new(resolver, gate);
        let out = p.resolve("2014-01-01T23:59:59Z", 18).await.unwrap();
        assert_eq!(
            out,
            MatchOutcome::Rejected(RejectionKind::OutOfTolerance { delta_seconds: 11 })
        );
        assert_eq!(p.resolver_name(), "fixed");
    }
}
