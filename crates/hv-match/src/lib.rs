//! hv-match
//!
//! Closest-image match validation.
//!
//! Given a requested instant and a source id, a [`ClosestImageResolver`]
//! reports the observation it judges closest; [`ProximityGate`] decides
//! whether that observation is close enough to keep.
//!
//! Request-scoped and side-effect free apart from the single resolver call.
//! No logging, no retries: callers own both.

pub mod gate;
pub mod pipeline;
pub mod resolver;

pub use gate::{
    accept, parse_observed, parse_requested, ProximityGate, RejectionKind, Tolerance,
    ToleranceError, OBSERVED_FORMAT, REQUESTED_FORMAT,
};
pub use pipeline::{resolve, MatchOutcome, MatchPipeline, ObservedMatch};
pub use resolver::{ClosestImage, ClosestImageResolver, ResolverError};
