//! Command handlers for `heliofits`.
//!
//! Shared per-run state and the per-date fan-out live here.
//! Command-specific logic lives in the submodules.

pub mod fits;
pub mod png;
pub mod sources;

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use futures_util::stream::{self, StreamExt};
use hv_api::{source_by_id, source_by_name, HelioviewerClient};
use hv_match::{MatchOutcome, MatchPipeline, ObservedMatch, ProximityGate, RejectionKind};
use hv_sink::failed_log::{
    TAG_BAD_CLOSEST_DATE, TAG_BAD_REQUESTED_DATE, TAG_EXCEPTION, TAG_NO_CLOSEST, TAG_OUT_OF_RANGE,
};
use hv_sink::FailedLog;

use crate::settings::RunSettings;

// ---------------------------------------------------------------------------
// Source selection
// ---------------------------------------------------------------------------

/// `--source-id` wins; otherwise `--source` is looked up in the catalog.
pub fn select_source(source_id: Option<i64>, source: Option<&str>) -> Result<i64> {
    match (source_id, source) {
        (Some(id), _) => {
            if source_by_id(id).is_none() {
                tracing::warn!(source_id = id, "source id not in local catalog, using as given");
            }
            Ok(id)
        }
        (None, Some(name)) => match source_by_name(name) {
            Some(s) => Ok(s.source_id),
            None => bail!("unknown source '{name}'; run `heliofits sources` for the catalog"),
        },
        (None, None) => bail!("one of --source-id or --source is required"),
    }
}

// ---------------------------------------------------------------------------
// Per-run context
// ---------------------------------------------------------------------------

/// Everything a per-date task needs. Cheap to clone.
#[derive(Clone)]
pub struct RunContext {
    pub client: Arc<HelioviewerClient>,
    pub pipeline: MatchPipeline,
    pub source_id: i64,
    pub out_root: PathBuf,
    pub save_header_txt: bool,
    pub failed: Arc<FailedLog>,
    pub max_concurrency: usize,
}

impl RunContext {
    pub fn new(settings: &RunSettings, source_id: i64) -> Self {
        let client = Arc::new(HelioviewerClient::new_with_base_url(
            settings.base_url.clone(),
            settings.timeouts,
        ));
        let pipeline = MatchPipeline::new(client.clone(), ProximityGate::new(settings.tolerance));
        Self {
            client,
            pipeline,
            source_id,
            out_root: settings.out_root.clone(),
            save_header_txt: settings.save_header_txt,
            failed: Arc::new(FailedLog::new(settings.failed_log.clone())),
            max_concurrency: settings.max_concurrency.max(1),
        }
    }

    /// Resolve and gate one date; rejections and transport errors become a
    /// [`DateFailure`].
    pub async fn matched(&self, date: &str) -> Result<ObservedMatch, DateFailure> {
        match self.pipeline.resolve(date, self.source_id).await {
            Ok(MatchOutcome::Accepted(m)) => Ok(m),
            Ok(MatchOutcome::Rejected(kind)) => Err(DateFailure::from_rejection(&kind)),
            Err(e) => Err(DateFailure::new(TAG_EXCEPTION, Some(e.to_string()))),
        }
    }

    /// Log one failed date to tracing and the failed log.
    pub fn record_failure(&self, date: &str, failure: &DateFailure) {
        tracing::warn!(
            date,
            source_id = self.source_id,
            tag = failure.tag,
            detail = failure.detail.as_deref().unwrap_or(""),
            "no artifact for date"
        );
        if let Err(e) = self
            .failed
            .append(date, self.source_id, failure.tag, failure.detail.as_deref())
        {
            tracing::error!(error = %e, "failed log append failed");
        }
    }
}

/// Why a requested date produced no artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFailure {
    pub tag: &'static str,
    pub detail: Option<String>,
}

impl DateFailure {
    pub fn new(tag: &'static str, detail: Option<String>) -> Self {
        Self { tag, detail }
    }

    pub fn from_rejection(kind: &RejectionKind) -> Self {
        match kind {
            RejectionKind::NoMatch => Self::new(TAG_NO_CLOSEST, None),
            RejectionKind::BadRequestedFormat { raw } => {
                Self::new(TAG_BAD_REQUESTED_DATE, Some(format!("requested={raw}")))
            }
            RejectionKind::BadObservedFormat { raw } => {
                Self::new(TAG_BAD_CLOSEST_DATE, Some(format!("closest={raw}")))
            }
            RejectionKind::OutOfTolerance { delta_seconds } => {
                Self::new(TAG_OUT_OF_RANGE, Some(format!("dt_sec={delta_seconds}")))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

/// Run `task` for every date with at most `limit` in flight.
/// Results are keyed by requested date; a repeated date is processed once.
pub async fn for_each_date<T, F, Fut>(
    dates: &[String],
    limit: usize,
    task: F,
) -> BTreeMap<String, T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = (String, T)>,
{
    let mut unique: Vec<String> = Vec::with_capacity(dates.len());
    for d in dates {
        if !unique.contains(d) {
            unique.push(d.clone());
        }
    }

    stream::iter(unique.into_iter().map(task))
        .buffer_unordered(limit.max(1))
        .collect::<BTreeMap<String, T>>()
        .await
}
