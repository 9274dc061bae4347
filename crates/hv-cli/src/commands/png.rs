//! `heliofits png`: closest image -> PNG file grouped by requested day.

use std::collections::BTreeMap;
use std::path::PathBuf;

use hv_match::parse_requested;
use hv_sink::failed_log::{TAG_DOWNLOAD, TAG_EXCEPTION};
use hv_sink::naming::png_relative_path;
use hv_sink::write_artifact;

use super::{for_each_date, DateFailure, RunContext};

pub async fn run(ctx: &RunContext, dates: &[String]) -> BTreeMap<String, Option<PathBuf>> {
    for_each_date(dates, ctx.max_concurrency, |date| async move {
        let path = match process_date(ctx, &date).await {
            Ok(p) => Some(p),
            Err(failure) => {
                ctx.record_failure(&date, &failure);
                None
            }
        };
        (date, path)
    })
    .await
}

async fn process_date(ctx: &RunContext, date: &str) -> Result<PathBuf, DateFailure> {
    let m = ctx.matched(date).await?;
    // accepted matches always carry a parseable requested date
    let requested = parse_requested(date).map_err(|k| DateFailure::from_rejection(&k))?;

    let id = m.observed_id;
    let bytes = ctx
        .client
        .png_image(id)
        .await
        .map_err(|e| DateFailure::new(TAG_EXCEPTION, Some(e.to_string())))?
        .ok_or_else(|| DateFailure::new(TAG_DOWNLOAD, Some(format!("id={id}"))))?;

    let path = ctx.out_root.join(png_relative_path(requested, ctx.source_id));
    let written = write_artifact(&path, &bytes)
        .map_err(|e| DateFailure::new(TAG_EXCEPTION, Some(e.to_string())))?;

    tracing::info!(
        date,
        image_id = id,
        observed = %m.observed_time,
        bytes = bytes.len(),
        path = %written.display(),
        "png written"
    );
    Ok(written)
}
