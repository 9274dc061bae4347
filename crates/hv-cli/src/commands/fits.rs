//! `heliofits fits`: closest image -> FITS file (+ header text) per date.

use std::collections::BTreeMap;
use std::path::PathBuf;

use hv_header::{HeaderRecord, RecordError};
use hv_sink::failed_log::{TAG_DOWNLOAD, TAG_EXCEPTION};
use hv_sink::naming::{fits_file_name, header_txt_name};
use hv_sink::{
    decode_jp2_gray, decode_png_gray, write_artifact, FitsWriter, HeaderSink, PixelBuffer,
};
use serde::Serialize;

use super::{for_each_date, DateFailure, RunContext};

/// Paths written for one requested date; both `None` when the date failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FitsOutcome {
    pub header_txt: Option<PathBuf>,
    pub fits: Option<PathBuf>,
}

pub async fn run(ctx: &RunContext, dates: &[String]) -> BTreeMap<String, FitsOutcome> {
    for_each_date(dates, ctx.max_concurrency, |date| async move {
        let outcome = match process_date(ctx, &date).await {
            Ok(o) => o,
            Err(failure) => {
                ctx.record_failure(&date, &failure);
                FitsOutcome::default()
            }
        };
        (date, outcome)
    })
    .await
}

async fn process_date(ctx: &RunContext, date: &str) -> Result<FitsOutcome, DateFailure> {
    let m = ctx.matched(date).await?;
    let id = m.observed_id;

    let header_text = ctx.client.jp2_header(id).await.map_err(exception)?;
    let jp2 = ctx.client.jp2_image(id).await.map_err(exception)?;
    let (Some(header_text), Some(jp2)) = (header_text, jp2) else {
        return Err(download_failure(id));
    };

    let record = build_record(&header_text)?;
    let mut pixels = image_pixels(ctx, id, &jp2).await?;
    pixels.flip_vertical();

    let name = fits_file_name(m.observed_time, m.display_name.as_deref(), ctx.source_id);
    let fits = FitsWriter::new(ctx.out_root.join(name))
        .write(&record, &pixels)
        .map_err(exception)?;

    let header_txt = if ctx.save_header_txt {
        let path = ctx.out_root.join(header_txt_name(id));
        Some(write_artifact(&path, header_text.as_bytes()).map_err(exception)?)
    } else {
        None
    };

    tracing::info!(
        date,
        image_id = id,
        observed = %m.observed_time,
        cards = record.len(),
        path = %fits.display(),
        "fits written"
    );
    Ok(FitsOutcome {
        header_txt,
        fits: Some(fits),
    })
}

/// JP2 pixels, or the PNG preview of the same image when the JP2 will not decode.
async fn image_pixels(ctx: &RunContext, id: i64, jp2: &[u8]) -> Result<PixelBuffer, DateFailure> {
    let err = match decode_jp2_gray(jp2) {
        Ok(p) => return Ok(p),
        Err(e) => e,
    };
    tracing::warn!(image_id = id, error = %err, "jp2 decode failed, using png preview");
    let Some(png) = ctx.client.png_image(id).await.map_err(exception)? else {
        return Err(download_failure(id));
    };
    decode_png_gray(&png).map_err(exception)
}

fn download_failure(id: i64) -> DateFailure {
    DateFailure::new(TAG_DOWNLOAD, Some(format!("id={id}")))
}

/// Transcode the header and mark the image rows as flipped.
fn build_record(header_text: &str) -> Result<HeaderRecord, DateFailure> {
    let mut record = hv_header::transcode(header_text).map_err(exception)?;
    match record.set_flag("FLIPUD", true) {
        Ok(()) => {}
        Err(RecordError::DuplicateKey(key)) => {
            tracing::warn!(key = %key, "header already carries the flip flag, kept as sent");
        }
        Err(e) => return Err(exception(e)),
    }
    Ok(record)
}

fn exception(e: impl std::fmt::Display) -> DateFailure {
    DateFailure::new(TAG_EXCEPTION, Some(e.to_string()))
}
