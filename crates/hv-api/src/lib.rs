//! hv-api
//!
//! Helioviewer v2 HTTP client.
//!
//! Four endpoints are consumed:
//! - `getClosestImage/?date=..&sourceId=..` -> `{ id, date, name, .. }`
//! - `getJP2Header/?id=..`                  -> XML header text
//! - `getJP2Image/?id=..`                   -> JPEG 2000 bytes
//! - `getPNG/?id=..`                        -> PNG bytes
//!
//! A non-200 status means "not available" and is returned as `Ok(None)`.
//! Transport and decode failures are [`ApiError`]s. No retries here.

pub mod sources;

use std::fmt;
use std::time::Duration;

use hv_match::{ClosestImage, ClosestImageResolver, ResolverError};
use serde::Deserialize;

pub use sources::{source_by_id, source_by_name, SourceInfo, SOURCES};

pub const DEFAULT_BASE_URL: &str = "https://api.helioviewer.org/v2/";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ApiError {
    /// Network or transport failure (includes timeouts).
    Transport(String),
    /// A 200 response whose payload could not be decoded.
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "helioviewer transport error: {msg}"),
            ApiError::Decode(msg) => write!(f, "helioviewer decode error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ApiError> for ResolverError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Transport(m) => ResolverError::Transport(m),
            ApiError::Decode(m) => ResolverError::Decode(m),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Per-request timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// `getClosestImage` and `getJP2Header`.
    pub lookup: Duration,
    /// Image payload downloads.
    pub download: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            lookup: Duration::from_secs(60),
            download: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HelioviewerClient {
    http: reqwest::Client,
    base_url: String,
    timeouts: Timeouts,
}

impl HelioviewerClient {
    pub fn new() -> Self {
        Self::new_with_base_url(DEFAULT_BASE_URL.to_string(), Timeouts::default())
    }

    pub fn new_with_base_url(base_url: String, timeouts: Timeouts) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            timeouts,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}/", self.base_url.trim_end_matches('/'), name)
    }

    /// `getClosestImage`. `Ok(None)` on non-200 or when the body carries no `id`.
    pub async fn closest_image(
        &self,
        date: &str,
        source_id: i64,
    ) -> Result<Option<ClosestImage>, ApiError> {
        let query = [
            ("date", date.to_string()),
            ("sourceId", source_id.to_string()),
        ];
        let Some(body) = self
            .get_bytes("getClosestImage", &query, self.timeouts.lookup)
            .await?
        else {
            return Ok(None);
        };

        let resp: ClosestImageResponse = serde_json::from_slice(&body)
            .map_err(|e| ApiError::Decode(format!("getClosestImage json: {e}")))?;
        resp.into_closest()
    }

    /// `getJP2Header` as text.
    pub async fn jp2_header(&self, image_id: i64) -> Result<Option<String>, ApiError> {
        let query = [("id", image_id.to_string())];
        let Some(body) = self
            .get_bytes("getJP2Header", &query, self.timeouts.lookup)
            .await?
        else {
            return Ok(None);
        };
        String::from_utf8(body)
            .map(Some)
            .map_err(|e| ApiError::Decode(format!("getJP2Header utf-8: {e}")))
    }

    /// `getJP2Image` raw JPEG 2000 bytes.
    pub async fn jp2_image(&self, image_id: i64) -> Result<Option<Vec<u8>>, ApiError> {
        let query = [("id", image_id.to_string())];
        self.get_bytes("getJP2Image", &query, self.timeouts.download)
            .await
    }

    /// `getPNG` raw bytes.
    pub async fn png_image(&self, image_id: i64) -> Result<Option<Vec<u8>>, ApiError> {
        let query = [("id", image_id.to_string())];
        self.get_bytes("getPNG", &query, self.timeouts.download)
            .await
    }

    async fn get_bytes(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, ApiError> {
        let url = self.endpoint(endpoint);
        tracing::debug!(%url, ?query, "helioviewer request");

        let resp = self
            .http
            .get(&url)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("{endpoint}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(endpoint, status = status.as_u16(), "helioviewer non-success status");
            return Ok(None);
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(format!("{endpoint} body: {e}")))?;
        Ok(Some(body.to_vec()))
    }
}

impl Default for HelioviewerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ClosestImageResolver for HelioviewerClient {
    fn name(&self) -> &'static str {
        "helioviewer"
    }

    async fn closest(
        &self,
        date: &str,
        source_id: i64,
    ) -> Result<Option<ClosestImage>, ResolverError> {
        Ok(self.closest_image(date, source_id).await?)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Helioviewer serialises ids as strings; accept numbers too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ImageId {
    Num(i64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
struct ClosestImageResponse {
    #[serde(default)]
    id: Option<ImageId>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl ClosestImageResponse {
    fn into_closest(self) -> Result<Option<ClosestImage>, ApiError> {
        let id = match self.id {
            None => return Ok(None),
            Some(ImageId::Num(n)) => n,
            Some(ImageId::Text(s)) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ApiError::Decode(format!("getClosestImage id not numeric: {s}")))?,
        };
        Ok(Some(ClosestImage {
            id,
            date: self.date.unwrap_or_default().trim().to_string(),
            name: self
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Result<Option<ClosestImage>, ApiError> {
        serde_json::from_str::<ClosestImageResponse>(json)
            .unwrap()
            .into_closest()
    }

    #[test]
    fn string_and_numeric_ids_decode() {
        let a = decode(r#"{"id":"79096751","date":"2014-01-01 23:59:53","name":"HMI Int"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(a.id, 79_096_751);
        assert_eq!(a.name.as_deref(), Some("HMI Int"));

        let b = decode(r#"{"id":42,"date":"2014-01-01 00:00:00"}"#).unwrap().unwrap();
        assert_eq!(b.id, 42);
        assert_eq!(b.name, None);
    }

    #[test]
    fn missing_id_is_not_found() {
        assert!(decode(r#"{"error":"No images"}"#).unwrap().is_none());
    }

    #[test]
    fn missing_date_becomes_empty() {
        let c = decode(r#"{"id":"1"}"#).unwrap().unwrap();
        assert_eq!(c.date, "");
    }

    #[test]
    fn non_numeric_id_is_decode_error() {
        assert!(matches!(decode(r#"{"id":"abc"}"#), Err(ApiError::Decode(_))));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let c = HelioviewerClient::new_with_base_url("http://h/v2/".into(), Timeouts::default());
        assert_eq!(c.endpoint("getPNG"), "http://h/v2/getPNG/");
        let c = HelioviewerClient::new_with_base_url("http://h/v2".into(), Timeouts::default());
        assert_eq!(c.endpoint("getPNG"), "http://h/v2/getPNG/");
    }
}
