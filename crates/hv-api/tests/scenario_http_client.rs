//! Helioviewer client against a local mock server.
//!
//! GREEN when:
//! - query parameters match the v2 API (`date`, `sourceId`, `id`)
//! - header, JP2 and PNG payloads are fetched by image id
//! - non-200 statuses map to "not available" rather than errors
//! - the client satisfies the resolver contract used by the match pipeline

use std::time::Duration;

use httpmock::prelude::*;
use hv_api::{ApiError, HelioviewerClient, Timeouts};
use hv_match::{resolve, MatchOutcome, RejectionKind, Tolerance};
use serde_json::json;

fn client(server: &MockServer) -> HelioviewerClient {
    HelioviewerClient::new_with_base_url(server.url("/v2/"), Timeouts::default())
}

#[tokio::test]
async fn closest_image_sends_date_and_source_id() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v2/getClosestImage/")
                .query_param("date", "2014-01-01T23:59:59Z")
                .query_param("sourceId", "18");
            then.status(200).json_body(json!({
                "id": "79096751",
                "date": "2014-01-01 23:59:53",
                "name": "HMI Int",
                "scale": 0.504,
                "width": 4096,
                "height": 4096
            }));
        })
        .await;

    let got = client(&server)
        .closest_image("2014-01-01T23:59:59Z", 18)
        .await
        .unwrap()
        .unwrap();
    m.assert_async().await;

    assert_eq!(got.id, 79_096_751);
    assert_eq!(got.date, "2014-01-01 23:59:53");
    assert_eq!(got.name.as_deref(), Some("HMI Int"));
}

#[tokio::test]
async fn non_200_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/getClosestImage/");
            then.status(500).body("boom");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/getJP2Header/");
            then.status(404);
        })
        .await;

    let c = client(&server);
    assert!(c.closest_image("2014-01-01T00:00:00Z", 18).await.unwrap().is_none());
    assert!(c.jp2_header(1).await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_json_is_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/getClosestImage/");
            then.status(200).body("<html>not json</html>");
        })
        .await;

    let err = client(&server)
        .closest_image("2014-01-01T00:00:00Z", 18)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err}");
}

#[tokio::test]
async fn header_and_png_are_fetched_by_id() {
    let server = MockServer::start_async().await;
    let header = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v2/getJP2Header/")
                .query_param("id", "7");
            then.status(200).body("<meta><fits><NAXIS>2</NAXIS></fits></meta>");
        })
        .await;
    let png = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/getPNG/").query_param("id", "7");
            then.status(200).body([0x89u8, b'P', b'N', b'G']);
        })
        .await;

    let c = client(&server);
    let xml = c.jp2_header(7).await.unwrap().unwrap();
    assert!(xml.contains("<NAXIS>2</NAXIS>"));
    let bytes = c.png_image(7).await.unwrap().unwrap();
    assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);

    header.assert_async().await;
    png.assert_async().await;
}

#[tokio::test]
async fn jp2_payload_is_fetched_by_id() {
    let server = MockServer::start_async().await;
    let jp2 = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v2/getJP2Image/")
                .query_param("id", "79096751");
            then.status(200)
                .body([0x00u8, 0x00, 0x00, 0x0c, b'j', b'P', b' ', b' ']);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/getJP2Image/").query_param("id", "8");
            then.status(404);
        })
        .await;

    let c = client(&server);
    let bytes = c.jp2_image(79_096_751).await.unwrap().unwrap();
    assert_eq!(&bytes[4..8], b"jP  ");
    assert!(c.jp2_image(8).await.unwrap().is_none());
    jp2.assert_async().await;
}

#[tokio::test]
async fn slow_response_is_transport_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/getJP2Header/");
            then.status(200).delay(Duration::from_millis(500)).body("<a/>");
        })
        .await;

    let c = HelioviewerClient::new_with_base_url(
        server.url("/v2/"),
        Timeouts {
            lookup: Duration::from_millis(50),
            download: Duration::from_millis(50),
        },
    );
    assert!(matches!(c.jp2_header(1).await, Err(ApiError::Transport(_))));
}

#[tokio::test]
async fn client_drives_match_pipeline() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/getClosestImage/");
            then.status(200).json_body(json!({
                "id": 5,
                "date": "2014-01-02 00:00:10",
                "name": "AIA 1600"
            }));
        })
        .await;

    let c = client(&server);
    let tol = Some(Tolerance::from_secs(5.0).unwrap());
    let out = resolve("2014-01-01T23:59:59Z", 15, tol, &c).await.unwrap();
    assert_eq!(
        out,
        MatchOutcome::Rejected(RejectionKind::OutOfTolerance { delta_seconds: 11 })
    );

    let out = resolve("2014-01-01T23:59:59Z", 15, None, &c).await.unwrap();
    assert_eq!(out.accepted().unwrap().observed_id, 5);
}
