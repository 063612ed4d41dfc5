//! Integration tests for `Fetcher` using wiremock HTTP mocks.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;
use woonlens_fetch::{Fetcher, SourceError};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Payload {
    value: i64,
}

fn fetcher() -> Fetcher {
    Fetcher::new(5, "woonlens-test/0.1", 2, 0).expect("client construction should not fail")
}

fn deadline() -> Instant {
    Instant::now() + Duration::from_secs(10)
}

#[tokio::test]
async fn get_json_decodes_typed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 7})))
        .mount(&server)
        .await;

    let got: Payload = fetcher()
        .get_json(deadline(), "test", &format!("{}/data", server.uri()), &[])
        .await
        .expect("should decode");
    assert_eq!(got, Payload { value: 7 });
}

#[tokio::test]
async fn caller_headers_are_sent_and_override_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/keyed"))
        .and(header("x-api-key", "sleutel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 1})))
        .mount(&server)
        .await;

    let got: Payload = fetcher()
        .get_json(
            deadline(),
            "test",
            &format!("{}/keyed", server.uri()),
            &[("x-api-key", "sleutel")],
        )
        .await
        .expect("keyed request should succeed");
    assert_eq!(got.value, 1);
}

#[tokio::test]
async fn status_404_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result: Result<Payload, _> = fetcher()
        .get_json(deadline(), "test", &server.uri(), &[])
        .await;
    assert!(matches!(result, Err(SourceError::NotFound { .. })));
}

#[tokio::test]
async fn status_401_maps_to_unauthorised() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result: Result<Payload, _> = fetcher()
        .get_json(deadline(), "test", &server.uri(), &[])
        .await;
    assert!(matches!(result, Err(SourceError::Unauthorised { .. })));
}

#[tokio::test]
async fn status_429_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let result: Result<Payload, _> = fetcher()
        .get_json(deadline(), "test", &server.uri(), &[])
        .await;
    assert!(matches!(result, Err(SourceError::RateLimited { .. })));
}

#[tokio::test]
async fn other_non_2xx_carries_the_status_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result: Result<Payload, _> = fetcher()
        .get_json(deadline(), "test", &server.uri(), &[])
        .await;
    match result {
        Err(SourceError::Status { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected Status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error_even_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let result: Result<Payload, _> = fetcher()
        .get_json(deadline(), "luchtmeetnet", &server.uri(), &[])
        .await;
    match result {
        Err(SourceError::Decode { context, .. }) => {
            assert!(context.contains("luchtmeetnet"), "context: {context}");
        }
        other => panic!("expected Decode error, got: {other:?}"),
    }
}

#[tokio::test]
async fn get_json_with_retry_recovers_from_transient_500() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 3})))
        .mount(&server)
        .await;

    let got: Payload = fetcher()
        .get_json_with_retry(deadline(), "test", &format!("{}/flaky", server.uri()), &[])
        .await
        .expect("retry should recover");
    assert_eq!(got.value, 3);
}

#[tokio::test]
async fn post_json_sends_json_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/avm"))
        .and(header("content-type", "application/json"))
        .and(body_string_contains("\"postcode\":\"3541ED\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 9})))
        .mount(&server)
        .await;

    let body = serde_json::json!({"postcode": "3541ED", "housenumber": 53});
    let got: Payload = fetcher()
        .post_json(
            deadline(),
            "test",
            &format!("{}/avm", server.uri()),
            &[],
            &body,
        )
        .await
        .expect("post should succeed");
    assert_eq!(got.value, 9);
}

#[tokio::test]
async fn post_form_sends_urlencoded_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/interpreter"))
        .and(header(
            "content-type",
            "application/x-www-form-urlencoded",
        ))
        .and(body_string_contains("data="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 4})))
        .mount(&server)
        .await;

    let got: Payload = fetcher()
        .post_form(
            deadline(),
            "test",
            &format!("{}/interpreter", server.uri()),
            &[],
            &[("data", "[out:json];node(1);out;")],
        )
        .await
        .expect("form post should succeed");
    assert_eq!(got.value, 4);
}

#[tokio::test]
async fn expired_deadline_times_out_without_a_request() {
    let server = MockServer::start().await;
    // No mocks mounted: any request would 404 and fail the match below.
    let past = Instant::now() - Duration::from_millis(1);
    let result: Result<Payload, _> = fetcher().get_json(past, "test", &server.uri(), &[]).await;
    assert!(matches!(result, Err(SourceError::Timeout)));
}

#[tokio::test]
async fn slow_upstream_hits_the_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"value": 1}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let tight = Instant::now() + Duration::from_millis(50);
    let result: Result<Payload, _> = fetcher().get_json(tight, "test", &server.uri(), &[]).await;
    assert!(matches!(result, Err(SourceError::Timeout)));
}
