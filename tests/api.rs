mod common;

use common::*;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use turnstile::server::Server;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;

const USER: &str = "11111111-1111-1111-1111-111111111111";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

fn api(
    h: &Harness,
    request_timeout: Duration,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone + 'static
{
    turnstile::api::routes(Arc::new(Server::new(h.service.clone(), request_timeout)))
}

fn body(response: &warp::http::Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).expect("json body")
}

async fn issue(h: &Harness, guid: &str) -> warp::http::Response<Bytes> {
    warp::test::request()
        .method("GET")
        .path(&format!("/api/v1/auth/{}", guid))
        .reply(&api(h, REQUEST_TIMEOUT))
        .await
}

async fn refresh(h: &Harness, payload: &[u8]) -> warp::http::Response<Bytes> {
    refresh_as(h, "application/json", payload, REQUEST_TIMEOUT).await
}

async fn refresh_as(
    h: &Harness,
    content_type: &str,
    payload: &[u8],
    request_timeout: Duration,
) -> warp::http::Response<Bytes> {
    warp::test::request()
        .method("POST")
        .path("/api/v1/auth/refresh")
        .header("content-type", content_type)
        .body(payload.to_vec())
        .reply(&api(h, request_timeout))
        .await
}

async fn whoami(h: &Harness, authorization: Option<&str>) -> warp::http::Response<Bytes> {
    let mut request = warp::test::request().method("GET").path("/api/v1/whoami");
    if let Some(value) = authorization {
        request = request.header("authorization", value);
    }
    request.reply(&api(h, REQUEST_TIMEOUT)).await
}

#[tokio::test]
async fn issue_returns_a_token_pair() {
    let h = harness();

    let response = issue(&h, USER).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body(&response);
    assert!(json["access_token"].as_str().is_some_and(|t| t.split('.').count() == 3));
    assert_eq!(json["refresh_token"].as_str().map(str::len), Some(43));
}

#[tokio::test]
async fn issue_rejects_a_bad_guid() {
    let h = harness();

    let response = issue(&h, "not-a-guid").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body(&response)["error"].is_string());
    assert_eq!(h.store.calls(), 0);
}

#[tokio::test]
async fn refresh_rotates_once_per_token() {
    let h = harness();
    let issued = body(&issue(&h, USER).await);
    let payload = json!({ "refresh_token": issued["refresh_token"] }).to_string();

    let first = refresh(&h, payload.as_bytes()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let rotated = body(&first);
    assert_ne!(rotated["refresh_token"], issued["refresh_token"]);

    let replay = refresh(&h, payload.as_bytes()).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(&replay), json!({ "error": "invalid refresh token" }));
}

#[tokio::test]
async fn refresh_rejects_undecodable_bodies() {
    let h = harness();

    let response = refresh(&h, b"{\"refresh_token\":").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(&response), json!({ "error": "failed to decode request" }));

    let response = refresh(&h, b"{\"token\":\"abc\"}").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(h.store.calls(), 0);
}

#[tokio::test]
async fn refresh_rejects_an_empty_token() {
    let h = harness();

    let response = refresh(&h, br#"{"refresh_token":""}"#).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(&response), json!({ "error": "refresh token is empty" }));
    assert_eq!(h.store.calls(), 0);
}

#[tokio::test]
async fn store_failure_is_an_opaque_500() {
    let h = harness();
    let issued = body(&issue(&h, USER).await);
    h.store.fail_saves.store(true, Ordering::SeqCst);

    let payload = json!({ "refresh_token": issued["refresh_token"] }).to_string();
    let response = refresh(&h, payload.as_bytes()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body(&response), json!({ "error": "credential store unavailable" }));

    let response = issue(&h, USER).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn whoami_requires_a_valid_bearer_token() {
    let h = harness();
    let issued = body(&issue(&h, USER).await);
    let access = issued["access_token"].as_str().unwrap();

    let response = whoami(&h, Some(&format!("Bearer {}", access))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(&response), json!({ "user_id": USER }));

    for header in [None, Some(access), Some("Bearer garbage")] {
        let response = whoami(&h, header).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{header:?}");
        assert_eq!(body(&response), json!({ "error": "invalid access token" }));
    }
}

#[tokio::test]
async fn issue_rejects_an_empty_guid() {
    let h = harness();

    for path in ["/api/v1/auth/", "/api/v1/auth"] {
        let response = warp::test::request()
            .method("GET")
            .path(path)
            .reply(&api(&h, REQUEST_TIMEOUT))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(body(&response), json!({ "error": "user id is empty" }));
    }
    assert_eq!(h.store.calls(), 0);
}

#[tokio::test]
async fn refresh_rejects_an_oversized_body() {
    let h = harness();
    let padding = "x".repeat(5 * 1024);
    let payload = json!({ "refresh_token": padding }).to_string();

    let response = refresh(&h, payload.as_bytes()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(&response), json!({ "error": "request body too large" }));
    assert_eq!(h.store.calls(), 0);
}

#[tokio::test]
async fn refresh_rejects_a_non_json_content_type() {
    let h = harness();
    let issued = body(&issue(&h, USER).await);
    let payload = json!({ "refresh_token": issued["refresh_token"] }).to_string();

    let response = refresh_as(&h, "text/plain", payload.as_bytes(), REQUEST_TIMEOUT).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body(&response),
        json!({ "error": "expected an application/json body" })
    );
    assert_eq!(h.store.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn wrong_method_on_a_known_path_is_405() {
    let h = harness();

    let response = warp::test::request()
        .method("DELETE")
        .path(&format!("/api/v1/auth/{}", USER))
        .reply(&api(&h, REQUEST_TIMEOUT))
        .await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn slow_requests_hit_the_deadline() {
    let h = harness();
    let issued = body(&issue(&h, USER).await);
    let payload = json!({ "refresh_token": issued["refresh_token"] }).to_string();

    h.store.stall.store(true, Ordering::SeqCst);
    let response = refresh_as(
        &h,
        "application/json",
        payload.as_bytes(),
        Duration::from_millis(100),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body(&response), json!({ "error": "request timed out" }));

    // the abandoned rotation never reached save
    h.store.stall.store(false, Ordering::SeqCst);
    let response = refresh(&h, payload.as_bytes()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_paths_are_404() {
    let h = harness();

    for (method, path) in [
        ("GET", "/api/v2/auth/whatever"),
        ("GET", "/api/v1/nope"),
        ("POST", "/api/v1/nope"),
        ("GET", "/api/v1/auth/a/b"),
    ] {
        let response = warp::test::request()
            .method(method)
            .path(path)
            .reply(&api(&h, REQUEST_TIMEOUT))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {path}");
        assert_eq!(body(&response), json!({ "error": "not found" }));
    }
}
