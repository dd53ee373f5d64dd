//! HTTP API tests against a live server.

use axum::http::StatusCode;
use linkstore::config::{BackendKind, LinkConfig};
use linkstore::http::response::{RouteResponse, RoutesResponse};
use serde_json::{json, Value};

mod common;
use common::{client, TestServer};

fn config() -> LinkConfig {
    let mut config = LinkConfig::default();
    config.storage.backend = BackendKind::Embedded;
    config.api.host = Some("go.example.com".into());
    config
}

async fn post_url(server: &TestServer, name: &str, url: &str) -> reqwest::Response {
    client()
        .post(server.url(&format!("/api/url/{}", name)))
        .json(&json!({ "url": url }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_and_request_id() {
    let server = TestServer::start(config()).await;

    let res = client().get(server.url("/healthz")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "ok");

    let res = client()
        .get(server.url("/healthz"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-42");

    server.stop();
}

#[tokio::test]
async fn test_store_fetch_and_redirect() {
    let server = TestServer::start(config()).await;

    let res = post_url(&server, "docs", "https://docs.example.com").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: RouteResponse = res.json().await.unwrap();
    assert!(body.ok);
    assert_eq!(body.route.name, "docs");
    assert_eq!(body.route.source_host.as_deref(), Some("go.example.com"));

    let res = client().get(server.url("/api/url/docs")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: RouteResponse = res.json().await.unwrap();
    assert_eq!(body.route.url, "https://docs.example.com");
    assert!(body.route.time > 0);

    let res = client().get(server.url("/docs")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()["location"], "https://docs.example.com");

    server.stop();
}

#[tokio::test]
async fn test_pattern_redirect() {
    let server = TestServer::start(config()).await;

    let res = post_url(&server, "gh/(.*)", "https://github.com/$1").await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client().get(server.url("/gh/rust-lang")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()["location"], "https://github.com/rust-lang");

    let res = client().get(server.url("/nothing")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.stop();
}

#[tokio::test]
async fn test_generated_names() {
    let server = TestServer::start(config()).await;

    let res = client()
        .post(server.url("/api/url/"))
        .json(&json!({ "url": "https://one.example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let first: RouteResponse = res.json().await.unwrap();
    assert!(first.route.name.starts_with(':'));

    // a chosen name loses its leading sentinel
    let res = post_url(&server, "::taken", "https://two.example.com").await;
    let second: RouteResponse = res.json().await.unwrap();
    assert_eq!(second.route.name, "taken");

    let res = client()
        .get(server.url(&format!("/api/url/{}", first.route.name)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    server.stop();
}

#[tokio::test]
async fn test_rejected_writes() {
    let server = TestServer::start(config()).await;

    let res = client()
        .post(server.url("/api/url/bad"))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["ok"], false);

    let res = post_url(&server, "js", "javascript:alert(1)").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = post_url(&server, "broken(", "https://example.com").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // points back at the server itself
    let own = server.base.clone();
    let res = post_url(&server, "loop", &format!("{}/loop", own)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(server.store.get("loop").unwrap(), None);
    server.stop();
}

#[tokio::test]
async fn test_delete() {
    let server = TestServer::start(config()).await;
    post_url(&server, "gone", "https://gone.example.com").await;

    let res = client().delete(server.url("/api/url/gone")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client().delete(server.url("/api/url/gone")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client().get(server.url("/api/url/gone")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.stop();
}

#[tokio::test]
async fn test_listing_pages() {
    let server = TestServer::start(config()).await;
    for name in ["a", "b", "c"] {
        post_url(&server, name, &format!("https://{}.example.com", name)).await;
    }
    client()
        .post(server.url("/api/url/"))
        .json(&json!({ "url": "https://gen.example.com" }))
        .send()
        .await
        .unwrap();

    let res = client()
        .get(server.url("/api/urls?limit=2"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let first: RoutesResponse = res.json().await.unwrap();
    let names: Vec<_> = first.routes.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    let next = first.next.expect("third route follows");

    let res = client()
        .get(server.url("/api/urls"))
        .query(&[("cursor", next.as_str()), ("limit", "2")])
        .send()
        .await
        .unwrap();
    let second: RoutesResponse = res.json().await.unwrap();
    let names: Vec<_> = second.routes.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["c"]);
    assert_eq!(second.next, None);

    let res = client()
        .get(server.url("/api/urls?include-generated-names=true"))
        .send()
        .await
        .unwrap();
    let all: RoutesResponse = res.json().await.unwrap();
    assert_eq!(all.routes.len(), 4);
    assert!(all.routes[0].name.starts_with(':'));

    server.stop();
}

#[tokio::test]
async fn test_listing_rejects_bad_parameters() {
    let server = TestServer::start(config()).await;

    for query in ["cursor=%21%21%21", "limit=0", "limit=abc", "limit=10001"] {
        let res = client()
            .get(server.url(&format!("/api/urls?{}", query)))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "query {}", query);
    }

    server.stop();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let server = TestServer::start(config()).await;

    let url = format!("https://big.example.com/{}", "x".repeat(70_000));
    let res = post_url(&server, "big", &url).await;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(server.store.get("big").unwrap(), None);

    server.stop();
}

#[tokio::test]
async fn test_redirect_decodes_path() {
    let server = TestServer::start(config()).await;

    let res = post_url(&server, "caf%C3%A9", "https://cafe.example.com").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(server.store.get("café").unwrap().is_some());

    let res = client().get(server.url("/caf%C3%A9")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()["location"], "https://cafe.example.com");

    let res = post_url(&server, "a%20b/(.*)", "https://space.example.com/$1").await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = client().get(server.url("/a%20b/c")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()["location"], "https://space.example.com/c");

    let res = client().get(server.url("/%FF")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    server.stop();
}

#[tokio::test]
async fn test_posted_generated_name_is_kept() {
    let server = TestServer::start(config()).await;

    post_url(&server, "1", "https://user.example.com").await;
    let res = post_url(&server, ":1", "https://generated.example.com").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: RouteResponse = res.json().await.unwrap();
    assert_eq!(body.route.name, ":1");

    let user = server.store.get("1").unwrap().unwrap();
    assert_eq!(user.url, "https://user.example.com");
    let generated = server.store.get(":1").unwrap().unwrap();
    assert_eq!(generated.url, "https://generated.example.com");

    // fresh names skip the one taken above
    let res = client()
        .post(server.url("/api/url/"))
        .json(&json!({ "url": "https://next.example.com" }))
        .send()
        .await
        .unwrap();
    let fresh: RouteResponse = res.json().await.unwrap();
    assert!(fresh.route.name.starts_with(':'));
    assert_ne!(fresh.route.name, ":1");

    server.stop();
}

#[tokio::test]
async fn test_posted_time_is_kept() {
    let server = TestServer::start(config()).await;

    let res = client()
        .post(server.url("/api/url/old"))
        .json(&json!({ "url": "https://old.example.com", "time": 1_500_000_000u64 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(server.store.get("old").unwrap().unwrap().time, 1_500_000_000);

    server.stop();
}
