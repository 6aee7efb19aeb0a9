//! Security report endpoint behavior, driven through the router.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::json;

use common::*;

async fn assert_fixture(name: &str) {
    let mut relay = TestRelay::with_domains(&["*"]);
    let body = load_fixture_text(name, "input");

    let response = relay
        .send(report_request(&security_url(PROJECT_ID), "application/json", None, body))
        .await;
    assert_eq!(response.status(), StatusCode::OK, "fixture {name}");

    let event = relay.next_event().expect("no event emitted");
    assert_eq!(event["event_id"].as_str().map(str::len), Some(32));
    assert!(event["timestamp"].as_f64().is_some());
    assert!(event["received"].as_f64().is_some());
    assert!(event["ingest_path"].is_array());

    assert_eq!(strip_volatile(event), load_fixture(name, "output"), "fixture {name}");
    assert!(relay.next_event().is_none());
}

#[tokio::test]
async fn test_csp() {
    assert_fixture("csp").await;
}

#[tokio::test]
async fn test_csp_chrome() {
    assert_fixture("csp_chrome").await;
}

#[tokio::test]
async fn test_csp_chrome_blocked_asset() {
    assert_fixture("csp_chrome_blocked_asset").await;
}

#[tokio::test]
async fn test_csp_firefox_blocked_asset() {
    assert_fixture("csp_firefox_blocked_asset").await;
}

#[tokio::test]
async fn test_expect_ct() {
    assert_fixture("expect_ct").await;
}

#[tokio::test]
async fn test_expect_staple() {
    assert_fixture("expect_staple").await;
}

#[tokio::test]
async fn test_hpkp() {
    assert_fixture("hpkp").await;
}

#[tokio::test]
async fn test_allowed_origin_is_forwarded() {
    let mut relay = TestRelay::with_domains(&["valid.com"]);
    let response = relay
        .send(report_request(
            &security_url(PROJECT_ID),
            "application/json; charset=utf-8",
            Some("http://valid.com"),
            load_fixture_text("csp", "input"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(relay.next_event().is_some());
    assert!(relay.next_event().is_none());
}

#[tokio::test]
async fn test_disallowed_origin_is_dropped_silently() {
    let mut relay = TestRelay::with_domains(&["invalid.com"]);
    let response = relay
        .send(report_request(
            &security_url(PROJECT_ID),
            "application/json; charset=utf-8",
            Some("http://valid.com"),
            load_fixture_text("csp", "input"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        split_header(response.headers()["access-control-expose-headers"].to_str().unwrap()),
        vec!["retry-after", "x-sentry-error", "x-sentry-rate-limits"]
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(body.is_empty());
    assert!(relay.next_event().is_none());
}

#[tokio::test]
async fn test_empty_allow_list_rejects_origin() {
    let mut relay = TestRelay::with_domains(&[]);
    let response = relay
        .send(report_request(
            &security_url(PROJECT_ID),
            "application/json",
            Some("http://valid.com"),
            load_fixture_text("csp", "input"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(relay.next_event().is_none());
}

#[tokio::test]
async fn test_report_origin_used_without_header() {
    // document-uri is https://example.com/foo/bar
    let mut relay = TestRelay::with_domains(&["example.com"]);
    relay
        .send(report_request(
            &security_url(PROJECT_ID),
            "application/csp-report",
            None,
            load_fixture_text("csp", "input"),
        ))
        .await;
    assert!(relay.next_event().is_some());

    let mut relay = TestRelay::with_domains(&["other.com"]);
    relay
        .send(report_request(
            &security_url(PROJECT_ID),
            "application/csp-report",
            None,
            load_fixture_text("csp", "input"),
        ))
        .await;
    assert!(relay.next_event().is_none());
}

#[tokio::test]
async fn test_origin_query_parameter() {
    let mut relay = TestRelay::with_domains(&["valid.com"]);
    let uri = format!("{}&origin=http%3A%2F%2Fvalid.com", security_url(PROJECT_ID));
    relay
        .send(report_request(&uri, "application/json", None, load_fixture_text("csp", "input")))
        .await;

    let event = relay.next_event().expect("no event emitted");
    assert_eq!(event["request"]["headers"][0], json!(["Origin", "http://valid.com/"]));
}

#[tokio::test]
async fn test_adds_origin_header() {
    let mut relay = TestRelay::with_domains(&["*"]);
    relay
        .send(report_request(
            &security_url(PROJECT_ID),
            "application/json; charset=utf-8",
            Some("http://valid.com"),
            load_fixture_text("csp", "input"),
        ))
        .await;

    let event = relay.next_event().expect("no event emitted");
    let headers = event["request"]["headers"].as_array().unwrap();
    assert!(headers.contains(&json!(["Origin", "http://valid.com/"])));
}

#[tokio::test]
async fn test_security_report_preflight() {
    let relay = TestRelay::with_domains(&["*"]);
    let request = Request::builder()
        .method("OPTIONS")
        .uri(format!("/api/{PROJECT_ID}/security/?sentry_key={PUBLIC_KEY}"))
        .header("host", "relay.example.org")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .header("user-agent", "Some Browser")
        .header("x-forwarded-for", "2a02:8388:8b86:a700:541e:f608:70f6:bcf2")
        .body(Body::empty())
        .unwrap();

    let response = relay.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers["access-control-allow-methods"], "POST");
    assert_eq!(headers["access-control-allow-origin"], "*");

    let mut expected = vec![
        "x-forwarded-for",
        "content-type",
        "transfer-encoding",
        "referer",
        "authorization",
        "origin",
        "authentication",
        "content-encoding",
        "x-sentry-auth",
        "accept",
        "x-requested-with",
    ];
    expected.sort();
    assert_eq!(
        split_header(headers["access-control-allow-headers"].to_str().unwrap()),
        expected
    );
}

#[tokio::test]
async fn test_security_report_expose_headers() {
    let mut relay = TestRelay::with_domains(&["*"]);
    let response = relay
        .send(report_request(
            &security_url(PROJECT_ID),
            "application/json; charset=utf-8",
            Some("http://valid.com"),
            "",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().contains_key("x-sentry-error"));
    assert_eq!(
        split_header(response.headers()["access-control-expose-headers"].to_str().unwrap()),
        vec!["retry-after", "x-sentry-error", "x-sentry-rate-limits"]
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(body.is_empty());
    assert!(relay.next_event().is_none());
}

#[tokio::test]
async fn test_expose_headers_on_success() {
    let relay = TestRelay::with_domains(&["*"]);
    let response = relay
        .send(report_request(
            &security_url(PROJECT_ID),
            "application/json",
            None,
            load_fixture_text("hpkp", "input"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("access-control-expose-headers"));
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_reports_are_idempotent_apart_from_identity() {
    let mut relay = TestRelay::with_domains(&["*"]);
    for _ in 0..2 {
        relay
            .send(report_request(
                &security_url(PROJECT_ID),
                "application/json",
                None,
                load_fixture_text("expect_ct", "input"),
            ))
            .await;
    }

    let first = relay.next_event().unwrap();
    let second = relay.next_event().unwrap();
    assert_ne!(first["event_id"], second["event_id"]);
    assert_eq!(strip_volatile(first), strip_volatile(second));
}

#[tokio::test]
async fn test_unrecognized_and_malformed_bodies() {
    let mut relay = TestRelay::with_domains(&["*"]);
    let cases = [
        ("application/json", r#"{"hello": "world"}"#),
        ("application/json", "[1, 2, 3]"),
        ("text/plain", "not json"),
        ("application/csp-report", "{"),
        ("application/csp-report", r#"{"csp-report": {"document-uri": "http://a.com"}}"#),
        ("application/json", r#"{"expect-ct-report": {"port": 443}}"#),
    ];

    for (content_type, body) in cases {
        let response = relay
            .send(report_request(&security_url(PROJECT_ID), content_type, None, body))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
    }
    assert!(relay.next_event().is_none());
}

#[tokio::test]
async fn test_authentication() {
    let relay = TestRelay::with_domains(&["*"]);
    let body = || load_fixture_text("hpkp", "input");

    let response = relay
        .send(report_request(&format!("/api/{PROJECT_ID}/security/"), "application/json", None, body()))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("access-control-expose-headers"));

    let response = relay
        .send(report_request(
            &format!("/api/{PROJECT_ID}/security/?sentry_key=wrong"),
            "application/json",
            None,
            body(),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = relay
        .send(report_request(&security_url(7), "application/json", None, body()))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = relay
        .send(report_request(
            &format!("/api/abc/security/?sentry_key={PUBLIC_KEY}"),
            "application/json",
            None,
            body(),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_header_and_route_aliases() {
    let mut relay = TestRelay::with_domains(&["*"]);
    for path in ["security", "csp-report/"] {
        let mut request = report_request(
            &format!("/api/{PROJECT_ID}/{path}"),
            "application/csp-report",
            None,
            load_fixture_text("csp", "input"),
        );
        request.headers_mut().insert(
            "x-sentry-auth",
            format!("Sentry sentry_version=7, sentry_key={PUBLIC_KEY}").parse().unwrap(),
        );

        let response = relay.send(request).await;
        assert_eq!(response.status(), StatusCode::OK, "path {path}");
        assert!(relay.next_event().is_some());
    }
}

#[tokio::test]
async fn test_reporting_api_format() {
    let mut relay = TestRelay::with_domains(&["sentry.io"]);
    let body = json!({
        "type": "csp-violation",
        "age": 10,
        "url": "https://sentry.io/",
        "user_agent": "Mozilla/5.0",
        "body": {
            "documentURL": "https://sentry.io/",
            "blockedURL": "https://cdn.example.net/lib.js",
            "effectiveDirective": "script-src-elem",
            "originalPolicy": "script-src 'self'",
            "disposition": "enforce",
            "statusCode": 200
        }
    });

    let response = relay
        .send(report_request(
            &security_url(PROJECT_ID),
            "application/reports+json",
            None,
            body.to_string(),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let event = relay.next_event().expect("no event emitted");
    assert_eq!(event["logentry"]["formatted"], "Blocked 'script' from 'cdn.example.net'");
    assert_eq!(event["csp"]["blocked_uri"], "https://cdn.example.net/lib.js");
    assert_eq!(event["csp"]["effective_directive"], "script-src-elem");
    assert_eq!(event["csp"]["status_code"], 200);

    // Browsers batch Reporting API payloads into an array.
    let response = relay
        .send(report_request(
            &security_url(PROJECT_ID),
            "application/reports+json",
            None,
            json!([body]).to_string(),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let event = relay.next_event().expect("no event emitted");
    assert_eq!(event["csp"]["blocked_uri"], "https://cdn.example.net/lib.js");
}

#[tokio::test]
async fn test_body_limit() {
    let mut config = test_config(&["*"]);
    config.limits.max_body_size = 64;
    let mut relay = TestRelay::new(config);

    let response = relay
        .send(report_request(
            &security_url(PROJECT_ID),
            "application/json",
            None,
            load_fixture_text("hpkp", "input"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response.headers().contains_key("access-control-expose-headers"));
    assert!(relay.next_event().is_none());
}

#[tokio::test]
async fn test_release_and_environment_aliases() {
    let mut relay = TestRelay::with_domains(&["*"]);
    let uri = format!("/api/{PROJECT_ID}/security/?sentry_key={PUBLIC_KEY}&release=2.0&environment=staging");
    relay
        .send(report_request(&uri, "application/json", None, load_fixture_text("hpkp", "input")))
        .await;

    let event = relay.next_event().expect("no event emitted");
    assert_eq!(event["release"], "2.0");
    assert_eq!(event["environment"], "staging");

    let uri = format!(
        "/api/{PROJECT_ID}/security/?sentry_key={PUBLIC_KEY}&sentry_release=3.0&release=2.0&environment=staging"
    );
    let response = relay
        .send(report_request(&uri, "application/json", None, load_fixture_text("hpkp", "input")))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let event = relay.next_event().expect("no event emitted");
    assert_eq!(event["release"], "3.0");
    assert_eq!(event["environment"], "staging");
}
