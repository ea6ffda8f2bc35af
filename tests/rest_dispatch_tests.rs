mod common;

use common::{closed_port, MockBackend, MockReply};
use http::Method;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use vortex::context::InboundRequest;
use vortex::executor::{erase, DownstreamAsset, RestExecutor, RetryPolicy};
use vortex::monitor::{AtomicMonitor, Monitor};
use vortex::strategy::{StrategyRegistry, TracingStrategy};
use vortex::{Dispatcher, ProtocolFamily, TraceId};

fn rest_dispatcher(asset: DownstreamAsset, monitor: Arc<AtomicMonitor>) -> Dispatcher {
    Dispatcher::builder()
        .strategies(
            StrategyRegistry::builder()
                .register_global(Arc::new(TracingStrategy))
                .build(),
        )
        .executor(ProtocolFamily::Rest, erase(RestExecutor::new(asset).unwrap()))
        .monitor(monitor)
        .build()
}

fn get(target: &str) -> InboundRequest {
    InboundRequest::from_target(Method::GET, target)
}

#[tokio::test]
async fn test_profile_lookup_defaults_to_json() {
    let backend = MockBackend::fixed(MockReply::json(200, json!({"name": "ada"})));
    let monitor = Arc::new(AtomicMonitor::new());
    let dispatcher = rest_dispatcher(backend.asset().with_path("/api"), monitor.clone());

    let response = dispatcher
        .dispatch(get("/router/rest/user/profile?method=user.get").with_header("X-Custom", "1"))
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type(), Some("application/json"));
    assert_eq!(response.json(), Some(json!({"name": "ada"})));

    let seen = backend.only_request();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.url, "/api/user/profile?method=user.get");
    assert_eq!(seen.header("x-custom"), Some("1"));
    assert_eq!(seen.header("x-trace-id"), response.trace_id());

    let summary = monitor.summary();
    assert_eq!(summary.requests_total, 1);
    assert_eq!(summary.requests_failed, 0);
}

#[tokio::test]
async fn test_upstream_request_id_is_reused() {
    let backend = MockBackend::fixed(MockReply::json(200, json!({})));
    let dispatcher = rest_dispatcher(backend.asset(), Arc::new(AtomicMonitor::new()));
    let upstream = TraceId::new().to_string();

    let response = dispatcher
        .dispatch(get("/router/rest/ping").with_header("X-Request-ID", upstream.clone()))
        .await;

    assert_eq!(response.trace_id(), Some(upstream.as_str()));
    assert_eq!(backend.only_request().header("X-Trace-ID"), Some(upstream.as_str()));
}

#[tokio::test]
async fn test_json_body_is_forwarded() {
    let backend = MockBackend::start(|req| MockReply::json(201, json!({"echo": req.json()})));
    let dispatcher = rest_dispatcher(backend.asset(), Arc::new(AtomicMonitor::new()));

    let request = InboundRequest::from_target(Method::POST, "/router/rest/users")
        .with_json(&json!({"name": "grace"}))
        .with_header("Proxy-Authorization", "Basic c2VjcmV0");
    let response = dispatcher.dispatch(request).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json(), Some(json!({"echo": {"name": "grace"}})));

    let seen = backend.only_request();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.header("content-type"), Some("application/json"));
    assert_eq!(seen.header("proxy-authorization"), None);
}

#[tokio::test]
async fn test_xml_format_is_negotiated() {
    let backend = MockBackend::fixed(MockReply::json(200, json!({"name": "ada"})));
    let dispatcher = rest_dispatcher(backend.asset(), Arc::new(AtomicMonitor::new()));

    let response = dispatcher
        .dispatch(get("/router/rest/user?method=user.get&format=XML"))
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type(), Some("application/xml;charset=UTF-8"));
    let body = String::from_utf8(response.body.to_vec()).unwrap();
    assert!(body.starts_with("<?xml"), "{body}");
    assert!(body.contains("<name>ada</name>"), "{body}");
    // The query string reaches the backend untouched
    assert_eq!(backend.only_request().url, "/user?method=user.get&format=XML");
}

#[tokio::test]
async fn test_binary_format_passes_raw_bodies() {
    let backend = MockBackend::fixed(MockReply::text(200, "hello"));
    let dispatcher = rest_dispatcher(backend.asset(), Arc::new(AtomicMonitor::new()));

    let response = dispatcher.dispatch(get("/router/rest/greeting?format=binary")).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type(), Some("application/octet-stream"));
    assert_eq!(&response.body[..], b"hello");
}

#[tokio::test]
async fn test_text_reply_under_default_format_is_json() {
    let backend = MockBackend::fixed(MockReply::text(200, "<html>hi</html>"));
    let dispatcher = rest_dispatcher(backend.asset(), Arc::new(AtomicMonitor::new()));

    let response = dispatcher.dispatch(get("/router/rest/page?method=page.get")).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type(), Some("application/json"));
    assert_eq!(response.json(), Some(json!("<html>hi</html>")));
}

#[tokio::test]
async fn test_backend_error_status_is_bad_gateway() {
    let backend = MockBackend::fixed(MockReply::text(503, "maintenance"));
    let monitor = Arc::new(AtomicMonitor::new());
    let dispatcher = rest_dispatcher(backend.asset(), monitor.clone());

    let response = dispatcher.dispatch(get("/router/rest/user")).await;

    assert_eq!(response.status, 502);
    let body = response.json().unwrap();
    assert_eq!(body["code"], "DOWNSTREAM_PROTOCOL_ERROR");
    assert_eq!(body["trace_id"].as_str(), response.trace_id());
    assert_eq!(monitor.summary().requests_failed, 1);
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let backend =
        MockBackend::fixed(MockReply::json(200, json!({})).delayed(Duration::from_millis(500)));
    let dispatcher = rest_dispatcher(
        backend.asset().with_timeout_ms(50),
        Arc::new(AtomicMonitor::new()),
    );

    let response = dispatcher.dispatch(get("/router/rest/slow")).await;

    assert_eq!(response.status, 504);
    let body = response.json().unwrap();
    assert_eq!(body["code"], "DOWNSTREAM_TIMEOUT");
    assert_eq!(body["message"], "downstream timed out");
}

#[tokio::test]
async fn test_refused_connection_is_unavailable() {
    let asset = DownstreamAsset::new("http", "127.0.0.1")
        .with_port(closed_port())
        .with_retry(RetryPolicy::new(3, 10));
    let dispatcher = rest_dispatcher(asset, Arc::new(AtomicMonitor::new()));

    let response = dispatcher.dispatch(get("/router/rest/user")).await;

    assert_eq!(response.status, 502);
    let body = response.json().unwrap();
    assert_eq!(body["code"], "DOWNSTREAM_UNAVAILABLE");
    assert_eq!(body["message"], "downstream unavailable");
    assert!(!String::from_utf8_lossy(&response.body).contains("127.0.0.1"));
}
