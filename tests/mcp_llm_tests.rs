mod common;

use common::{MockBackend, MockReply};
use http::Method;
use serde_json::json;
use std::sync::Arc;
use vortex::context::InboundRequest;
use vortex::executor::{erase, LlmExecutor, McpExecutor};
use vortex::strategy::{RequiredParamsStrategy, StrategyRegistry};
use vortex::{Dispatcher, ProtocolFamily};

#[tokio::test]
async fn test_mcp_call_is_json_rpc() {
    let backend = MockBackend::start(|req| {
        let call = req.json();
        MockReply::json(
            200,
            json!({"jsonrpc": "2.0", "id": call["id"], "result": {"tools": ["search"]}}),
        )
    });
    let dispatcher = Dispatcher::builder()
        .executor(
            ProtocolFamily::Mcp,
            erase(McpExecutor::new(backend.asset().with_path("/mcp")).unwrap()),
        )
        .build();

    let request = InboundRequest::from_target(Method::POST, "/router/mcp?method=tools/list")
        .with_json(&json!({"cursor": null}));
    let response = dispatcher.dispatch(request).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json(), Some(json!({"tools": ["search"]})));

    let seen = backend.only_request();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.url, "/mcp");
    let call = seen.json();
    assert_eq!(call["jsonrpc"], "2.0");
    assert_eq!(call["method"], "tools/list");
    assert_eq!(call["id"].as_str(), response.trace_id());
    assert_eq!(call["params"], json!({"cursor": null}));
}

#[tokio::test]
async fn test_mcp_null_result_is_success() {
    let backend = MockBackend::start(|req| {
        MockReply::json(200, json!({"jsonrpc": "2.0", "id": req.json()["id"], "result": null}))
    });
    let dispatcher = Dispatcher::builder()
        .executor(ProtocolFamily::Mcp, erase(McpExecutor::new(backend.asset()).unwrap()))
        .build();

    let response = dispatcher
        .dispatch(InboundRequest::from_target(Method::POST, "/router/mcp?method=notify"))
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json(), Some(serde_json::Value::Null));
}

#[tokio::test]
async fn test_mcp_reply_without_result_is_bad_gateway() {
    let backend = MockBackend::fixed(MockReply::json(200, json!({"jsonrpc": "2.0", "id": "1"})));
    let dispatcher = Dispatcher::builder()
        .executor(ProtocolFamily::Mcp, erase(McpExecutor::new(backend.asset()).unwrap()))
        .build();

    let response = dispatcher
        .dispatch(InboundRequest::from_target(Method::POST, "/router/mcp?method=notify"))
        .await;

    assert_eq!(response.status, 502);
    assert_eq!(response.json().unwrap()["code"], "DOWNSTREAM_PROTOCOL_ERROR");
}

#[tokio::test]
async fn test_mcp_error_member_is_bad_gateway() {
    let backend = MockBackend::fixed(MockReply::json(
        200,
        json!({"jsonrpc": "2.0", "id": "1", "error": {"code": -32601, "message": "Method not found"}}),
    ));
    let dispatcher = Dispatcher::builder()
        .executor(ProtocolFamily::Mcp, erase(McpExecutor::new(backend.asset()).unwrap()))
        .build();

    let response = dispatcher
        .dispatch(InboundRequest::from_target(Method::POST, "/router/mcp?method=nope"))
        .await;

    assert_eq!(response.status, 502);
    let body = response.json().unwrap();
    assert_eq!(body["code"], "DOWNSTREAM_PROTOCOL_ERROR");
    assert_eq!(body["message"], "downstream returned an invalid response");
    assert!(!String::from_utf8_lossy(&response.body).contains("127.0.0.1"));
}

#[tokio::test]
async fn test_mcp_without_method_is_rejected_by_strategy() {
    let backend = MockBackend::fixed(MockReply::json(200, json!({"result": 1})));
    let dispatcher = Dispatcher::builder()
        .strategies(
            StrategyRegistry::builder()
                .register_global(Arc::new(RequiredParamsStrategy::default()))
                .build(),
        )
        .executor(ProtocolFamily::Mcp, erase(McpExecutor::new(backend.asset()).unwrap()))
        .build();

    let response = dispatcher
        .dispatch(InboundRequest::from_target(Method::POST, "/router/mcp?method="))
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(response.json().unwrap()["code"], "MISSING_PARAMETER");
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_llm_request_gets_model_and_bearer() {
    let backend = MockBackend::fixed(MockReply::json(
        200,
        json!({"choices": [{"message": {"role": "assistant", "content": "hi"}}]}),
    ));
    let asset = backend
        .asset()
        .with_path("/v1/chat/completions")
        .with_credential("sk-local")
        .with_model("small");
    let dispatcher = Dispatcher::builder()
        .executor(ProtocolFamily::Llm, erase(LlmExecutor::new(asset).unwrap()))
        .build();

    let request = InboundRequest::from_target(Method::POST, "/router/llm?method=chat")
        .with_json(&json!({"messages": [{"role": "user", "content": "hello"}]}));
    let response = dispatcher.dispatch(request).await;

    assert_eq!(response.status, 200);
    assert_eq!(
        response.json().unwrap()["choices"][0]["message"]["content"],
        "hi"
    );

    let seen = backend.only_request();
    assert_eq!(seen.url, "/v1/chat/completions");
    assert_eq!(seen.header("authorization"), Some("Bearer sk-local"));
    let body = seen.json();
    assert_eq!(body["model"], "small");
    assert_eq!(body["messages"][0]["content"], "hello");
}

#[tokio::test]
async fn test_llm_keeps_requested_model() {
    let backend = MockBackend::fixed(MockReply::json(200, json!({})));
    let dispatcher = Dispatcher::builder()
        .executor(
            ProtocolFamily::Llm,
            erase(LlmExecutor::new(backend.asset().with_model("small")).unwrap()),
        )
        .build();

    let request = InboundRequest::from_target(Method::POST, "/router/llm")
        .with_json(&json!({"model": "large", "messages": []}));
    let response = dispatcher.dispatch(request).await;

    assert_eq!(response.status, 200);
    let seen = backend.only_request();
    assert_eq!(seen.json()["model"], "large");
    assert_eq!(seen.header("authorization"), None);
}

#[tokio::test]
async fn test_llm_rejects_non_object_body() {
    let backend = MockBackend::fixed(MockReply::json(200, json!({})));
    let dispatcher = Dispatcher::builder()
        .executor(ProtocolFamily::Llm, erase(LlmExecutor::new(backend.asset()).unwrap()))
        .build();

    let request =
        InboundRequest::from_target(Method::POST, "/router/llm").with_json(&json!(["hello"]));
    let response = dispatcher.dispatch(request).await;

    assert_eq!(response.status, 400);
    assert_eq!(response.json().unwrap()["code"], "INVALID_INPUT");
    assert!(backend.requests().is_empty());
}
