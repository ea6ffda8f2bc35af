mod common;

use futures::StreamExt;
use http::Method;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use vortex::context::InboundRequest;
use vortex::executor::{erase, DownstreamAsset, WsExecutor};
use vortex::{Dispatcher, ProtocolFamily};

/// Accept one WebSocket session and report its text frames once it closes.
async fn ws_backend() -> (u16, oneshot::Receiver<(String, Vec<String>)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut path = String::new();
        let record_path = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            path = req.uri().path().to_string();
            Ok(resp)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(stream, record_path)
            .await
            .unwrap();
        let mut frames = Vec::new();
        while let Some(Ok(message)) = ws.next().await {
            match message {
                Message::Text(text) => frames.push(text.to_string()),
                Message::Close(_) => break,
                _ => {}
            }
        }
        let _ = tx.send((path, frames));
    });
    (port, rx)
}

fn ws_dispatcher(asset: DownstreamAsset) -> Dispatcher {
    Dispatcher::builder()
        .executor(ProtocolFamily::Ws, erase(WsExecutor::new(asset)))
        .build()
}

#[tokio::test]
async fn test_frames_are_relayed_in_order() {
    let (port, frames) = ws_backend().await;
    let dispatcher = ws_dispatcher(DownstreamAsset::new("ws", "127.0.0.1").with_port(port));

    let request = InboundRequest::from_target(Method::POST, "/router/ws/chat?method=relay")
        .with_json(&json!(["hello", "world"]));
    let response = dispatcher.dispatch(request).await;

    assert_eq!(response.status, 200);
    assert!(response.body.is_empty());
    let (path, frames) = frames.await.unwrap();
    assert_eq!(path, "/chat");
    assert_eq!(frames, vec!["hello", "world"]);
}

#[tokio::test]
async fn test_json_object_is_a_single_frame() {
    let (port, frames) = ws_backend().await;
    let dispatcher = ws_dispatcher(DownstreamAsset::new("ws", "127.0.0.1").with_port(port));

    let request = InboundRequest::from_target(Method::POST, "/router/ws")
        .with_json(&json!({"op": "subscribe"}));
    let response = dispatcher.dispatch(request).await;

    assert_eq!(response.status, 200);
    assert_eq!(frames.await.unwrap().1, vec![r#"{"op":"subscribe"}"#]);
}

#[tokio::test]
async fn test_unreachable_backend_is_unavailable() {
    let port = common::closed_port();
    let dispatcher = ws_dispatcher(DownstreamAsset::new("ws", "127.0.0.1").with_port(port));

    let response = dispatcher
        .dispatch(InboundRequest::from_target(Method::GET, "/router/ws"))
        .await;

    assert_eq!(response.status, 502);
    assert_eq!(response.json().unwrap()["code"], "DOWNSTREAM_UNAVAILABLE");
}
