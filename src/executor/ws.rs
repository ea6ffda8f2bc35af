use super::{target_of, DownstreamAsset, Executor, FromPayload, TargetAddress};
use crate::context::RequestContext;
use crate::error::DownstreamError;
use crate::payload::Payload;
use async_trait::async_trait;
use futures::SinkExt;
use serde_json::Value;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::debug;

/// Text frames relayed to a WebSocket backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WsSession {
    pub frames: Vec<String>,
}

impl FromPayload for WsSession {
    /// A JSON array of strings is sent frame by frame; any other JSON value
    /// is one frame of its text. Raw bodies must be UTF-8.
    fn from_payload(_ctx: &RequestContext, payload: Payload) -> Result<Self, DownstreamError> {
        let frames = match payload {
            Payload::Empty => Vec::new(),
            Payload::Json(Value::Array(items)) if items.iter().all(Value::is_string) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            Payload::Json(value) => vec![value.to_string()],
            Payload::Bytes(bytes) => vec![String::from_utf8(bytes.to_vec()).map_err(|_| {
                DownstreamError::InvalidInput("WebSocket frames must be UTF-8".into())
            })?],
        };
        Ok(Self { frames })
    }
}

fn map_ws_error(target: &TargetAddress, err: tungstenite::Error) -> DownstreamError {
    match err {
        tungstenite::Error::Io(io) => DownstreamError::connection(target.to_string(), io.to_string()),
        other => DownstreamError::protocol(target.to_string(), other.to_string()),
    }
}

/// Relays text frames to a WebSocket backend and closes the connection.
pub struct WsExecutor {
    asset: DownstreamAsset,
}

impl WsExecutor {
    #[must_use]
    pub fn new(asset: DownstreamAsset) -> Self {
        Self { asset }
    }
}

#[async_trait]
impl Executor for WsExecutor {
    type Input = WsSession;
    type Output = ();

    fn asset(&self) -> &DownstreamAsset {
        &self.asset
    }

    async fn execute(&self, ctx: &RequestContext, input: WsSession) -> Result<(), DownstreamError> {
        let target = target_of(ctx)?;
        let (mut stream, _response) = tokio_tungstenite::connect_async(target.url())
            .await
            .map_err(|e| map_ws_error(target, e))?;
        let sent = input.frames.len();
        for frame in input.frames {
            stream
                .send(Message::Text(frame))
                .await
                .map_err(|e| map_ws_error(target, e))?;
        }
        stream
            .close(None)
            .await
            .map_err(|e| map_ws_error(target, e))?;
        debug!(trace_id = %ctx.trace_id(), target = %target, frames = sent, "WebSocket relay complete");
        Ok(())
    }
}
