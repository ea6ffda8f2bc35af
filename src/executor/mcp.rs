use super::http::{build_client, send};
use super::{target_of, DownstreamAsset, Executor, FromPayload};
use crate::context::RequestContext;
use crate::error::DownstreamError;
use crate::payload::Payload;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request sent to an MCP server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McpCall {
    pub jsonrpc: &'static str,
    pub id: String,
    pub method: String,
    pub params: Value,
}

impl FromPayload for McpCall {
    fn from_payload(ctx: &RequestContext, payload: Payload) -> Result<Self, DownstreamError> {
        let method = ctx
            .method()
            .ok_or_else(|| DownstreamError::InvalidInput("MCP call needs a 'method'".into()))?;
        let params = match Value::from_payload(ctx, payload)? {
            Value::Null => json!({}),
            other => other,
        };
        Ok(Self {
            jsonrpc: JSONRPC_VERSION,
            id: ctx.trace_id().to_string(),
            method: method.to_string(),
            params,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    /// `None` only when the member is absent; `"result": null` is `Some(Null)`
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Calls an MCP server over JSON-RPC 2.0 on HTTP.
///
/// The request id is the trace id and the JSON-RPC method is the `method`
/// request parameter. The `result` member is returned as-is; an `error`
/// member becomes a protocol error.
pub struct McpExecutor {
    asset: DownstreamAsset,
    client: reqwest::Client,
}

impl McpExecutor {
    pub fn new(asset: DownstreamAsset) -> anyhow::Result<Self> {
        Ok(Self::with_client(asset, build_client()?))
    }

    #[must_use]
    pub fn with_client(asset: DownstreamAsset, client: reqwest::Client) -> Self {
        Self { asset, client }
    }
}

#[async_trait]
impl Executor for McpExecutor {
    type Input = McpCall;
    type Output = Value;

    fn asset(&self) -> &DownstreamAsset {
        &self.asset
    }

    async fn execute(&self, ctx: &RequestContext, input: McpCall) -> Result<Value, DownstreamError> {
        let target = target_of(ctx)?;
        let body = serde_json::to_vec(&input)
            .map_err(|e| DownstreamError::InvalidInput(e.to_string()))?;
        let (trace_header, trace_id) = ctx.trace_id().header();
        let request = self
            .client
            .post(target.url())
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(trace_header, trace_id)
            .body(body);
        let reply = send(&self.asset, target, request).await?;
        let response: RpcResponse = serde_json::from_slice(&reply.body).map_err(|e| {
            DownstreamError::protocol(target.to_string(), format!("invalid JSON-RPC reply: {e}"))
        })?;
        if let Some(err) = response.error {
            return Err(DownstreamError::protocol(
                target.to_string(),
                format!("JSON-RPC error {}: {}", err.code, err.message),
            ));
        }
        response.result.ok_or_else(|| {
            DownstreamError::protocol(target.to_string(), "JSON-RPC reply has no result")
        })
    }
}
