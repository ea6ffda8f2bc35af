use super::http::{build_client, send, HttpReply};
use super::{target_of, DownstreamAsset, Executor, FromPayload};
use crate::context::RequestContext;
use crate::error::DownstreamError;
use crate::payload::Payload;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Chat completion request body, an OpenAI-compatible JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest(pub Map<String, Value>);

impl FromPayload for ChatRequest {
    fn from_payload(ctx: &RequestContext, payload: Payload) -> Result<Self, DownstreamError> {
        match Value::from_payload(ctx, payload)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(DownstreamError::InvalidInput(
                "LLM request body must be a JSON object".into(),
            )),
        }
    }
}

/// Proxies chat completion calls to an OpenAI-compatible backend.
///
/// The asset's `model` is filled in when the request omits one and its
/// `credential` is sent as a bearer token.
pub struct LlmExecutor {
    asset: DownstreamAsset,
    client: reqwest::Client,
}

impl LlmExecutor {
    pub fn new(asset: DownstreamAsset) -> anyhow::Result<Self> {
        Ok(Self::with_client(asset, build_client()?))
    }

    #[must_use]
    pub fn with_client(asset: DownstreamAsset, client: reqwest::Client) -> Self {
        Self { asset, client }
    }
}

#[async_trait]
impl Executor for LlmExecutor {
    type Input = ChatRequest;
    type Output = HttpReply;

    fn asset(&self) -> &DownstreamAsset {
        &self.asset
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        input: ChatRequest,
    ) -> Result<HttpReply, DownstreamError> {
        let target = target_of(ctx)?;
        let mut body = input.0;
        if let Some(model) = &self.asset.model {
            body.entry("model")
                .or_insert_with(|| Value::String(model.clone()));
        }
        let (trace_header, trace_id) = ctx.trace_id().header();
        let mut request = self
            .client
            .post(target.url())
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(trace_header, trace_id)
            .body(Value::Object(body).to_string());
        if let Some(credential) = &self.asset.credential {
            request = request.bearer_auth(credential);
        }
        send(&self.asset, target, request).await
    }
}
