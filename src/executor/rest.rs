use super::http::{build_client, is_forwardable, send, HttpReply};
use super::{target_of, DownstreamAsset, Executor, FromPayload};
use crate::context::{RequestContext, TRACE_ID_HEADER};
use crate::error::DownstreamError;
use crate::payload::Payload;
use async_trait::async_trait;
use http::Method;

/// One proxied HTTP call.
#[derive(Debug, Clone)]
pub struct RestCall {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub query: Option<String>,
    pub body: Payload,
}

impl FromPayload for RestCall {
    fn from_payload(ctx: &RequestContext, payload: Payload) -> Result<Self, DownstreamError> {
        let headers = ctx
            .headers()
            .iter()
            .filter(|(k, _)| is_forwardable(k) && !k.eq_ignore_ascii_case(TRACE_ID_HEADER))
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Ok(Self {
            method: ctx.http_method().clone(),
            headers,
            query: ctx.query().map(str::to_string),
            body: payload,
        })
    }
}

pub type RestReply = HttpReply;

/// Forwards requests to an HTTP backend, keeping method, headers, query and
/// body.
pub struct RestExecutor {
    asset: DownstreamAsset,
    client: reqwest::Client,
}

impl RestExecutor {
    pub fn new(asset: DownstreamAsset) -> anyhow::Result<Self> {
        Ok(Self::with_client(asset, build_client()?))
    }

    #[must_use]
    pub fn with_client(asset: DownstreamAsset, client: reqwest::Client) -> Self {
        Self { asset, client }
    }
}

#[async_trait]
impl Executor for RestExecutor {
    type Input = RestCall;
    type Output = RestReply;

    fn asset(&self) -> &DownstreamAsset {
        &self.asset
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        input: RestCall,
    ) -> Result<RestReply, DownstreamError> {
        let target = target_of(ctx)?;
        let url = target.url_with_query(input.query.as_deref());
        let mut request = self.client.request(input.method, url);
        for (name, value) in &input.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let (trace_header, trace_id) = ctx.trace_id().header();
        request = request.header(trace_header, trace_id);
        let has_content_type = input
            .headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("content-type"));
        request = match input.body {
            Payload::Empty => request,
            Payload::Json(value) if has_content_type => request.body(value.to_string()),
            Payload::Json(value) => request
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(value.to_string()),
            Payload::Bytes(bytes) => request.body(bytes),
        };
        send(&self.asset, target, request).await
    }
}
