use super::{target_of, DownstreamAsset, Executor, FromPayload, TargetAddress};
use crate::context::{RequestContext, TRACE_ID_HEADER};
use crate::error::DownstreamError;
use crate::payload::Payload;
use async_trait::async_trait;
use bytes::Bytes;

/// One unary RPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcCall {
    /// Fully qualified method, e.g. `/pkg.Service/Method`
    pub method: String,
    pub metadata: Vec<(String, String)>,
    pub message: Bytes,
}

impl FromPayload for RpcCall {
    fn from_payload(ctx: &RequestContext, payload: Payload) -> Result<Self, DownstreamError> {
        let method = ctx
            .method()
            .ok_or_else(|| DownstreamError::InvalidInput("gRPC call needs a 'method'".into()))?;
        let method = if method.starts_with('/') {
            method.to_string()
        } else {
            format!("/{method}")
        };
        Ok(Self {
            method,
            metadata: vec![(
                TRACE_ID_HEADER.to_ascii_lowercase(),
                ctx.trace_id().to_string(),
            )],
            message: payload.to_bytes(),
        })
    }
}

/// Wire-level client for unary gRPC calls.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    async fn unary(&self, target: &TargetAddress, call: RpcCall) -> Result<Bytes, DownstreamError>;
}

/// Unary gRPC calls through a pluggable transport.
pub struct GrpcExecutor<T> {
    asset: DownstreamAsset,
    transport: T,
}

impl<T: RpcTransport> GrpcExecutor<T> {
    pub fn new(asset: DownstreamAsset, transport: T) -> Self {
        Self { asset, transport }
    }
}

#[async_trait]
impl<T: RpcTransport> Executor for GrpcExecutor<T> {
    type Input = RpcCall;
    type Output = Bytes;

    fn asset(&self) -> &DownstreamAsset {
        &self.asset
    }

    async fn execute(&self, ctx: &RequestContext, input: RpcCall) -> Result<Bytes, DownstreamError> {
        let target = target_of(ctx)?;
        self.transport.unary(target, input).await
    }
}
