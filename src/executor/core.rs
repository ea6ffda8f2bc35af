use super::{DownstreamAsset, TargetAddress};
use crate::context::RequestContext;
use crate::error::DownstreamError;
use crate::payload::Payload;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Conversion from the dispatcher's payload into an executor input.
///
/// The context is available so inputs can pick up the request method,
/// headers and parameters.
pub trait FromPayload: Sized {
    fn from_payload(ctx: &RequestContext, payload: Payload) -> Result<Self, DownstreamError>;
}

/// Conversion from an executor output back into a payload.
pub trait IntoPayload {
    fn into_payload(self) -> Payload;
}

impl FromPayload for Payload {
    fn from_payload(_ctx: &RequestContext, payload: Payload) -> Result<Self, DownstreamError> {
        Ok(payload)
    }
}

impl FromPayload for Value {
    fn from_payload(_ctx: &RequestContext, payload: Payload) -> Result<Self, DownstreamError> {
        match payload {
            Payload::Empty => Ok(Value::Null),
            Payload::Json(v) => Ok(v),
            Payload::Bytes(b) => serde_json::from_slice(&b)
                .map_err(|e| DownstreamError::InvalidInput(format!("body is not JSON: {e}"))),
        }
    }
}

impl FromPayload for Bytes {
    fn from_payload(_ctx: &RequestContext, payload: Payload) -> Result<Self, DownstreamError> {
        Ok(payload.to_bytes())
    }
}

impl<T: Into<Payload>> IntoPayload for T {
    fn into_payload(self) -> Payload {
        self.into()
    }
}

/// Protocol-specific downstream caller.
///
/// `Input` and `Output` are the executor's own types; the dispatcher only
/// deals in [`Payload`]s and reaches executors through [`DynExecutor`],
/// usually by wrapping them in [`Erased`].
///
/// Timeout and retry are applied by [`Erased`] around `execute`, so
/// implementations make a single attempt.
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    type Input: FromPayload + Clone + Send + Sync + 'static;
    type Output: IntoPayload + Send + 'static;

    /// Backend configuration this executor calls.
    fn asset(&self) -> &DownstreamAsset;

    /// Resolve the downstream address for a request.
    fn build(&self, ctx: &RequestContext) -> Result<TargetAddress, DownstreamError> {
        TargetAddress::compose(self.asset(), ctx.remainder())
    }

    /// Make one call to the address stored on the context by `build`.
    async fn execute(
        &self,
        ctx: &RequestContext,
        input: Self::Input,
    ) -> Result<Self::Output, DownstreamError>;

    /// Release resources; may hand back a final output. Called at most once
    /// through [`Erased`].
    fn destroy(&self) -> Option<Self::Output> {
        None
    }
}

/// Address the executor should call, as stored on the context by `build`.
pub fn target_of(ctx: &RequestContext) -> Result<&TargetAddress, DownstreamError> {
    ctx.downstream_target()
        .ok_or(DownstreamError::NotConfigured(ctx.family()))
}

/// Object-safe view of an executor, payload in and payload out.
#[async_trait]
pub trait DynExecutor: Send + Sync {
    fn asset(&self) -> &DownstreamAsset;

    fn build(&self, ctx: &RequestContext) -> Result<TargetAddress, DownstreamError>;

    /// Execute under the asset's timeout and retry policy.
    async fn execute(&self, ctx: &RequestContext, payload: Payload)
        -> Result<Payload, DownstreamError>;

    fn destroy(&self) -> Option<Payload>;
}

/// Adapter from a typed [`Executor`] to [`DynExecutor`].
pub struct Erased<E> {
    inner: E,
    destroyed: AtomicBool,
}

impl<E: Executor> Erased<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

#[async_trait]
impl<E: Executor> DynExecutor for Erased<E> {
    fn asset(&self) -> &DownstreamAsset {
        self.inner.asset()
    }

    fn build(&self, ctx: &RequestContext) -> Result<TargetAddress, DownstreamError> {
        self.inner.build(ctx)
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        payload: Payload,
    ) -> Result<Payload, DownstreamError> {
        let input = E::Input::from_payload(ctx, payload)?;
        let asset = self.inner.asset();
        let timeout = asset.timeout();
        let max_attempts = asset.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let outcome = match tokio::time::timeout(timeout, self.inner.execute(ctx, input.clone()))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(DownstreamError::Timeout {
                    target: ctx
                        .downstream_target()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                    timeout_ms: asset.timeout_ms(),
                }),
            };
            match outcome {
                Ok(output) => {
                    debug!(trace_id = %ctx.trace_id(), attempt, "Downstream call succeeded");
                    return Ok(output.into_payload());
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    warn!(
                        trace_id = %ctx.trace_id(),
                        attempt,
                        max_attempts,
                        backoff_ms = asset.retry.backoff_ms,
                        error = %err,
                        "Downstream call failed - retrying"
                    );
                    tokio::time::sleep(asset.retry.backoff()).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn destroy(&self) -> Option<Payload> {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return None;
        }
        self.inner.destroy().map(IntoPayload::into_payload)
    }
}
