use super::Strategy;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::payload::Payload;
use async_trait::async_trait;
use tracing::{info, warn};

pub const TRACING_ORDER: i32 = -1000;

/// Logs the start and outcome of every request.
pub struct TracingStrategy;

#[async_trait]
impl Strategy for TracingStrategy {
    fn name(&self) -> &str {
        "tracing"
    }

    fn order(&self) -> i32 {
        TRACING_ORDER
    }

    async fn pre_handle(&self, ctx: &mut RequestContext) -> anyhow::Result<bool> {
        info!(
            trace_id = %ctx.trace_id(),
            family = %ctx.family(),
            http_method = %ctx.http_method(),
            path = %ctx.path(),
            method = ctx.method().unwrap_or_default(),
            version = ctx.version(),
            channel = ctx.remote_channel().unwrap_or_default(),
            "Request start"
        );
        Ok(true)
    }

    async fn after_completion(
        &self,
        ctx: &RequestContext,
        _result: Option<&Payload>,
        failure: Option<&DispatchError>,
    ) -> anyhow::Result<()> {
        let latency_ms = ctx.elapsed().as_millis() as u64;
        match failure {
            None => info!(
                trace_id = %ctx.trace_id(),
                family = %ctx.family(),
                target = ctx.downstream_target().map(ToString::to_string).unwrap_or_default(),
                format = %ctx.selected_format(),
                latency_ms,
                "Request complete"
            ),
            Some(err) => warn!(
                trace_id = %ctx.trace_id(),
                family = %ctx.family(),
                status = err.status_code(),
                code = err.code(),
                error = %err,
                latency_ms,
                "Request failed"
            ),
        }
        Ok(())
    }
}
