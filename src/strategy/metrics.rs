use super::Strategy;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::monitor::Monitor;
use crate::payload::Payload;
use async_trait::async_trait;
use std::sync::Arc;

pub const METRICS_ORDER: i32 = 1000;

/// Records one `<router>.dispatch` operation per completed request.
pub struct MetricsStrategy {
    monitor: Arc<dyn Monitor>,
}

impl MetricsStrategy {
    #[must_use]
    pub fn new(monitor: Arc<dyn Monitor>) -> Self {
        Self { monitor }
    }
}

#[async_trait]
impl Strategy for MetricsStrategy {
    fn name(&self) -> &str {
        "metrics"
    }

    fn order(&self) -> i32 {
        METRICS_ORDER
    }

    async fn after_completion(
        &self,
        ctx: &RequestContext,
        result: Option<&Payload>,
        _failure: Option<&DispatchError>,
    ) -> anyhow::Result<()> {
        let operation = format!("{}.dispatch", ctx.family().router_name());
        let rows = result.map_or(0, Payload::row_count);
        self.monitor.record_operation(&operation, ctx.elapsed(), rows);
        Ok(())
    }
}
