use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::payload::Payload;
use async_trait::async_trait;

/// Order given to strategies that do not pick one. Lower runs first.
pub const DEFAULT_ORDER: i32 = 0;

/// Cross-cutting unit run around every dispatched request.
///
/// A strategy sees a request three times:
///
/// 1. `pre_handle` before the executor runs. Returning `Ok(false)` declines
///    the request; call [`RequestContext::reject`] first to say why. An
///    `Err` or a panic is treated as a fault and also stops the chain.
/// 2. `post_handle` after the executor (or after the chain stopped), for
///    every strategy whose `pre_handle` ran. The failure, if any, is on the
///    context.
/// 3. `after_completion` exactly once for every selected strategy, whatever
///    the outcome. Errors raised here are logged and dropped.
///
/// Strategies are registered once and shared by all requests, so any state
/// they keep must be synchronised.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Name used in logs and in rejection/fault reports.
    fn name(&self) -> &str;

    /// Static position in the chain; ties keep registration order.
    fn order(&self) -> i32 {
        DEFAULT_ORDER
    }

    async fn pre_handle(&self, _ctx: &mut RequestContext) -> anyhow::Result<bool> {
        Ok(true)
    }

    async fn post_handle(
        &self,
        _ctx: &mut RequestContext,
        _result: Option<&Payload>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn after_completion(
        &self,
        _ctx: &RequestContext,
        _result: Option<&Payload>,
        _failure: Option<&DispatchError>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}
