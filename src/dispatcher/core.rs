use crate::context::{GatewayResponse, InboundRequest, Phase, RequestContext, TRACE_ID_HEADER};
use crate::error::{DispatchError, DownstreamError, ErrorBody, StrategyPhase};
use crate::executor::DynExecutor;
use crate::format::Format;
use crate::monitor::{Monitor, NoopMonitor};
use crate::payload::Payload;
use crate::router::{ProtocolFamily, RouteTable};
use crate::strategy::{FeatureFlags, StrategyFactory, StrategyRegistry};
use bytes::Bytes;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Runs requests through classification, the strategy chain, the executor
/// and response encoding.
///
/// Built once with [`Dispatcher::builder`]; everything it holds is read-only
/// afterwards, so one instance serves all requests concurrently.
pub struct Dispatcher {
    routes: RouteTable,
    factory: StrategyFactory,
    executors: HashMap<ProtocolFamily, Arc<dyn DynExecutor>>,
    monitor: Arc<dyn Monitor>,
    max_body_bytes: Option<usize>,
}

impl Dispatcher {
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[must_use]
    pub fn factory(&self) -> &StrategyFactory {
        &self.factory
    }

    #[must_use]
    pub fn monitor(&self) -> &Arc<dyn Monitor> {
        &self.monitor
    }

    #[must_use]
    pub fn executor(&self, family: ProtocolFamily) -> Option<&Arc<dyn DynExecutor>> {
        self.executors.get(&family)
    }

    /// Dispatch a request that cannot be cancelled.
    pub async fn dispatch(&self, request: InboundRequest) -> GatewayResponse {
        self.dispatch_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Dispatch a request on its own task.
    ///
    /// The lifecycle runs to completion even if the caller stops waiting;
    /// cancel `token` to abort the downstream call, after which the post and
    /// completion phases still run.
    pub fn spawn(
        self: &Arc<Self>,
        request: InboundRequest,
        token: CancellationToken,
    ) -> JoinHandle<GatewayResponse> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.dispatch_with_cancel(request, token).await })
    }

    /// Dispatch a request, aborting the downstream call when `token` fires.
    pub async fn dispatch_with_cancel(
        &self,
        mut request: InboundRequest,
        token: CancellationToken,
    ) -> GatewayResponse {
        let route = self.routes.route(&request.path);
        let family = route.family;
        let remainder = route.remainder.to_string();
        let payload = request.take_payload();
        let ctx = RequestContext::from_request(&request, family, &remainder);
        let span = info_span!(
            "dispatch",
            trace_id = %ctx.trace_id(),
            family = %family,
            path = %request.path
        );
        self.run(ctx, payload, token).instrument(span).await
    }

    async fn run(
        &self,
        mut ctx: RequestContext,
        payload: Payload,
        token: CancellationToken,
    ) -> GatewayResponse {
        if !ctx.family().is_routable() {
            debug!(path = %ctx.path(), "No route for path");
            ctx.record_failure(DispatchError::Unroutable {
                path: ctx.path().to_string(),
            });
            ctx.set_phase(Phase::Completed);
            return self.respond(&ctx, None);
        }

        let chain = self.factory.for_family(ctx.family());

        // Pre-handling: stop at the first rejection or fault
        ctx.set_phase(Phase::PreHandling);
        let mut reached = 0;
        for strategy in &chain {
            reached += 1;
            // Only the rejecting strategy's own reason counts
            ctx.clear_rejection();
            match guarded(strategy.pre_handle(&mut ctx)).await {
                Ok(true) => ctx.clear_rejection(),
                Ok(false) => {
                    let reason = ctx.rejection().cloned().unwrap_or_default();
                    info!(
                        strategy = strategy.name(),
                        status = reason.status,
                        code = %reason.code,
                        "Request rejected"
                    );
                    ctx.record_failure(DispatchError::Rejected {
                        strategy: strategy.name().to_string(),
                        reason,
                    });
                    break;
                }
                Err(message) => {
                    error!(
                        strategy = strategy.name(),
                        phase = %StrategyPhase::PreHandle,
                        error = %message,
                        "Strategy fault"
                    );
                    ctx.record_failure(DispatchError::strategy_fault(
                        strategy.name(),
                        StrategyPhase::PreHandle,
                        message,
                    ));
                    break;
                }
            }
        }

        let mut result = None;
        if ctx.is_failed() {
            ctx.set_phase(Phase::Rejected);
        } else {
            ctx.set_phase(Phase::Approved);
            ctx.set_phase(Phase::Executing);
            match self.execute(&mut ctx, payload, &token).await {
                Ok(output) => result = Some(output),
                Err(err) => {
                    warn!(code = err.code(), error = %err, "Downstream call failed");
                    ctx.record_failure(err.into());
                }
            }
        }

        // Post-handling: only strategies whose pre_handle ran
        ctx.set_phase(Phase::PostHandling);
        for strategy in &chain[..reached] {
            if let Err(message) = guarded(strategy.post_handle(&mut ctx, result.as_ref())).await {
                error!(
                    strategy = strategy.name(),
                    phase = %StrategyPhase::PostHandle,
                    error = %message,
                    "Strategy fault"
                );
                ctx.record_failure(DispatchError::strategy_fault(
                    strategy.name(),
                    StrategyPhase::PostHandle,
                    message,
                ));
            }
        }

        // Encode before completion so strategies see serialization faults
        let format = ctx.selected_format();
        let encoded = match (&result, ctx.is_failed()) {
            (Some(output), false) => match format.encode(output) {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    ctx.record_failure(DispatchError::Serialization {
                        format: format.to_string(),
                        message: err.to_string(),
                    });
                    None
                }
            },
            _ => None,
        };

        ctx.set_phase(Phase::Completed);
        for strategy in &chain {
            let outcome = guarded(strategy.after_completion(&ctx, result.as_ref(), ctx.failure())).await;
            if let Err(message) = outcome {
                warn!(
                    strategy = strategy.name(),
                    phase = %StrategyPhase::AfterCompletion,
                    error = %message,
                    "Strategy fault ignored"
                );
            }
        }

        self.respond(&ctx, encoded)
    }

    async fn execute(
        &self,
        ctx: &mut RequestContext,
        payload: Payload,
        token: &CancellationToken,
    ) -> Result<Payload, DownstreamError> {
        let executor = self
            .executors
            .get(&ctx.family())
            .ok_or(DownstreamError::NotConfigured(ctx.family()))?;
        if let Some(limit) = self.max_body_bytes {
            let size = payload.to_bytes().len();
            if size > limit {
                return Err(DownstreamError::InvalidInput(format!(
                    "request body of {size} bytes exceeds the {limit} byte limit"
                )));
            }
        }
        let target = executor.build(ctx)?;
        debug!(target = %target, "Downstream target built");
        ctx.set_downstream_target(target);

        let ctx: &RequestContext = ctx;
        let call = AssertUnwindSafe(executor.execute(ctx, payload)).catch_unwind();
        tokio::select! {
            biased;
            () = token.cancelled() => Err(DownstreamError::Cancelled),
            outcome = call => outcome.unwrap_or_else(|panic| {
                error!(panic_message = panic_message(panic.as_ref()), "Executor panicked - CRITICAL");
                Err(DownstreamError::protocol(
                    ctx.downstream_target().map(ToString::to_string).unwrap_or_default(),
                    "executor panicked",
                ))
            }),
        }
    }

    /// Build the client response and record the request in the monitor.
    fn respond(&self, ctx: &RequestContext, encoded: Option<Bytes>) -> GatewayResponse {
        let format = ctx.selected_format();
        let mut response = match (ctx.failure(), encoded) {
            (None, Some(body)) => GatewayResponse::new(200, format.content_type(), body),
            (None, None) => GatewayResponse::new(200, format.content_type(), Bytes::new()),
            (Some(err), _) => error_response(ctx, err, format),
        };
        response.set_header(TRACE_ID_HEADER, ctx.trace_id().to_string());
        self.monitor.record_request(ctx.elapsed(), ctx.failure().is_none());
        response
    }

    /// Release every executor's resources.
    pub fn shutdown(&self) {
        for (family, executor) in &self.executors {
            if executor.destroy().is_some() {
                debug!(family = %family, "Executor returned final output on shutdown");
            }
        }
        info!(executors = self.executors.len(), "Dispatcher shut down");
    }
}

/// Render an error in the negotiated format, falling back to JSON.
fn error_response(ctx: &RequestContext, err: &DispatchError, format: Format) -> GatewayResponse {
    let status = err.status_code();
    let body = ErrorBody {
        code: err.code(),
        message: err.public_message(),
        trace_id: ctx.trace_id().to_string(),
    };
    let value = serde_json::to_value(&body).unwrap_or_default();
    match format.encode(&Payload::Json(value)) {
        Ok(bytes) => GatewayResponse::new(status, format.content_type(), bytes),
        Err(encode_err) => {
            let fallback = serde_json::json!({
                "code": "SERIALIZATION_ERROR",
                "message": encode_err.to_string(),
                "trace_id": ctx.trace_id().to_string(),
            });
            GatewayResponse::new(
                status,
                Format::Json.content_type(),
                Bytes::from(fallback.to_string()),
            )
        }
    }
}

/// Await a strategy hook, turning errors and panics into a message.
async fn guarded<T, F>(hook: F) -> Result<T, String>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match AssertUnwindSafe(hook).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(panic) => Err(format!("panicked: {}", panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Assembles a [`Dispatcher`].
pub struct DispatcherBuilder {
    routes: RouteTable,
    registry: Option<StrategyRegistry>,
    features: FeatureFlags,
    executors: HashMap<ProtocolFamily, Arc<dyn DynExecutor>>,
    monitor: Arc<dyn Monitor>,
    max_body_bytes: Option<usize>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            routes: RouteTable::standard(),
            registry: None,
            features: FeatureFlags::new(),
            executors: HashMap::new(),
            monitor: Arc::new(NoopMonitor),
            max_body_bytes: None,
        }
    }
}

impl DispatcherBuilder {
    /// Replace the standard route table.
    #[must_use]
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    #[must_use]
    pub fn strategies(mut self, registry: StrategyRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Register the executor for a family, replacing any previous one.
    #[must_use]
    pub fn executor(mut self, family: ProtocolFamily, executor: Arc<dyn DynExecutor>) -> Self {
        if self.executors.insert(family, executor).is_some() {
            warn!(family = %family, "Replaced existing executor");
        }
        self
    }

    #[must_use]
    pub fn monitor(mut self, monitor: Arc<dyn Monitor>) -> Self {
        self.monitor = monitor;
        self
    }

    #[must_use]
    pub fn max_body_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_body_bytes = limit;
        self
    }

    #[must_use]
    pub fn build(self) -> Dispatcher {
        let registry = self.registry.unwrap_or_else(StrategyRegistry::empty);
        let mut families: Vec<String> = self.executors.keys().map(ToString::to_string).collect();
        families.sort();
        info!(
            routes = self.routes.len(),
            strategies = registry.len(),
            features = self.features.len(),
            executors = ?families,
            "Dispatcher built"
        );
        Dispatcher {
            routes: self.routes,
            factory: StrategyFactory::new(registry, self.features),
            executors: self.executors,
            monitor: self.monitor,
            max_body_bytes: self.max_body_bytes,
        }
    }
}
