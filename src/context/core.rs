use super::envelope::InboundRequest;
use crate::error::{DispatchError, Rejection};
use crate::executor::TargetAddress;
use crate::format::Format;
use crate::ids::TraceId;
use crate::router::ProtocolFamily;
use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;
/// Maximum inline request parameters before heap allocation
pub const MAX_INLINE_PARAMS: usize = 8;

/// Header storage with shared names; lookups are case-insensitive.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;
/// Request parameter storage; lookups are exact.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

pub const PARAM_METHOD: &str = "method";
pub const PARAM_FORMAT: &str = "format";
pub const PARAM_VERSION: &str = "v";
pub const PARAM_SIGN: &str = "sign";
pub const PARAM_TIMESTAMP: &str = "timestamp";
pub const PARAM_API_KEY: &str = "api_key";
pub const HEADER_ACCESS_TOKEN: &str = "X-Access-Token";
pub const HEADER_REMOTE_CHANNEL: &str = "x_remote_channel";
pub const DEFAULT_VERSION: &str = "1.0";

/// Lifecycle phase of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Created,
    PreHandling,
    Approved,
    Rejected,
    Executing,
    PostHandling,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::PreHandling => "pre_handling",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Executing => "executing",
            Self::PostHandling => "post_handling",
            Self::Completed => "completed",
        })
    }
}

/// Request-scoped state threaded through the strategy chain and executor.
///
/// One context exists per inbound request and is owned by the dispatcher
/// invocation handling it. Strategies receive `&mut` access while the
/// request is in flight and shared access once it has completed.
///
/// The trace id, method, start instant, path and family are fixed at
/// construction; everything else is scratch space for the chain.
#[derive(Debug)]
pub struct RequestContext {
    trace_id: TraceId,
    http_method: Method,
    started_at: Instant,
    path: String,
    family: ProtocolFamily,
    remainder: String,
    query: Option<String>,
    headers: HeaderVec,
    params: ParamVec,
    selected_format: Format,
    downstream_target: Option<TargetAddress>,
    attributes: HashMap<String, String>,
    rejection: Option<Rejection>,
    failure: Option<DispatchError>,
    phase: Phase,
}

impl RequestContext {
    /// Create a bare context with a fresh start instant.
    #[must_use]
    pub fn new(
        trace_id: TraceId,
        http_method: Method,
        path: impl Into<String>,
        family: ProtocolFamily,
    ) -> Self {
        Self {
            trace_id,
            http_method,
            started_at: Instant::now(),
            path: path.into(),
            family,
            remainder: String::new(),
            query: None,
            headers: HeaderVec::new(),
            params: ParamVec::new(),
            selected_format: Format::default(),
            downstream_target: None,
            attributes: HashMap::new(),
            rejection: None,
            failure: None,
            phase: Phase::Created,
        }
    }

    /// Build the context for an inbound request.
    ///
    /// Query parameters become request parameters (last occurrence wins on
    /// lookup), the trace id is reused from the request headers when valid,
    /// and the response format is resolved from the `format` parameter.
    #[must_use]
    pub fn from_request(
        request: &InboundRequest,
        family: ProtocolFamily,
        remainder: &str,
    ) -> Self {
        let trace_id = TraceId::inherit(|name| request.get_header(name));
        let mut ctx = Self::new(trace_id, request.method.clone(), &request.path, family);
        ctx.remainder = remainder.to_string();
        ctx.query.clone_from(&request.query);
        ctx.headers = request.headers.clone();
        for (k, v) in request.query_pairs() {
            ctx.params.push((Arc::from(k.as_str()), v));
        }
        ctx.selected_format = Format::resolve(ctx.param(PARAM_FORMAT));
        ctx
    }

    #[inline]
    #[must_use]
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    #[inline]
    #[must_use]
    pub fn http_method(&self) -> &Method {
        &self.http_method
    }

    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Time since the context was created, on the monotonic clock.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn family(&self) -> ProtocolFamily {
        self.family
    }

    /// Path left after the routing prefix, used to build downstream paths.
    #[must_use]
    pub fn remainder(&self) -> &str {
        &self.remainder
    }

    /// Raw query string of the inbound request.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
    }

    /// Get a request parameter by name.
    ///
    /// Uses "last write wins" semantics: `?method=a&method=b` yields `b`.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_param(&mut self, name: &str, value: impl Into<String>) {
        self.params.retain(|(k, _)| k.as_ref() != name);
        self.params.push((Arc::from(name), value.into()));
    }

    #[must_use]
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    /// Logical operation name requested by the client.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.param(PARAM_METHOD).filter(|m| !m.is_empty())
    }

    /// Raw `format` token, before negotiation.
    #[must_use]
    pub fn format(&self) -> Option<&str> {
        self.param(PARAM_FORMAT)
    }

    /// API version, `"1.0"` unless the client sent one.
    #[must_use]
    pub fn version(&self) -> &str {
        self.param(PARAM_VERSION)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_VERSION)
    }

    #[must_use]
    pub fn sign(&self) -> Option<&str> {
        self.param(PARAM_SIGN)
    }

    #[must_use]
    pub fn timestamp(&self) -> Option<&str> {
        self.param(PARAM_TIMESTAMP)
    }

    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.param(PARAM_API_KEY)
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.header(HEADER_ACCESS_TOKEN)
    }

    #[must_use]
    pub fn remote_channel(&self) -> Option<&str> {
        self.header(HEADER_REMOTE_CHANNEL)
    }

    #[must_use]
    pub fn selected_format(&self) -> Format {
        self.selected_format
    }

    pub fn set_selected_format(&mut self, format: Format) {
        self.selected_format = format;
    }

    /// Downstream target, populated once the executor has built it.
    #[must_use]
    pub fn downstream_target(&self) -> Option<&TargetAddress> {
        self.downstream_target.as_ref()
    }

    pub(crate) fn set_downstream_target(&mut self, target: TargetAddress) {
        self.downstream_target = Some(target);
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Stash a value for strategies that run later in the chain.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Record why the current strategy is about to decline the request.
    ///
    /// Takes effect only when the same `pre_handle` then returns
    /// `Ok(false)`; a strategy that rejects without calling this gets the
    /// default 403 rejection.
    pub fn reject(&mut self, reason: Rejection) {
        self.rejection = Some(reason);
    }

    pub(crate) fn clear_rejection(&mut self) {
        self.rejection = None;
    }

    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }

    /// Failure that ended the request, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&DispatchError> {
        self.failure.as_ref()
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Record the failure unless one is already recorded; the first cause wins.
    pub(crate) fn record_failure(&mut self, error: DispatchError) {
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }
}
