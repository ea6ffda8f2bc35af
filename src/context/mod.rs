//! # Context Module
//!
//! Per-request state and the transport-neutral request/response envelope.
//!
//! - [`InboundRequest`] is what a front end hands to the dispatcher: method,
//!   path, raw query string, headers and body.
//! - [`RequestContext`] is built from it once the path has been classified.
//!   It carries the trace id, resolved parameters (`method`, `format`, `v`,
//!   `sign`, `timestamp`, `api_key`), the negotiated [`Format`](crate::format::Format),
//!   the downstream target and the lifecycle [`Phase`].
//! - [`GatewayResponse`] is the encoded result, always stamped with
//!   `X-Trace-ID`.
//!
//! Headers are stored in a [`HeaderVec`], a `SmallVec` that stays on the
//! stack for up to 16 entries.

mod core;
mod envelope;

pub use core::{
    HeaderVec, ParamVec, Phase, RequestContext, DEFAULT_VERSION, HEADER_ACCESS_TOKEN,
    HEADER_REMOTE_CHANNEL, MAX_INLINE_HEADERS, MAX_INLINE_PARAMS, PARAM_API_KEY, PARAM_FORMAT,
    PARAM_METHOD, PARAM_SIGN, PARAM_TIMESTAMP, PARAM_VERSION,
};
pub use crate::ids::{INBOUND_TRACE_HEADERS, TRACE_ID_HEADER};
pub use envelope::{GatewayResponse, InboundRequest};
