//! Trace ids and the headers that carry them across the gateway.
//!
//! Every request gets one [`TraceId`]. It is inherited from the first
//! inbound header in [`INBOUND_TRACE_HEADERS`] that holds a valid ULID,
//! otherwise minted fresh, and then propagated to the client and to every
//! downstream call under [`TRACE_ID_HEADER`]. MCP uses it as the JSON-RPC
//! request id and MQ as the message key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Header echoed on every response and sent on every downstream call.
pub const TRACE_ID_HEADER: &str = "X-Trace-ID";
/// Inbound headers that may carry an upstream trace id, in priority order.
pub const INBOUND_TRACE_HEADERS: [&str; 2] = ["X-Request-ID", "X-Trace-ID"];

/// ULID-backed trace identifier, serialized as its 26 character string.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TraceId(ulid::Ulid);

impl TraceId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// First valid id found under [`INBOUND_TRACE_HEADERS`].
    ///
    /// `header` looks a header up by name (case handling is up to the
    /// caller). A header holding something other than a ULID is skipped, so
    /// a malformed `X-Request-ID` falls through to `X-Trace-ID`.
    pub fn upstream<'h>(header: impl Fn(&str) -> Option<&'h str>) -> Option<Self> {
        INBOUND_TRACE_HEADERS
            .iter()
            .filter_map(|name| header(name))
            .find_map(|value| value.trim().parse().ok())
    }

    /// The upstream id when there is one, a fresh id otherwise.
    pub fn inherit<'h>(header: impl Fn(&str) -> Option<&'h str>) -> Self {
        Self::upstream(header).unwrap_or_default()
    }

    /// `(name, value)` pair for propagating the id downstream.
    #[must_use]
    pub fn header(&self) -> (&'static str, String) {
        (TRACE_ID_HEADER, self.to_string())
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TraceId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(Self)
    }
}

impl TryFrom<String> for TraceId {
    type Error = ulid::DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TraceId> for String {
    fn from(id: TraceId) -> Self {
        id.to_string()
    }
}
