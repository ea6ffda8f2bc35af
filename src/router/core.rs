//! Router core module - hot path for request classification.
//!
//! Classification is a first-match scan over a short, longest-first prefix
//! table. No allocation happens while matching; [`RouteMatch`] borrows the
//! remainder from the request path.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Downstream protocol family a request is routed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolFamily {
    /// Plain HTTP proxying
    Rest,
    /// Message-queue publish
    Mq,
    /// JSON-RPC based model context protocol
    Mcp,
    /// Unary gRPC call
    Grpc,
    /// WebSocket relay
    Ws,
    /// LLM (chat completion) proxy
    Llm,
    /// Custom, user supplied executor
    Cst,
    /// CAS authentication flows
    Cas,
    /// No prefix matched
    Unknown,
}

impl ProtocolFamily {
    /// Every routable family, in routing-table order.
    pub const ROUTABLE: [ProtocolFamily; 8] = [
        ProtocolFamily::Rest,
        ProtocolFamily::Mq,
        ProtocolFamily::Mcp,
        ProtocolFamily::Grpc,
        ProtocolFamily::Ws,
        ProtocolFamily::Llm,
        ProtocolFamily::Cst,
        ProtocolFamily::Cas,
    ];

    /// Router name used in configuration, metrics and the mode table.
    #[must_use]
    pub fn router_name(self) -> &'static str {
        match self {
            Self::Rest => "http",
            Self::Mq => "mq",
            Self::Mcp => "mcp",
            Self::Grpc => "grpc",
            Self::Ws => "ws",
            Self::Llm => "llm",
            Self::Cst => "cst",
            Self::Cas => "cas",
            Self::Unknown => "unknown",
        }
    }

    /// Resolve an integer mode to its family.
    ///
    /// Only modes present in the mode table resolve; `Cst` and `Cas` have no
    /// mode and anything else yields `None`.
    #[must_use]
    pub fn from_mode(mode: i64) -> Option<Self> {
        super::mode::router_name_for_mode(mode).and_then(|name| name.parse().ok())
    }

    #[must_use]
    pub fn is_routable(self) -> bool {
        self != Self::Unknown
    }
}

impl fmt::Display for ProtocolFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.router_name())
    }
}

/// Error returned when a family name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown protocol family '{0}'")]
pub struct UnknownFamily(pub String);

impl FromStr for ProtocolFamily {
    type Err = UnknownFamily;

    /// Accepts router names (`http`) as well as family names (`rest`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "rest" => Ok(Self::Rest),
            "mq" => Ok(Self::Mq),
            "mcp" => Ok(Self::Mcp),
            "grpc" => Ok(Self::Grpc),
            "ws" | "websocket" => Ok(Self::Ws),
            "llm" => Ok(Self::Llm),
            "cst" | "custom" => Ok(Self::Cst),
            "cas" => Ok(Self::Cas),
            other => Err(UnknownFamily(other.to_string())),
        }
    }
}

/// Result of classifying a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// Family of the matched prefix, `Unknown` when nothing matched
    pub family: ProtocolFamily,
    /// The prefix that matched, if any
    pub prefix: Option<&'a str>,
    /// Path after the matched prefix (the whole path when nothing matched)
    pub remainder: &'a str,
}

/// Ordered prefix → family table.
///
/// Entries are kept longest-prefix first so that a prefix which extends
/// another (`/router/restv2` vs `/router/rest`) always wins. Sorting is
/// stable, so equal-length prefixes keep their registration order.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<(String, ProtocolFamily)>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RouteTable {
    /// The gateway's fixed routing table.
    #[must_use]
    pub fn standard() -> Self {
        Self::new([
            ("/router/rest", ProtocolFamily::Rest),
            ("/router/mq", ProtocolFamily::Mq),
            ("/router/mcp", ProtocolFamily::Mcp),
            ("/router/grpc", ProtocolFamily::Grpc),
            ("/router/ws", ProtocolFamily::Ws),
            ("/router/llm", ProtocolFamily::Llm),
            ("/router/cst", ProtocolFamily::Cst),
            ("/router/cas", ProtocolFamily::Cas),
        ])
    }

    /// Build a table from arbitrary entries.
    ///
    /// Entries mapping to [`ProtocolFamily::Unknown`] are ignored since an
    /// unmatched path already classifies as unknown.
    pub fn new<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, ProtocolFamily)>,
        P: Into<String>,
    {
        let mut entries: Vec<(String, ProtocolFamily)> = entries
            .into_iter()
            .map(|(p, f)| (p.into(), f))
            .filter(|(_, f)| f.is_routable())
            .collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        info!(routes_count = entries.len(), "Route table loaded");
        Self { entries }
    }

    /// Classify a normalised path (no query string) into a protocol family.
    #[must_use]
    pub fn classify(&self, path: &str) -> ProtocolFamily {
        self.route(path).family
    }

    /// Classify a path and report which prefix matched.
    #[must_use]
    pub fn route<'a>(&'a self, path: &'a str) -> RouteMatch<'a> {
        for (prefix, family) in &self.entries {
            if let Some(remainder) = path.strip_prefix(prefix.as_str()) {
                debug!(path, prefix = %prefix, family = %family, "Route matched");
                return RouteMatch {
                    family: *family,
                    prefix: Some(prefix.as_str()),
                    remainder,
                };
            }
        }
        debug!(path, "No route prefix matched");
        RouteMatch {
            family: ProtocolFamily::Unknown,
            prefix: None,
            remainder: path,
        }
    }

    /// Registered `(prefix, family)` pairs in match order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, ProtocolFamily)> {
        self.entries.iter().map(|(p, f)| (p.as_str(), *f))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
