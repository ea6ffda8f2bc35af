//! Error types for the dispatch engine.
//!
//! [`DispatchError`] is the terminal failure cause attached to a request
//! context; [`DownstreamError`] is what executors return. The two are kept
//! apart so that retry policy can tell a strategy fault from a backend fault.

use crate::router::ProtocolFamily;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Lifecycle phase in which a strategy failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyPhase {
    PreHandle,
    PostHandle,
    AfterCompletion,
}

impl fmt::Display for StrategyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PreHandle => "pre_handle",
            Self::PostHandle => "post_handle",
            Self::AfterCompletion => "after_completion",
        })
    }
}

/// Failure raised by a downstream executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownstreamError {
    /// The per-asset timeout elapsed before the call completed
    #[error("downstream call to {target} timed out after {timeout_ms}ms")]
    Timeout { target: String, timeout_ms: u64 },
    /// The backend could not be reached
    #[error("connection to {target} refused: {message}")]
    ConnectionRefused { target: String, message: String },
    /// The backend answered, but not with something we accept
    #[error("protocol error from {target}: {message}")]
    Protocol {
        target: String,
        status: Option<u16>,
        message: String,
    },
    /// The client went away or the request was cancelled
    #[error("downstream call cancelled")]
    Cancelled,
    /// The request payload cannot be turned into the executor's input
    #[error("invalid executor input: {0}")]
    InvalidInput(String),
    /// No executor or asset is configured for the family
    #[error("no downstream configured for '{0}'")]
    NotConfigured(ProtocolFamily),
}

impl DownstreamError {
    pub fn protocol(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            target: target.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn connection(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionRefused {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Whether the retry policy may attempt the call again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ConnectionRefused { .. })
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Timeout { .. } => 504,
            Self::ConnectionRefused { .. } | Self::Protocol { .. } => 502,
            Self::Cancelled => 499,
            Self::InvalidInput(_) => 400,
            Self::NotConfigured(_) => 501,
        }
    }

    /// Client-facing description; never names the target or the cause.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Timeout { .. } => "downstream timed out".to_string(),
            Self::ConnectionRefused { .. } => "downstream unavailable".to_string(),
            Self::Protocol {
                status: Some(status),
                ..
            } => format!("downstream responded with status {status}"),
            Self::Protocol { status: None, .. } => {
                "downstream returned an invalid response".to_string()
            }
            Self::Cancelled | Self::InvalidInput(_) | Self::NotConfigured(_) => self.to_string(),
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "DOWNSTREAM_TIMEOUT",
            Self::ConnectionRefused { .. } => "DOWNSTREAM_UNAVAILABLE",
            Self::Protocol { .. } => "DOWNSTREAM_PROTOCOL_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotConfigured(_) => "NOT_CONFIGURED",
        }
    }
}

/// Reason a strategy gives when it declines a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// HTTP-equivalent status for the client response
    pub status: u16,
    /// Machine readable code, SCREAMING_SNAKE_CASE
    pub code: String,
    /// Human readable message
    pub message: String,
}

impl Rejection {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, "FORBIDDEN", message)
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(400, code, message)
    }
}

impl Default for Rejection {
    fn default() -> Self {
        Self::new(403, "REJECTED", "request rejected")
    }
}

/// Terminal failure cause of a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The path matched no routing prefix
    #[error("no route for path '{path}'")]
    Unroutable { path: String },
    /// A strategy declined the request during pre-handling
    #[error("rejected by {strategy}: {}", .reason.message)]
    Rejected { strategy: String, reason: Rejection },
    /// A strategy failed or panicked
    #[error("strategy {strategy} failed in {phase}: {message}")]
    StrategyFault {
        strategy: String,
        phase: StrategyPhase,
        message: String,
    },
    /// The executor failed
    #[error(transparent)]
    Downstream(#[from] DownstreamError),
    /// The negotiated format could not encode the result
    #[error("cannot encode response as {format}: {message}")]
    Serialization { format: String, message: String },
}

impl DispatchError {
    pub fn strategy_fault(
        strategy: impl Into<String>,
        phase: StrategyPhase,
        message: impl Into<String>,
    ) -> Self {
        Self::StrategyFault {
            strategy: strategy.into(),
            phase,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unroutable { .. } => 404,
            Self::Rejected { reason, .. } => reason.status,
            Self::StrategyFault { .. } | Self::Serialization { .. } => 500,
            Self::Downstream(e) => e.status_code(),
        }
    }

    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Unroutable { .. } => "UNROUTABLE",
            Self::Rejected { reason, .. } => &reason.code,
            Self::StrategyFault { .. } => "STRATEGY_FAULT",
            Self::Downstream(e) => e.code(),
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
        }
    }

    /// Message safe to show to clients; strategy internals and downstream
    /// addresses are not exposed.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::StrategyFault { .. } => "An internal error occurred".to_string(),
            Self::Rejected { reason, .. } => reason.message.clone(),
            Self::Downstream(e) => e.public_message(),
            other => other.to_string(),
        }
    }

    #[must_use]
    pub fn is_downstream(&self) -> bool {
        matches!(self, Self::Downstream(_))
    }
}

/// Error body sent to clients, rendered in the negotiated format.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody<'a> {
    pub code: &'a str,
    pub message: String,
    pub trace_id: String,
}
