//! # Executor Module
//!
//! Protocol-specific downstream callers.
//!
//! Each protocol family gets one [`Executor`] implementation with its own
//! `Input` and `Output` types. The dispatcher never sees those types: it
//! holds [`DynExecutor`] trait objects, and [`Erased`] adapts a typed
//! executor by converting [`Payload`](crate::payload::Payload)s through
//! [`FromPayload`] / [`IntoPayload`].
//!
//! `Erased` also owns the call policy. Every attempt runs under the asset's
//! timeout; timeouts and refused connections are retried up to
//! `retry.max_attempts` with a fixed `retry.backoff_ms` pause. Other errors
//! are returned at once.
//!
//! | Family | Executor                | Input          | Output      |
//! |--------|-------------------------|----------------|-------------|
//! | REST   | [`RestExecutor`]        | [`RestCall`]   | [`HttpReply`] |
//! | MCP    | [`McpExecutor`]         | [`McpCall`]    | JSON `result` |
//! | LLM    | [`LlmExecutor`]         | [`ChatRequest`]| [`HttpReply`] |
//! | MQ     | [`MqExecutor`]          | [`MqPublish`]  | `()`        |
//! | gRPC   | [`GrpcExecutor`]        | [`RpcCall`]    | `Bytes`     |
//! | WS     | [`WsExecutor`]          | [`WsSession`]  | `()`        |
//!
//! Downstream addresses are composed by [`Executor::build`] as
//! `host[:port][/path]` from the family's [`DownstreamAsset`] and the path
//! left after the routing prefix.

mod asset;
mod core;
mod grpc;
mod http;
mod llm;
mod mcp;
mod mq;
mod rest;
mod target;
mod ws;

use std::sync::Arc;

pub use asset::{DownstreamAsset, RetryPolicy, DEFAULT_TIMEOUT_MS};
pub use core::{target_of, DynExecutor, Erased, Executor, FromPayload, IntoPayload};
pub use grpc::{GrpcExecutor, RpcCall, RpcTransport};
pub use http::HttpReply;
pub use llm::{ChatRequest, LlmExecutor};
pub use mcp::{McpCall, McpExecutor, JSONRPC_VERSION};
pub use mq::{ChannelPublisher, MessagePublisher, MqExecutor, MqMessage, MqPublish};
pub use rest::{RestCall, RestExecutor, RestReply};
pub use target::TargetAddress;
pub use ws::{WsExecutor, WsSession};

/// Wrap a typed executor for registration with the dispatcher.
pub fn erase<E: Executor>(executor: E) -> Arc<dyn DynExecutor> {
    Arc::new(Erased::new(executor))
}
