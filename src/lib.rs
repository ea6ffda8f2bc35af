//! # Vortex
//!
//! **Vortex** is a gateway request-dispatch engine on Tokio. It classifies an
//! inbound request by path prefix into a protocol family, runs an ordered
//! chain of cross-cutting strategies around it, calls the family's
//! downstream executor, and encodes the result in the format the client
//! asked for.
//!
//! ## Architecture
//!
//! - **[`router`]** - Prefix classification into [`ProtocolFamily`] and the mode table
//! - **[`context`]** - [`RequestContext`] plus the inbound/outbound envelopes
//! - **[`strategy`]** - The [`Strategy`] contract, the factory and built-in strategies
//! - **[`executor`]** - Typed per-family executors, type-erased for dispatch
//! - **[`dispatcher`]** - The chain orchestrator tying it all together
//! - **[`format`]** - Response format negotiation and encoding (JSON, XML, binary, PDF)
//! - **[`monitor`]** - Request, cache-access and operation statistics
//! - **[`config`]** / **[`runtime_config`]** - YAML configuration and environment tuning
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - The `vortex` command-line front end
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Dispatcher
//!     participant Routes as RouteTable
//!     participant Factory as StrategyFactory
//!     participant Chain as Strategies
//!     participant Exec as Executor
//!
//!     Client->>Dispatcher: InboundRequest
//!     Dispatcher->>Routes: route(path)
//!     Routes-->>Dispatcher: family + remainder
//!     Dispatcher->>Factory: strategies_for(family, features)
//!     Dispatcher->>Chain: pre_handle (ascending order)
//!     Chain-->>Dispatcher: approve / reject
//!     Dispatcher->>Exec: build target, execute (timeout, retry)
//!     Exec-->>Dispatcher: Payload
//!     Dispatcher->>Chain: post_handle, after_completion
//!     Dispatcher-->>Client: GatewayResponse (X-Trace-ID)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use http::Method;
//! use std::sync::Arc;
//! use vortex::context::InboundRequest;
//! use vortex::dispatcher::Dispatcher;
//! use vortex::executor::{erase, DownstreamAsset, RestExecutor};
//! use vortex::router::ProtocolFamily;
//! use vortex::strategy::{RequiredParamsStrategy, StrategyRegistry, TracingStrategy};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let asset = DownstreamAsset::new("http", "users.internal").with_port(8080);
//! let dispatcher = Dispatcher::builder()
//!     .strategies(
//!         StrategyRegistry::builder()
//!             .register_global(Arc::new(TracingStrategy))
//!             .register_global(Arc::new(RequiredParamsStrategy::default()))
//!             .build(),
//!     )
//!     .executor(ProtocolFamily::Rest, erase(RestExecutor::new(asset)?))
//!     .build();
//!
//! let request = InboundRequest::from_target(Method::GET, "/router/rest/user/profile?method=user.get");
//! let response = dispatcher.dispatch(request).await;
//! println!("{} {:?}", response.status, response.content_type());
//! # Ok(())
//! # }
//! ```
//!
//! Or from a configuration file:
//!
//! ```rust,no_run
//! use vortex::config::GatewayConfig;
//! use vortex::runtime_config::RuntimeConfig;
//!
//! # fn run() -> anyhow::Result<()> {
//! let dispatcher = GatewayConfig::load("gateway.yaml")?
//!     .assemble(&RuntimeConfig::from_env())?
//!     .into_dispatcher();
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Responses
//!
//! Failures are rendered as `{"code", "message", "trace_id"}` in the
//! negotiated format, with the status taken from [`DispatchError`]:
//!
//! | Failure                 | Status | Code                          |
//! |-------------------------|--------|-------------------------------|
//! | No prefix matched       | 404    | `UNROUTABLE`                  |
//! | Strategy rejected       | 4xx    | strategy supplied             |
//! | Strategy error or panic | 500    | `STRATEGY_FAULT`              |
//! | Downstream timeout      | 504    | `DOWNSTREAM_TIMEOUT`          |
//! | Downstream unreachable  | 502    | `DOWNSTREAM_UNAVAILABLE`      |
//! | Downstream error        | 502    | `DOWNSTREAM_PROTOCOL_ERROR`   |
//! | Cancelled               | 499    | `CANCELLED`                   |
//! | Bad input               | 400    | `INVALID_INPUT`               |
//! | No executor             | 501    | `NOT_CONFIGURED`              |
//! | Encoding failed         | 500    | `SERIALIZATION_ERROR`         |

pub mod cli;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod format;
pub mod ids;
pub mod logging;
pub mod monitor;
pub mod payload;
pub mod router;
pub mod runtime_config;
pub mod strategy;

pub use context::{GatewayResponse, InboundRequest, RequestContext};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::{DispatchError, DownstreamError, Rejection};
pub use format::Format;
pub use ids::TraceId;
pub use payload::Payload;
pub use router::{ProtocolFamily, RouteTable};
pub use strategy::Strategy;
