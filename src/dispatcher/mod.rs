//! # Dispatcher Module
//!
//! The chain orchestrator: the dispatcher takes an [`InboundRequest`](crate::context::InboundRequest),
//! runs it through the strategy chain and the family's executor, and returns an
//! encoded [`GatewayResponse`](crate::context::GatewayResponse).
//!
//! ## Request Flow
//!
//! 1. The path is classified by the [`RouteTable`](crate::router::RouteTable).
//!    A miss returns `404 UNROUTABLE` without selecting any strategy.
//! 2. A [`RequestContext`](crate::context::RequestContext) is created and the
//!    response format is negotiated from the `format` parameter.
//! 3. `pre_handle` runs for each selected strategy in order. The first
//!    rejection, error or panic stops the chain and is recorded as the failure.
//! 4. On approval the executor builds the downstream target and makes the
//!    call, under the asset's timeout and retry policy and raced against the
//!    cancellation token.
//! 5. `post_handle` runs for every strategy whose `pre_handle` ran.
//! 6. The result is encoded; an encoding failure becomes the failure.
//! 7. `after_completion` runs for every selected strategy, whatever happened.
//! 8. The response is built, stamped with `X-Trace-ID`, and the monitor
//!    records the request.
//!
//! Phases are recorded on the context as [`Phase`](crate::context::Phase):
//! `Created → PreHandling → Approved → Executing → PostHandling → Completed`,
//! or `Created → PreHandling → Rejected → PostHandling → Completed`.
//!
//! ## Error Handling
//!
//! - Strategy panics are caught and reported as `500 STRATEGY_FAULT`;
//!   internals are logged, never sent to the client
//! - Downstream failures map to 504/502/499/400/501 (see
//!   [`DownstreamError`](crate::error::DownstreamError))
//! - Errors are rendered in the negotiated format; when that fails a minimal
//!   JSON document is sent instead
//!
//! ## Cancellation
//!
//! [`Dispatcher::dispatch_with_cancel`] aborts the downstream call when its
//! token fires, and the request unwinds through `post_handle` and
//! `after_completion` with a `Cancelled` failure. [`Dispatcher::spawn`] runs
//! the same lifecycle on its own Tokio task so it completes even if the
//! caller goes away.

mod core;

pub use core::{Dispatcher, DispatcherBuilder};
