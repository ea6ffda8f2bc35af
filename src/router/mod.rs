//! # Router Module
//!
//! The router module classifies inbound request paths into downstream
//! protocol families.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Holding the static prefix → family routing table
//! - Classifying every path into exactly one [`ProtocolFamily`], including
//!   an explicit [`ProtocolFamily::Unknown`]
//! - Resolving integer "modes" to router names
//!
//! ## Routing Table
//!
//! | Prefix         | Family |
//! |----------------|--------|
//! | `/router/rest` | REST   |
//! | `/router/mq`   | MQ     |
//! | `/router/mcp`  | MCP    |
//! | `/router/grpc` | gRPC   |
//! | `/router/ws`   | WS     |
//! | `/router/llm`  | LLM    |
//! | `/router/cst`  | CST    |
//! | `/router/cas`  | CAS    |
//!
//! ## Example
//!
//! ```rust
//! use vortex::router::{router_name_for_mode, ProtocolFamily, RouteTable};
//!
//! let table = RouteTable::standard();
//! assert_eq!(table.classify("/router/rest/user/profile"), ProtocolFamily::Rest);
//! assert_eq!(table.classify("/elsewhere"), ProtocolFamily::Unknown);
//! assert_eq!(router_name_for_mode(3), Some("mcp"));
//! assert_eq!(router_name_for_mode(99), None);
//! ```
//!
//! ## Performance
//!
//! Classification is O(k) in the number of prefixes; k is fixed at startup
//! and small, so matching is a handful of `strip_prefix` calls.

mod core;
mod mode;

pub use core::{ProtocolFamily, RouteMatch, RouteTable, UnknownFamily};
pub use mode::router_name_for_mode;
