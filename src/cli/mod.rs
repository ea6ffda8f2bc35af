//! # CLI Module
//!
//! Command-line front end for the `vortex` binary.
//!
//! ## Commands
//!
//! ### `classify`
//!
//! Report the protocol family a request path routes to:
//!
//! ```bash
//! vortex classify /router/rest/user/profile
//! # family=Rest router=http remainder=/user/profile
//! ```
//!
//! ### `mode`
//!
//! Look up the router name for an integer mode. Unregistered modes print
//! `no mapping` and exit with status 1:
//!
//! ```bash
//! vortex mode 3     # mcp
//! vortex mode 42    # no mapping
//! ```
//!
//! ### `check-config`
//!
//! Parse and validate a YAML configuration file:
//!
//! ```bash
//! vortex check-config gateway.yaml
//! ```
//!
//! ### `dispatch`
//!
//! Build a dispatcher from a configuration file and send one request
//! through it, printing status, content type, trace id and body:
//!
//! ```bash
//! vortex dispatch --config gateway.yaml \
//!     '/router/rest/user/profile?method=user.get' \
//!     --query format=xml \
//!     -H 'X-Access-Token: s3cret'
//! ```
//!
//! `--config` falls back to `VORTEX_CONFIG`. Runtime tuning comes from
//! [`RuntimeConfig::from_env`](crate::runtime_config::RuntimeConfig::from_env).
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use clap::Parser;
//! use vortex::cli::{run_cli, Cli};
//!
//! let ok = run_cli(Cli::parse(), &mut std::io::stdout())?;
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, Cli, Commands};
