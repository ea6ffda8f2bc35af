//! # Strategy Module
//!
//! Cross-cutting units that run around every dispatched request, and the
//! factory that picks which of them apply.
//!
//! ## Lifecycle
//!
//! ```text
//!   pre_handle (ascending order) ──▶ executor ──▶ post_handle (same order)
//!        │ Ok(false) / Err / panic                     ▲
//!        └──────────────── stop chain ─────────────────┘
//!                                                      │
//!                       after_completion (every selected strategy)
//! ```
//!
//! `post_handle` runs only for strategies whose `pre_handle` ran, including
//! the one that stopped the chain. `after_completion` runs once for every
//! selected strategy no matter how the request ended.
//!
//! ## Selection
//!
//! Strategies are registered once through [`StrategyRegistry::builder`],
//! each with an [`Applicability`]: a family set (or all families) and an
//! optional feature flag. [`StrategyFactory::strategies_for`] filters the
//! registry for a request's family and the process feature flags and sorts
//! the result by [`Strategy::order`], keeping registration order on ties.
//!
//! ## Built-in strategies
//!
//! | Strategy                  | Order | Purpose                                   |
//! |---------------------------|-------|-------------------------------------------|
//! | [`TracingStrategy`]       | -1000 | Logs request start and outcome            |
//! | [`RequiredParamsStrategy`]|  -500 | 400 `MISSING_PARAMETER` without `method`  |
//! | [`AccessTokenStrategy`]   |  -100 | 401 unless `X-Access-Token` verifies      |
//! | [`MetricsStrategy`]       |  1000 | Records `<router>.dispatch` operations    |

mod access_token;
mod core;
mod factory;
mod metrics;
mod params;
mod trace;

pub use access_token::{
    AccessTokenStrategy, StaticTokenVerifier, TokenCacheStats, TokenVerifier,
    ACCESS_TOKEN_MONITOR_KEY, ACCESS_TOKEN_ORDER, ATTR_TOKEN_VERIFIED,
    DEFAULT_TOKEN_CACHE_CAPACITY,
};
pub use core::{Strategy, DEFAULT_ORDER};
pub use factory::{
    Applicability, FeatureFlags, Selection, StrategyFactory, StrategyRegistry,
    StrategyRegistryBuilder,
};
pub use metrics::{MetricsStrategy, METRICS_ORDER};
pub use params::{RequiredParamsStrategy, REQUIRED_PARAMS_ORDER};
pub use trace::{TracingStrategy, TRACING_ORDER};
