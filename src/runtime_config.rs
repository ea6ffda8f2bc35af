//! # Runtime Configuration Module
//!
//! Environment variable-based settings that tune the dispatcher without
//! touching the YAML configuration file.
//!
//! ## Environment Variables
//!
//! ### `VORTEX_DEFAULT_TIMEOUT_MS`
//!
//! Per-attempt timeout applied to downstream assets that do not set
//! `timeout_ms` themselves. Zero or unparsable values are ignored.
//!
//! Default: `5000`
//!
//! ### `VORTEX_MAX_BODY_BYTES`
//!
//! Largest inbound body the dispatcher will hand to an executor. Larger
//! bodies fail with `400 INVALID_INPUT`. Accepts decimal or `0x` hex.
//!
//! Default: unlimited
//!
//! ## Usage
//!
//! ```rust
//! use vortex::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Default timeout: {} ms", config.default_timeout_ms);
//! ```
//!
//! ```bash
//! export VORTEX_DEFAULT_TIMEOUT_MS=2000
//! export VORTEX_MAX_BODY_BYTES=0x100000
//! vortex dispatch --config gateway.yaml /router/rest/user/profile
//! ```

use crate::executor::DEFAULT_TIMEOUT_MS;
use std::env;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Timeout for assets without their own (default: 5000 ms)
    pub default_timeout_ms: u64,
    /// Inbound body limit; `None` means unlimited
    pub max_body_bytes: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_body_bytes: None,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var("VORTEX_DEFAULT_TIMEOUT_MS").ok().as_deref(),
            env::var("VORTEX_MAX_BODY_BYTES").ok().as_deref(),
        )
    }

    fn from_vars(timeout: Option<&str>, max_body: Option<&str>) -> Self {
        let default_timeout_ms = timeout
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let max_body_bytes = max_body.and_then(|val| {
            let val = val.trim();
            match val.strip_prefix("0x") {
                Some(hex) => usize::from_str_radix(hex, 16).ok(),
                None => val.parse().ok(),
            }
        });
        RuntimeConfig {
            default_timeout_ms,
            max_body_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_vars() {
        assert_eq!(RuntimeConfig::from_vars(None, None), RuntimeConfig::default());
    }

    #[test]
    fn test_parses_decimal_and_hex() {
        let config = RuntimeConfig::from_vars(Some("250"), Some("0x400"));
        assert_eq!(config.default_timeout_ms, 250);
        assert_eq!(config.max_body_bytes, Some(1024));

        let config = RuntimeConfig::from_vars(None, Some(" 2048 "));
        assert_eq!(config.max_body_bytes, Some(2048));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = RuntimeConfig::from_vars(Some("0"), Some("lots"));
        assert_eq!(config.default_timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.max_body_bytes, None);

        let config = RuntimeConfig::from_vars(Some("soon"), None);
        assert_eq!(config.default_timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
