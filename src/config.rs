//! # Configuration Module
//!
//! YAML configuration for a gateway: one downstream asset per protocol
//! family, the enabled feature flags, and settings for the built-in
//! strategies.
//!
//! ```yaml
//! features: [token_auth]
//! required_params: [method]
//! access_token:
//!   tokens: [s3cret]
//!   cache_ttl_secs: 30
//!   cache_capacity: 10000
//!   families: [rest, llm]
//!   feature: token_auth
//! assets:
//!   rest:
//!     host: users.internal
//!     port: 8080
//!     path: /api
//!     timeout_ms: 2000
//!     retry: { max_attempts: 3, backoff_ms: 50 }
//!   llm:
//!     scheme: https
//!     host: llm.internal
//!     path: /v1/chat/completions
//!     credential: sk-local
//!     model: small
//! ```
//!
//! Asset keys accept family names (`rest`, `mq`, `mcp`, `grpc`, `ws`,
//! `llm`, `cst`, `cas`) and router names (`http`). [`GatewayConfig::load`]
//! parses and validates; [`GatewayConfig::assemble`] turns the result into
//! a [`DispatcherBuilder`] with executors and strategies registered.
//! A strategy section naming a `feature` only runs while that flag is
//! listed under `features`.
//!
//! Logging is configured separately through `VORTEX_LOG_*` variables (see
//! [`crate::logging`]), and process-wide tuning through
//! [`RuntimeConfig`](crate::runtime_config::RuntimeConfig).

use crate::dispatcher::{Dispatcher, DispatcherBuilder};
use crate::executor::{
    erase, ChannelPublisher, DownstreamAsset, LlmExecutor, McpExecutor, MqExecutor, MqMessage,
    RestExecutor, WsExecutor,
};
use crate::monitor::{AtomicMonitor, Monitor};
use crate::router::ProtocolFamily;
use crate::runtime_config::RuntimeConfig;
use crate::strategy::{
    AccessTokenStrategy, Applicability, FeatureFlags, MetricsStrategy, RequiredParamsStrategy,
    StaticTokenVerifier, StrategyRegistry, TracingStrategy, DEFAULT_TOKEN_CACHE_CAPACITY,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "VORTEX_CONFIG";
/// Access-token verdict cache lifetime when none is configured.
pub const DEFAULT_TOKEN_CACHE_TTL_SECS: u64 = 60;
/// Buffer size of the in-process MQ channel.
pub const MQ_CHANNEL_CAPACITY: usize = 1024;

/// Settings for [`AccessTokenStrategy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessTokenConfig {
    pub tokens: Vec<String>,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Upper bound on cached verdicts
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Families the check applies to; empty means all
    #[serde(default)]
    pub families: Vec<String>,
    /// Feature flag that must be enabled for the check to run
    #[serde(default)]
    pub feature: Option<String>,
}

fn default_cache_ttl() -> u64 {
    DEFAULT_TOKEN_CACHE_TTL_SECS
}

fn default_cache_capacity() -> usize {
    DEFAULT_TOKEN_CACHE_CAPACITY
}

/// Gateway configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default)]
    pub assets: BTreeMap<String, DownstreamAsset>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub access_token: Option<AccessTokenConfig>,
    /// Parameters every request must carry; `[method]` when absent
    #[serde(default)]
    pub required_params: Option<Vec<String>>,
}

/// Semantic problems found by [`GatewayConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{section}: unknown protocol family '{key}'")]
    UnknownFamily { section: &'static str, key: String },
    #[error("assets: '{key}' configures {family} a second time")]
    DuplicateFamily { key: String, family: ProtocolFamily },
    #[error("assets.{key}: host must not be empty")]
    EmptyHost { key: String },
    #[error("assets.{key}: timeout_ms must be greater than zero")]
    ZeroTimeout { key: String },
    #[error("assets.{key}: retry.max_attempts must be at least 1")]
    NoAttempts { key: String },
    #[error("access_token: at least one token is required")]
    NoTokens,
    #[error("access_token: cache_capacity must be greater than zero")]
    ZeroCacheCapacity,
}

/// Pieces produced by [`GatewayConfig::assemble`].
pub struct Gateway {
    /// Builder with executors, strategies, monitor and limits applied
    pub builder: DispatcherBuilder,
    /// Monitor shared by the dispatcher and the built-in strategies
    pub monitor: Arc<AtomicMonitor>,
    /// Receiving end of the MQ channel when an `mq` asset is configured
    pub mq_messages: Option<mpsc::Receiver<MqMessage>>,
}

impl Gateway {
    /// Finish the builder.
    pub fn into_dispatcher(self) -> Dispatcher {
        self.builder.build()
    }
}

impl GatewayConfig {
    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("failed to load config file {}", path.display()))?;
        info!(path = %path.display(), assets = config.assets.len(), "Configuration loaded");
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("invalid gateway configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file named by `VORTEX_CONFIG`, or an empty configuration when unset.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.families()?;
        for (key, asset) in &self.assets {
            if asset.host.trim().is_empty() {
                return Err(ConfigError::EmptyHost { key: key.clone() });
            }
            if asset.timeout_ms == Some(0) {
                return Err(ConfigError::ZeroTimeout { key: key.clone() });
            }
            if asset.retry.max_attempts == 0 {
                return Err(ConfigError::NoAttempts { key: key.clone() });
            }
        }
        if let Some(tokens) = &self.access_token {
            if tokens.tokens.iter().all(|t| t.trim().is_empty()) {
                return Err(ConfigError::NoTokens);
            }
            if tokens.cache_capacity == 0 {
                return Err(ConfigError::ZeroCacheCapacity);
            }
            parse_families("access_token.families", &tokens.families)?;
        }
        Ok(())
    }

    /// Assets keyed by the family they serve.
    pub fn families(&self) -> Result<Vec<(ProtocolFamily, &DownstreamAsset)>, ConfigError> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(self.assets.len());
        for (key, asset) in &self.assets {
            let family = key
                .parse::<ProtocolFamily>()
                .map_err(|_| ConfigError::UnknownFamily {
                    section: "assets",
                    key: key.clone(),
                })?;
            if !seen.insert(family) {
                return Err(ConfigError::DuplicateFamily {
                    key: key.clone(),
                    family,
                });
            }
            out.push((family, asset));
        }
        Ok(out)
    }

    pub fn feature_flags(&self) -> FeatureFlags {
        self.features.iter().map(|f| f.trim()).filter(|f| !f.is_empty()).collect()
    }

    /// Give assets without a timeout the runtime default.
    pub fn apply_runtime(&mut self, runtime: &RuntimeConfig) {
        for asset in self.assets.values_mut() {
            asset.timeout_ms.get_or_insert(runtime.default_timeout_ms);
        }
    }

    /// Build executors and the built-in strategies from this configuration.
    ///
    /// REST, MCP, LLM and WS assets get their HTTP-family executors and an
    /// `mq` asset gets a [`ChannelPublisher`]. gRPC needs an
    /// [`RpcTransport`](crate::executor::RpcTransport), so its asset is
    /// only reported; register a `GrpcExecutor` on the returned builder.
    pub fn assemble(&self, runtime: &RuntimeConfig) -> anyhow::Result<Gateway> {
        self.validate()?;
        let mut config = self.clone();
        config.apply_runtime(runtime);

        let monitor = Arc::new(AtomicMonitor::new());
        let shared: Arc<dyn Monitor> = Arc::clone(&monitor) as Arc<dyn Monitor>;
        let mut builder = Dispatcher::builder()
            .features(config.feature_flags())
            .monitor(Arc::clone(&shared))
            .max_body_bytes(runtime.max_body_bytes)
            .strategies(config.registry(&shared)?);

        let mut mq_messages = None;
        for (family, asset) in config.families()? {
            let asset = asset.clone();
            let executor = match family {
                ProtocolFamily::Rest => erase(RestExecutor::new(asset)?),
                ProtocolFamily::Mcp => erase(McpExecutor::new(asset)?),
                ProtocolFamily::Llm => erase(LlmExecutor::new(asset)?),
                ProtocolFamily::Ws => erase(WsExecutor::new(asset)),
                ProtocolFamily::Mq => {
                    let (publisher, rx) = ChannelPublisher::channel(MQ_CHANNEL_CAPACITY);
                    mq_messages = Some(rx);
                    erase(MqExecutor::new(asset, publisher))
                }
                ProtocolFamily::Grpc | ProtocolFamily::Cst | ProtocolFamily::Cas
                | ProtocolFamily::Unknown => {
                    warn!(%family, host = %asset.host, "No built-in executor for family; requests will fail with NOT_CONFIGURED");
                    continue;
                }
            };
            builder = builder.executor(family, executor);
        }

        Ok(Gateway {
            builder,
            monitor,
            mq_messages,
        })
    }

    fn registry(&self, monitor: &Arc<dyn Monitor>) -> Result<StrategyRegistry, ConfigError> {
        let required = match &self.required_params {
            Some(params) => RequiredParamsStrategy::new(params.iter().cloned()),
            None => RequiredParamsStrategy::default(),
        };
        let mut registry = StrategyRegistry::builder()
            .register_global(Arc::new(TracingStrategy))
            .register_global(Arc::new(required));

        if let Some(tokens) = &self.access_token {
            let families = parse_families("access_token.families", &tokens.families)?;
            let mut applicability = if families.is_empty() {
                Applicability::all()
            } else {
                Applicability::families(families)
            };
            if let Some(flag) = tokens.feature.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
                applicability = applicability.requires_feature(flag);
            }
            let verifier = Arc::new(StaticTokenVerifier::new(tokens.tokens.iter().cloned()));
            let strategy = AccessTokenStrategy::new(verifier, Arc::clone(monitor))
                .cache_ttl(Duration::from_secs(tokens.cache_ttl_secs))
                .cache_capacity(tokens.cache_capacity);
            registry = registry.register(Arc::new(strategy), applicability);
        }

        Ok(registry
            .register_global(Arc::new(MetricsStrategy::new(Arc::clone(monitor))))
            .build())
    }
}

fn parse_families(section: &'static str, keys: &[String]) -> Result<Vec<ProtocolFamily>, ConfigError> {
    keys.iter()
        .map(|key| {
            key.parse().map_err(|_| ConfigError::UnknownFamily {
                section,
                key: key.clone(),
            })
        })
        .collect()
}
