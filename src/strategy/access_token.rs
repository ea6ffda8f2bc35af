use super::Strategy;
use crate::context::RequestContext;
use crate::error::Rejection;
use crate::monitor::Monitor;
use async_trait::async_trait;
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const ACCESS_TOKEN_ORDER: i32 = -100;
/// Monitor key for token cache accesses.
pub const ACCESS_TOKEN_MONITOR_KEY: &str = "access_token";
/// Attribute set on the context once the token has been accepted.
pub const ATTR_TOKEN_VERIFIED: &str = "access_token.verified";
/// Verdicts kept when no capacity is configured.
pub const DEFAULT_TOKEN_CACHE_CAPACITY: usize = 1000;

/// Decides whether an access token is valid.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> anyhow::Result<bool>;
}

/// Accepts a fixed set of tokens.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashSet<String>,
}

impl StaticTokenVerifier {
    #[must_use]
    pub fn new(tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> anyhow::Result<bool> {
        Ok(self.tokens.contains(token))
    }
}

/// Validates the `X-Access-Token` header.
///
/// Verdicts (valid and invalid) are cached per token for `cache_ttl` in an
/// LRU bounded by `cache_capacity`; the least recently used token is evicted
/// once the cache is full. Expired entries are dropped when next looked up.
/// Every lookup is reported to the monitor under [`ACCESS_TOKEN_MONITOR_KEY`]
/// as a hit or a miss. Verifier errors are strategy faults, not rejections.
pub struct AccessTokenStrategy {
    verifier: Arc<dyn TokenVerifier>,
    monitor: Arc<dyn Monitor>,
    cache_ttl: Duration,
    // The lock is never held across the verifier call
    cache: Mutex<LruCache<String, (Instant, bool)>>,
    evictions: AtomicU64,
}

/// Occupancy of the verdict cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCacheStats {
    pub len: usize,
    pub capacity: usize,
    pub evictions: u64,
}

fn lru_with(capacity: usize) -> LruCache<String, (Instant, bool)> {
    LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN))
}

impl AccessTokenStrategy {
    #[must_use]
    pub fn new(verifier: Arc<dyn TokenVerifier>, monitor: Arc<dyn Monitor>) -> Self {
        Self {
            verifier,
            monitor,
            cache_ttl: Duration::from_secs(60),
            cache: Mutex::new(lru_with(DEFAULT_TOKEN_CACHE_CAPACITY)),
            evictions: AtomicU64::new(0),
        }
    }

    /// Configure the TTL for cached verdicts
    ///
    /// Default: 60 seconds
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Maximum number of cached verdicts; zero is treated as one
    ///
    /// Default: [`DEFAULT_TOKEN_CACHE_CAPACITY`]
    #[must_use]
    pub fn cache_capacity(self, capacity: usize) -> Self {
        Self {
            cache: Mutex::new(lru_with(capacity)),
            ..self
        }
    }

    pub fn cache_stats(&self) -> TokenCacheStats {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        TokenCacheStats {
            len: cache.len(),
            capacity: cache.cap().get(),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn cached(&self, token: &str) -> Option<bool> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let (at, valid) = *cache.get(token)?;
        if at.elapsed() < self.cache_ttl {
            return Some(valid);
        }
        cache.pop(token);
        None
    }

    fn store(&self, token: &str, valid: bool) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let will_evict = !cache.contains(token) && cache.len() >= cache.cap().get();
        cache.put(token.to_string(), (Instant::now(), valid));
        if will_evict {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    async fn check(&self, token: &str) -> anyhow::Result<bool> {
        let start = Instant::now();
        if let Some(valid) = self.cached(token) {
            self.monitor
                .record_access(ACCESS_TOKEN_MONITOR_KEY, true, elapsed_nanos(start));
            return Ok(valid);
        }
        let valid = self.verifier.verify(token).await?;
        self.store(token, valid);
        self.monitor
            .record_access(ACCESS_TOKEN_MONITOR_KEY, false, elapsed_nanos(start));
        Ok(valid)
    }
}

fn elapsed_nanos(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

#[async_trait]
impl Strategy for AccessTokenStrategy {
    fn name(&self) -> &str {
        "access_token"
    }

    fn order(&self) -> i32 {
        ACCESS_TOKEN_ORDER
    }

    async fn pre_handle(&self, ctx: &mut RequestContext) -> anyhow::Result<bool> {
        let Some(token) = ctx.access_token().map(str::trim).filter(|t| !t.is_empty()) else {
            debug!(trace_id = %ctx.trace_id(), "Access token missing");
            ctx.reject(Rejection::unauthorized("missing access token"));
            return Ok(false);
        };
        let token = token.to_string();
        if self.check(&token).await? {
            ctx.set_attribute(ATTR_TOKEN_VERIFIED, "true");
            Ok(true)
        } else {
            warn!(trace_id = %ctx.trace_id(), family = %ctx.family(), "Access token rejected");
            ctx.reject(Rejection::unauthorized("invalid access token"));
            Ok(false)
        }
    }
}
