//! Structured logging setup.
//!
//! Everything in the crate logs through `tracing`; this module installs the
//! subscriber. Output is JSON for production or pretty-printed for
//! development, filtered by level and thinned by a sampling layer that
//! always keeps WARN and ERROR events.
//!
//! | Variable                   | Values                          | Default   |
//! |----------------------------|---------------------------------|-----------|
//! | `VORTEX_LOG_LEVEL`         | trace/debug/info/warn/error     | `info`    |
//! | `VORTEX_LOG_FORMAT`        | json/pretty                     | `json`    |
//! | `VORTEX_LOG_SAMPLING_MODE` | all/error-only/sampled          | `all`     |
//! | `VORTEX_LOG_SAMPLING_RATE` | 0.0-1.0, used by `sampled`      | `0.1`     |
//! | `VORTEX_LOG_ASYNC`         | true/false                      | `false`   |
//! | `VORTEX_LOG_TARGET_FILTER` | comma-separated directives      | none      |
//!
//! `RUST_LOG`, when set, takes precedence over `VORTEX_LOG_LEVEL`.

use anyhow::{Context, Result};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::subscriber::Interest;
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Which events reach the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Everything that passes the level filter
    All,
    /// Only WARN and ERROR
    ErrorOnly,
    /// WARN and ERROR, plus a fraction of everything else
    Sampled,
}

impl SamplingMode {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "error-only" | "error_only" => SamplingMode::ErrorOnly,
            "sampled" => SamplingMode::Sampled,
            _ => SamplingMode::All,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    pub sampling_mode: SamplingMode,
    /// Fraction of sub-WARN events kept in `Sampled` mode
    pub sampling_rate: f64,
    /// Write through a non-blocking background writer
    pub async_logging: bool,
    /// Extra `EnvFilter` directives, comma-separated
    pub target_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            sampling_mode: SamplingMode::All,
            sampling_rate: 0.1,
            async_logging: false,
            target_filter: None,
        }
    }
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: env::var("VORTEX_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: env::var("VORTEX_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.format),
            sampling_mode: env::var("VORTEX_LOG_SAMPLING_MODE")
                .map(|s| SamplingMode::parse(&s))
                .unwrap_or(defaults.sampling_mode),
            sampling_rate: env::var("VORTEX_LOG_SAMPLING_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.sampling_rate),
            async_logging: env::var("VORTEX_LOG_ASYNC")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.async_logging),
            target_filter: env::var("VORTEX_LOG_TARGET_FILTER").ok(),
        }
    }

    /// Pretty, unsampled debug output for local runs
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            sampling_mode: SamplingMode::All,
            sampling_rate: 1.0,
            ..Self::default()
        }
    }

    fn level(&self) -> Level {
        match self.log_level.trim().to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Sampling layer: decides whether an event is emitted
pub struct SamplingLayer {
    mode: SamplingMode,
    sampling_rate: f64,
    counter: AtomicU64,
}

impl SamplingLayer {
    pub fn new(mode: SamplingMode, sampling_rate: f64) -> Self {
        Self {
            mode,
            sampling_rate: sampling_rate.clamp(0.0, 1.0),
            counter: AtomicU64::new(0),
        }
    }

    fn should_sample(&self, metadata: &Metadata<'_>) -> bool {
        // Spans always pass so sampled events keep their context
        metadata.is_span() || self.keep(*metadata.level())
    }

    /// Callsite interest: `sometimes` keeps `enabled` consulted per event
    /// wherever the verdict can change between events.
    fn interest(&self, level: Level) -> Interest {
        let severe = matches!(level, Level::WARN | Level::ERROR);
        match self.mode {
            SamplingMode::All => Interest::always(),
            _ if severe => Interest::always(),
            SamplingMode::ErrorOnly => Interest::never(),
            SamplingMode::Sampled if self.sampling_rate <= 0.0 => Interest::never(),
            SamplingMode::Sampled if self.sampling_rate >= 1.0 => Interest::always(),
            SamplingMode::Sampled => Interest::sometimes(),
        }
    }

    fn keep(&self, level: Level) -> bool {
        let severe = matches!(level, Level::WARN | Level::ERROR);
        match self.mode {
            SamplingMode::All => true,
            SamplingMode::ErrorOnly => severe,
            SamplingMode::Sampled => {
                if severe {
                    return true;
                }
                if self.sampling_rate <= 0.0 {
                    return false;
                }
                let count = self.counter.fetch_add(1, Ordering::Relaxed);
                let interval = (1.0 / self.sampling_rate) as u64;
                interval > 0 && count.is_multiple_of(interval)
            }
        }
    }
}

impl<S> Layer<S> for SamplingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn register_callsite(&self, metadata: &'static Metadata<'static>) -> Interest {
        if metadata.is_span() {
            return Interest::always();
        }
        self.interest(*metadata.level())
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: LayerContext<'_, S>) -> bool {
        self.should_sample(metadata)
    }

    fn on_event(&self, _event: &Event<'_>, _ctx: LayerContext<'_, S>) {}
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already set.
///
/// ```no_run
/// use vortex::logging::{init_logging_with_config, LogConfig};
///
/// init_logging_with_config(&LogConfig::from_env()).expect("logging");
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let mut env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level().as_str()));

    // Connection-level chatter from the HTTP client stack
    for noisy in ["hyper_util=warn", "reqwest=warn", "tungstenite=warn"] {
        if let Ok(directive) = noisy.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            match filter.parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(_) => eprintln!("Warning: Invalid log filter directive: {filter}"),
            }
        }
    }

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(SamplingLayer::new(config.sampling_mode, config.sampling_rate));

    if config.async_logging {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        let fmt_layer = match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_writer(writer)
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .with_writer(writer)
                .boxed(),
        };
        registry
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize async logging")?;
        // The writer thread must outlive every log call
        std::mem::forget(guard);
    } else {
        let fmt_layer = match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .boxed(),
        };
        registry
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize logging")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Json);
    }

    #[test]
    fn test_sampling_mode_parse() {
        assert_eq!(SamplingMode::parse("error-only"), SamplingMode::ErrorOnly);
        assert_eq!(SamplingMode::parse("error_only"), SamplingMode::ErrorOnly);
        assert_eq!(SamplingMode::parse("Sampled"), SamplingMode::Sampled);
        assert_eq!(SamplingMode::parse("whatever"), SamplingMode::All);
    }

    #[test]
    fn test_error_only_keeps_warn_and_error() {
        let layer = SamplingLayer::new(SamplingMode::ErrorOnly, 1.0);
        assert!(layer.keep(Level::ERROR));
        assert!(layer.keep(Level::WARN));
        assert!(!layer.keep(Level::INFO));
    }

    #[test]
    fn test_sampled_mode_thins_info() {
        let layer = SamplingLayer::new(SamplingMode::Sampled, 0.25);
        let kept = (0..100)
            .filter(|_| layer.keep(Level::INFO))
            .count();
        assert_eq!(kept, 25);
        assert!(layer.keep(Level::WARN));

        let silent = SamplingLayer::new(SamplingMode::Sampled, 0.0);
        assert!(!silent.keep(Level::DEBUG));
        assert!(silent.keep(Level::ERROR));
    }

    #[test]
    fn test_sampled_callsites_stay_dynamic() {
        let sampled = SamplingLayer::new(SamplingMode::Sampled, 0.25);
        assert!(sampled.interest(Level::INFO).is_sometimes());
        assert!(sampled.interest(Level::DEBUG).is_sometimes());
        assert!(sampled.interest(Level::WARN).is_always());

        let error_only = SamplingLayer::new(SamplingMode::ErrorOnly, 1.0);
        assert!(error_only.interest(Level::INFO).is_never());
        assert!(error_only.interest(Level::ERROR).is_always());

        assert!(SamplingLayer::new(SamplingMode::All, 0.0)
            .interest(Level::TRACE)
            .is_always());
        assert!(SamplingLayer::new(SamplingMode::Sampled, 0.0)
            .interest(Level::INFO)
            .is_never());
    }

    #[test]
    fn test_level_falls_back_to_info() {
        let config = LogConfig {
            log_level: "loud".into(),
            ..LogConfig::default()
        };
        assert_eq!(config.level(), Level::INFO);
        assert_eq!(LogConfig::default_dev().level(), Level::DEBUG);
    }
}
