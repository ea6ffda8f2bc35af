use super::Strategy;
use crate::router::ProtocolFamily;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Feature flags enabled for this process, loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureFlags(BTreeSet<String>);

impl FeatureFlags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_enabled(&self, flag: &str) -> bool {
        self.0.contains(flag)
    }

    pub fn enable(&mut self, flag: impl Into<String>) {
        self.0.insert(flag.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FeatureFlags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Where a registered strategy applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applicability {
    families: Option<Vec<ProtocolFamily>>,
    feature: Option<String>,
}

impl Applicability {
    /// Every routable family, no feature flag required.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn families(families: impl IntoIterator<Item = ProtocolFamily>) -> Self {
        Self {
            families: Some(families.into_iter().collect()),
            feature: None,
        }
    }

    /// Only select the strategy when `flag` is enabled.
    #[must_use]
    pub fn requires_feature(mut self, flag: impl Into<String>) -> Self {
        self.feature = Some(flag.into());
        self
    }

    #[must_use]
    pub fn applies(&self, family: ProtocolFamily, features: &FeatureFlags) -> bool {
        let family_ok = self
            .families
            .as_ref()
            .is_none_or(|set| set.contains(&family));
        let feature_ok = self
            .feature
            .as_deref()
            .is_none_or(|flag| features.is_enabled(flag));
        family_ok && feature_ok
    }
}

/// Inputs to strategy selection for one request.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub family: ProtocolFamily,
    pub features: &'a FeatureFlags,
}

impl<'a> Selection<'a> {
    #[must_use]
    pub fn new(family: ProtocolFamily, features: &'a FeatureFlags) -> Self {
        Self { family, features }
    }
}

struct Registration {
    strategy: Arc<dyn Strategy>,
    applicability: Applicability,
}

/// Immutable set of strategies registered at startup.
pub struct StrategyRegistry {
    registrations: Vec<Registration>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn builder() -> StrategyRegistryBuilder {
        StrategyRegistryBuilder::default()
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Registered strategy names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.registrations.iter().map(|r| r.strategy.name()).collect()
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}

#[derive(Default)]
pub struct StrategyRegistryBuilder {
    registrations: Vec<Registration>,
}

impl StrategyRegistryBuilder {
    #[must_use]
    pub fn register(mut self, strategy: Arc<dyn Strategy>, applicability: Applicability) -> Self {
        self.registrations.push(Registration {
            strategy,
            applicability,
        });
        self
    }

    /// Register a strategy that applies to every routable family.
    #[must_use]
    pub fn register_global(self, strategy: Arc<dyn Strategy>) -> Self {
        self.register(strategy, Applicability::all())
    }

    #[must_use]
    pub fn build(self) -> StrategyRegistry {
        info!(
            strategy_count = self.registrations.len(),
            "Strategy registry built"
        );
        StrategyRegistry {
            registrations: self.registrations,
        }
    }
}

/// Picks the ordered strategy chain for a request.
#[derive(Debug)]
pub struct StrategyFactory {
    registry: StrategyRegistry,
    features: FeatureFlags,
}

impl StrategyFactory {
    #[must_use]
    pub fn new(registry: StrategyRegistry, features: FeatureFlags) -> Self {
        Self { registry, features }
    }

    #[must_use]
    pub fn features(&self) -> &FeatureFlags {
        &self.features
    }

    #[must_use]
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Strategies applicable to the selection, ascending by `order()`.
    ///
    /// Equal orders keep registration order. Unroutable families get an
    /// empty chain.
    #[must_use]
    pub fn strategies_for(&self, selection: &Selection<'_>) -> Vec<Arc<dyn Strategy>> {
        if !selection.family.is_routable() {
            return Vec::new();
        }
        let mut chain: Vec<Arc<dyn Strategy>> = self
            .registry
            .registrations
            .iter()
            .filter(|r| r.applicability.applies(selection.family, selection.features))
            .map(|r| Arc::clone(&r.strategy))
            .collect();
        chain.sort_by_key(|s| s.order());
        debug!(
            family = %selection.family,
            selected = chain.len(),
            registered = self.registry.len(),
            "Strategy chain selected"
        );
        chain
    }

    /// Chain for a family under this factory's feature flags.
    #[must_use]
    pub fn for_family(&self, family: ProtocolFamily) -> Vec<Arc<dyn Strategy>> {
        self.strategies_for(&Selection::new(family, &self.features))
    }
}
