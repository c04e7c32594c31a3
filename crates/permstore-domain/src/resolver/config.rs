//! Configuration for the permission resolver.

use crate::model::{Feature, FeatureSet, UserId};

/// Configuration for the permission resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Users that bypass every check (by convention the system users 0 and 1).
    pub superuser_ids: Vec<UserId>,
    /// Enabled features. Multichannelling switches permission lookups to
    /// master objects.
    pub features: FeatureSet,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            superuser_ids: vec![0, 1],
            features: FeatureSet::new(),
        }
    }
}

impl ResolverConfig {
    /// Sets the superuser ids.
    pub fn with_superuser_ids(mut self, superuser_ids: Vec<UserId>) -> Self {
        self.superuser_ids = superuser_ids;
        self
    }

    /// Sets the enabled features.
    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    /// Enables a single feature.
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.set(feature, true);
        self
    }

    pub fn multichannelling(&self) -> bool {
        self.features.is_enabled(Feature::Multichannelling)
    }
}
