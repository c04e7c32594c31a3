//! Feature flags that gate types, bits and resolver behaviour.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// An optional product feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Channels derived from nodes; permissions are stored against masters.
    Multichannelling,
    /// Role permissions overlaid on page/file permissions.
    RolePermissions,
    /// Developer tools packages.
    Devtools,
    /// Content repository fragments.
    CrFragments,
    /// Wastebin for deleted objects.
    Wastebin,
    /// Datasource administration.
    Datasources,
}

/// Set of enabled features.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeSet<Feature>);

impl FeatureSet {
    /// Creates an empty feature set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this set with `feature` enabled.
    pub fn with(mut self, feature: Feature) -> Self {
        self.0.insert(feature);
        self
    }

    /// Enables or disables a feature.
    pub fn set(&mut self, feature: Feature, enabled: bool) {
        if enabled {
            self.0.insert(feature);
        } else {
            self.0.remove(&feature);
        }
    }

    /// Returns whether `feature` is enabled.
    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    /// Returns whether every feature in `features` is enabled.
    pub fn all_enabled(&self, features: &[Feature]) -> bool {
        features.iter().all(|f| self.is_enabled(*f))
    }

    /// Iterates over the enabled features.
    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<T: IntoIterator<Item = Feature>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
