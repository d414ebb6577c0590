//! Read-only feature catalogue and the analyzer seam.
//!
//! A [`FeatureTable`] is built once by whoever owns a set of features (the
//! detector, an analyzer) and passed by reference to consumers that need
//! display names or physical dimensions.

use serde::{Deserialize, Serialize};

use crate::Spot;

/// Physical dimension of a feature value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureDimension {
    None,
    Quality,
    Intensity,
    Position,
    Length,
    Angle,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub key: String,
    pub name: String,
    pub short_name: String,
    pub dimension: FeatureDimension,
}

/// Ordered, immutable-after-build list of feature descriptors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    entries: Vec<FeatureDescriptor>,
}

impl FeatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor; a repeated key replaces the earlier entry.
    pub fn with(
        mut self,
        key: &str,
        name: &str,
        short_name: &str,
        dimension: FeatureDimension,
    ) -> Self {
        let entry = FeatureDescriptor {
            key: key.to_owned(),
            name: name.to_owned(),
            short_name: short_name.to_owned(),
            dimension,
        };
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self
    }

    /// Features every detected spot carries.
    pub fn spot_defaults() -> Self {
        Self::new()
            .with(Spot::QUALITY, "Quality", "Quality", FeatureDimension::Quality)
            .with(Spot::POSITION_X, "X", "X", FeatureDimension::Position)
            .with(Spot::POSITION_Y, "Y", "Y", FeatureDimension::Position)
            .with(Spot::POSITION_Z, "Z", "Z", FeatureDimension::Position)
            .with(Spot::RADIUS, "Radius", "R", FeatureDimension::Length)
    }

    /// Combine two tables, keeping the order of `self` first.
    pub fn merged(mut self, other: &FeatureTable) -> Self {
        for e in &other.entries {
            self = self.with(&e.key, &e.name, &e.short_name, e.dimension);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&FeatureDescriptor> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureDescriptor> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Computes features for one spot at a time, independently of other spots.
pub trait SpotFeatureAnalyzer: Sync {
    type Error;

    /// Features this analyzer writes.
    fn features(&self) -> &FeatureTable;

    /// Compute and store features on `spot`.
    fn process(&self, spot: &mut Spot) -> Result<(), Self::Error>;
}
