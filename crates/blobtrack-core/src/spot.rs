use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Calibration;

/// A detected point-like object.
///
/// The position is fixed at creation. Feature values accumulate over the
/// spot's lifetime: analyzers insert or overwrite entries but never remove
/// them. Two spots with identical values are still distinct objects, so no
/// value equality is provided.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Spot {
    position: [f64; 3],
    radius: f64,
    #[serde(default)]
    features: BTreeMap<String, f64>,
}

impl Spot {
    pub const QUALITY: &'static str = "QUALITY";
    pub const POSITION_X: &'static str = "POSITION_X";
    pub const POSITION_Y: &'static str = "POSITION_Y";
    pub const POSITION_Z: &'static str = "POSITION_Z";
    pub const RADIUS: &'static str = "RADIUS";

    /// Create a spot at a physical position (Z is 0 for planar data).
    pub fn new(position: [f64; 3], radius: f64) -> Self {
        let mut features = BTreeMap::new();
        features.insert(Self::POSITION_X.to_owned(), position[0]);
        features.insert(Self::POSITION_Y.to_owned(), position[1]);
        features.insert(Self::POSITION_Z.to_owned(), position[2]);
        features.insert(Self::RADIUS.to_owned(), radius);
        Self {
            position,
            radius,
            features,
        }
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.put_feature(Self::QUALITY, quality);
        self
    }

    #[inline]
    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Radius used by feature analyzers: the `RADIUS` feature if present.
    pub fn analysis_radius(&self) -> f64 {
        self.feature(Self::RADIUS).unwrap_or(self.radius)
    }

    pub fn quality(&self) -> Option<f64> {
        self.feature(Self::QUALITY)
    }

    pub fn feature(&self, key: &str) -> Option<f64> {
        self.features.get(key).copied()
    }

    pub fn put_feature(&mut self, key: impl Into<String>, value: f64) {
        self.features.insert(key.into(), value);
    }

    pub fn features(&self) -> &BTreeMap<String, f64> {
        &self.features
    }

    /// Position in (fractional) pixel coordinates.
    pub fn pixel_position(&self, calibration: &Calibration) -> [f64; 3] {
        [0, 1, 2].map(|d| calibration.to_pixel(d, self.position[d]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn new_spot_carries_position_features() {
        let spot = Spot::new([1.0, 2.0, 0.0], 3.0).with_quality(12.5);
        assert_eq!(spot.feature(Spot::POSITION_Y), Some(2.0));
        assert_eq!(spot.feature(Spot::RADIUS), Some(3.0));
        assert_eq!(spot.quality(), Some(12.5));
        assert_eq!(spot.feature("MISSING"), None);
    }

    #[test]
    fn put_feature_overwrites() {
        let mut spot = Spot::new([0.0; 3], 1.0);
        spot.put_feature("MORPHOLOGY", 1.0);
        spot.put_feature("MORPHOLOGY", 2.0);
        assert_eq!(spot.feature("MORPHOLOGY"), Some(2.0));
        assert_eq!(
            spot.features().keys().filter(|k| *k == "MORPHOLOGY").count(),
            1
        );
    }

    #[test]
    fn analysis_radius_prefers_feature() {
        let mut spot = Spot::new([0.0; 3], 2.0);
        assert_relative_eq!(spot.analysis_radius(), 2.0);
        spot.put_feature(Spot::RADIUS, 4.5);
        assert_relative_eq!(spot.analysis_radius(), 4.5);
        assert_relative_eq!(spot.radius(), 2.0);
    }

    #[test]
    fn pixel_position_uses_calibration() {
        let cal = Calibration::new(&[0.5, 0.5, 2.0]).unwrap();
        let spot = Spot::new([1.0, 2.0, 4.0], 1.0);
        assert_eq!(spot.pixel_position(&cal), [2.0, 4.0, 2.0]);
    }
}
