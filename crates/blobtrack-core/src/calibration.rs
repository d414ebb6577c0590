use serde::{Deserialize, Serialize};

use crate::image::MAX_DIMS;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("calibration must have 1 to {MAX_DIMS} axes, got {0}")]
    AxisCount(usize),
    #[error("axis {axis}: scale {value} must be positive and finite")]
    InvalidScale { axis: usize, value: f64 },
}

/// Physical size of one pixel/voxel along each axis.
///
/// Unused axes (Z for planar data) keep a scale of 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Calibration {
    scale: [f64; MAX_DIMS],
}

impl Default for Calibration {
    fn default() -> Self {
        Self::isotropic(1.0)
    }
}

impl Calibration {
    pub fn new(scale: &[f64]) -> Result<Self, CalibrationError> {
        if scale.is_empty() || scale.len() > MAX_DIMS {
            return Err(CalibrationError::AxisCount(scale.len()));
        }
        let mut out = [1.0; MAX_DIMS];
        for (axis, &value) in scale.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(CalibrationError::InvalidScale { axis, value });
            }
            out[axis] = value;
        }
        Ok(Self { scale: out })
    }

    pub fn isotropic(scale: f64) -> Self {
        Self {
            scale: [scale; MAX_DIMS],
        }
    }

    #[inline]
    pub fn scale(&self, axis: usize) -> f64 {
        self.scale[axis]
    }

    pub fn scales(&self) -> [f64; MAX_DIMS] {
        self.scale
    }

    /// Pixel index coordinate to physical coordinate.
    #[inline]
    pub fn to_physical(&self, axis: usize, pixel: f64) -> f64 {
        pixel * self.scale[axis]
    }

    /// Physical coordinate to (fractional) pixel index coordinate.
    #[inline]
    pub fn to_pixel(&self, axis: usize, physical: f64) -> f64 {
        physical / self.scale[axis]
    }

    /// Nearest pixel index of a physical coordinate.
    #[inline]
    pub fn nearest_pixel(&self, axis: usize, physical: f64) -> i64 {
        self.to_pixel(axis, physical).round() as i64
    }
}

impl TryFrom<Vec<f64>> for Calibration {
    type Error = CalibrationError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Calibration> for Vec<f64> {
    fn from(value: Calibration) -> Self {
        value.scale.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_non_positive_scales() {
        assert_eq!(
            Calibration::new(&[0.2, 0.0]),
            Err(CalibrationError::InvalidScale {
                axis: 1,
                value: 0.0
            })
        );
        assert!(Calibration::new(&[f64::NAN]).is_err());
        assert_eq!(Calibration::new(&[]), Err(CalibrationError::AxisCount(0)));
    }

    #[test]
    fn converts_between_pixel_and_physical() {
        let cal = Calibration::new(&[0.25, 0.25, 1.5]).unwrap();
        assert_relative_eq!(cal.to_physical(2, 4.0), 6.0);
        assert_relative_eq!(cal.to_pixel(0, 1.0), 4.0);
        assert_eq!(cal.nearest_pixel(2, 4.4), 3);
    }

    #[test]
    fn planar_calibration_pads_z_with_unit_scale() {
        let cal: Calibration = serde_json::from_str("[0.5, 0.5]").unwrap();
        assert_eq!(cal.scales(), [0.5, 0.5, 1.0]);
    }
}
