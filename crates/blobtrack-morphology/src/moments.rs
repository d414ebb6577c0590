//! Second moments of intensity around a spot.
//!
//! Offsets are measured in physical units from the voxel nearest to the spot
//! centre, so the resulting tensor (and every length derived from it) is in
//! physical units too.

use blobtrack_core::{Calibration, ImageView, Spot};
use nalgebra::{Matrix2, Matrix3};

use crate::MorphologyError;

/// Running sums of the inertia components of an intensity distribution.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MomentAccumulator {
    ndim: usize,
    count: usize,
    mass: f64,
    ixx: f64,
    iyy: f64,
    izz: f64,
    ixy: f64,
    ixz: f64,
    iyz: f64,
}

impl MomentAccumulator {
    pub fn planar() -> Self {
        Self {
            ndim: 2,
            ..Self::default()
        }
    }

    pub fn volumetric() -> Self {
        Self {
            ndim: 3,
            ..Self::default()
        }
    }

    /// Add a sample of intensity `mass` at a physical offset from the centre.
    ///
    /// The Z component is ignored for planar accumulators.
    pub fn add(&mut self, offset: [f64; 3], mass: f64) {
        let [x, y, z] = offset;
        self.count += 1;
        self.mass += mass;
        if self.ndim == 2 {
            self.ixx += mass * y * y;
            self.iyy += mass * x * x;
            self.ixy -= mass * x * y;
        } else {
            self.ixx += mass * (y * y + z * z);
            self.iyy += mass * (x * x + z * z);
            self.izz += mass * (x * x + y * y);
            self.ixy -= mass * x * y;
            self.ixz -= mass * x * z;
            self.iyz -= mass * y * z;
        }
    }

    /// Accumulate every voxel of the disc (2D) or ball (3D) of physical
    /// `radius` around the voxel nearest to the spot. Only offsets that land
    /// inside the image are visited.
    pub fn gather(
        spot: &Spot,
        radius: f64,
        image: &ImageView<'_>,
        calibration: &Calibration,
    ) -> Result<Self, MorphologyError> {
        let ndim = image.num_dimensions();
        let mut acc = match ndim {
            2 => Self::planar(),
            3 => Self::volumetric(),
            _ => return Err(MorphologyError::UnsupportedDimensionality { ndim }),
        };
        if !(radius.is_finite() && radius > 0.0) {
            return Err(MorphologyError::InvalidRadius { radius });
        }

        let pixel = spot.pixel_position(calibration);
        let scales = calibration.scales();
        // offsets per axis, limited to the reach of the radius and to the image
        let mut span = [0i64..=0, 0..=0, 0..=0];
        let mut centre = [0i64; 3];
        for d in 0..ndim {
            centre[d] = pixel[d].round() as i64;
            let reach = (radius / scales[d]).floor() as i64;
            let last = image.shape.dim(d) as i64 - 1;
            span[d] = (-reach).max(-centre[d])..=reach.min(last - centre[d]);
        }

        let r2 = radius * radius;
        let mut voxel = vec![0i64; ndim];
        for dz in span[2].clone() {
            let oz = dz as f64 * scales[2];
            for dy in span[1].clone() {
                let oy = dy as f64 * scales[1];
                for dx in span[0].clone() {
                    let ox = dx as f64 * scales[0];
                    let offset = if ndim == 3 { [ox, oy, oz] } else { [ox, oy, 0.0] };
                    if offset.iter().map(|o| o * o).sum::<f64>() > r2 {
                        continue;
                    }
                    voxel[0] = centre[0] + dx;
                    voxel[1] = centre[1] + dy;
                    if ndim == 3 {
                        voxel[2] = centre[2] + dz;
                    }
                    if let Some(v) = image.get(&voxel) {
                        acc.add(offset, v as f64);
                    }
                }
            }
        }
        Ok(acc)
    }

    pub fn num_dimensions(&self) -> usize {
        self.ndim
    }

    /// Number of samples added.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn total_mass(&self) -> f64 {
        self.mass
    }

    /// Mass-normalised inertia tensor.
    pub fn tensor(&self) -> Result<InertiaTensor, MorphologyError> {
        let m = self.mass;
        if !(m.is_finite() && m > 0.0) {
            return Err(MorphologyError::DegenerateInput { total_mass: m });
        }
        let tensor = if self.ndim == 2 {
            InertiaTensor::Planar(Matrix2::new(self.ixx, self.ixy, self.ixy, self.iyy) / m)
        } else {
            InertiaTensor::Volumetric(
                Matrix3::new(
                    self.ixx, self.ixy, self.ixz, //
                    self.ixy, self.iyy, self.iyz, //
                    self.ixz, self.iyz, self.izz,
                ) / m,
            )
        };
        Ok(tensor)
    }
}

/// Symmetric inertia tensor normalised by total mass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InertiaTensor {
    Planar(Matrix2<f64>),
    Volumetric(Matrix3<f64>),
}

impl InertiaTensor {
    pub fn num_dimensions(&self) -> usize {
        match self {
            Self::Planar(_) => 2,
            Self::Volumetric(_) => 3,
        }
    }
}
