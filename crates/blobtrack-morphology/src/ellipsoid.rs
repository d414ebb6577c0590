//! Best-resembling ellipse / ellipsoid of an inertia tensor.
//!
//! For a solid ellipsoid the principal moments satisfy
//! `a^2 = 5/2 (I2 + I3 - I1)`, where `a` lies along the eigenvector of `I1`.
//! In the plane a uniform ellipse has `I = b^2 / 4` about its major axis, so
//! the length `sqrt(4 I)` belongs to the axis perpendicular to that
//! eigenvector.

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::InertiaTensor;

/// One semi-axis of a fitted ellipsoid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SemiAxis {
    /// Physical length.
    pub length: f64,
    /// Angle of the axis projection in the XY plane, in `(-pi/2, pi/2]`.
    pub azimuth: f64,
    /// Angle from the Z axis, in `[0, pi]`; 0 for planar fits.
    pub elevation: f64,
}

/// Semi-axes of a fit, sorted by ascending length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SemiAxisSet {
    axes: Vec<SemiAxis>,
}

impl SemiAxisSet {
    /// Sort `axes` by length; ties keep their input order.
    pub fn from_unsorted(mut axes: Vec<SemiAxis>) -> Self {
        axes.sort_by(|a, b| a.length.total_cmp(&b.length));
        Self { axes }
    }

    pub fn axes(&self) -> &[SemiAxis] {
        &self.axes
    }

    pub fn lengths(&self) -> Vec<f64> {
        self.axes.iter().map(|a| a.length).collect()
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn smallest(&self) -> Option<&SemiAxis> {
        self.axes.first()
    }

    pub fn largest(&self) -> Option<&SemiAxis> {
        self.axes.last()
    }
}

/// Fold an angle into `(-pi/2, pi/2]`; an axis and its opposite are the same.
pub fn fold_azimuth(angle: f64) -> f64 {
    if angle <= -FRAC_PI_2 {
        angle + PI
    } else if angle > FRAC_PI_2 {
        angle - PI
    } else {
        angle
    }
}

fn axis_along(length: f64, v: Vector3<f64>) -> SemiAxis {
    let norm = v.norm();
    let elevation = if norm > 0.0 {
        (v.z / norm).clamp(-1.0, 1.0).acos()
    } else {
        0.0
    };
    SemiAxis {
        length,
        azimuth: fold_azimuth(v.y.atan2(v.x)),
        elevation,
    }
}

fn planar_axis(length: f64, v: Vector2<f64>) -> SemiAxis {
    SemiAxis {
        length,
        azimuth: fold_azimuth(v.y.atan2(v.x)),
        elevation: 0.0,
    }
}

#[inline]
fn clamped_sqrt(radicand: f64) -> f64 {
    radicand.max(0.0).sqrt()
}

/// Fit the ellipse (2D) or ellipsoid (3D) matching an inertia tensor.
pub fn fit_ellipsoid(tensor: &InertiaTensor) -> SemiAxisSet {
    let axes = match tensor {
        InertiaTensor::Volumetric(m) => {
            let eig = m.symmetric_eigen();
            let trace: f64 = eig.eigenvalues.iter().sum();
            (0..3)
                .map(|i| {
                    let length = clamped_sqrt(2.5 * (trace - 2.0 * eig.eigenvalues[i]));
                    axis_along(length, eig.eigenvectors.column(i).into_owned())
                })
                .collect()
        }
        InertiaTensor::Planar(m) => {
            let eig = m.symmetric_eigen();
            (0..2)
                .map(|i| {
                    let length = clamped_sqrt(4.0 * eig.eigenvalues[i]);
                    let v = eig.eigenvectors.column(i);
                    planar_axis(length, Vector2::new(-v[1], v[0]))
                })
                .collect()
        }
    };
    SemiAxisSet::from_unsorted(axes)
}
