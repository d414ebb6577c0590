//! Core types for spot detection and spot morphology.
//!
//! This crate holds the data model shared by the detector and analyzer
//! crates: integer [`Interval`]s, real-valued 2D/3D images, per-axis
//! [`Calibration`], detected [`Spot`]s and the read-only feature catalogue.
//! It does not depend on any image I/O library.

mod calibration;
mod feature;
mod image;
mod interval;
mod logger;
mod spot;

pub use calibration::{Calibration, CalibrationError};
pub use feature::{FeatureDescriptor, FeatureDimension, FeatureTable, SpotFeatureAnalyzer};
pub use image::{Image, ImageError, ImageView, Shape, MAX_DIMS};
pub use interval::{Interval, IntervalError, Positions};
pub use spot::Spot;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level, parse_level, LOG_ENV_VAR};
