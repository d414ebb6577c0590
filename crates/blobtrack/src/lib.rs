//! Facade crate for the `blobtrack-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core, detector and morphology crates
//! - end-to-end helpers that detect spots with the blocked LoG detector and
//!   then fit an ellipsoid to each spot
//! - (feature `image`) loading of single planes and Z stacks from files
//! - the JSON run configuration and report used by the `blobtrack` binary
//!
//! ## Quickstart
//!
//! ```no_run
//! use blobtrack::core::Calibration;
//! use blobtrack::detect::DetectorConfig;
//! use blobtrack::morphology::MorphologyParams;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = blobtrack::load::load_plane("cells.png")?;
//! let detector = DetectorConfig::new(3.0, 5.0).with_nsplit(2);
//! let out = blobtrack::detect_spots(
//!     &image.view(),
//!     &Calibration::default(),
//!     &detector,
//!     Some(&MorphologyParams::default()),
//! )?;
//! println!("{} spots", out.spots.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `blobtrack::core`: intervals, images, calibration, spots, feature catalogue.
//! - `blobtrack::detect`: block partition and the blocked LoG detector.
//! - `blobtrack::morphology`: moment-based ellipsoid fit and shape labels.
//! - `blobtrack::load` (feature `image`): plane and stack loading.

pub use blobtrack_core as core;
pub use blobtrack_detect as detect;
pub use blobtrack_morphology as morphology;

pub use blobtrack_core::{Calibration, Image, ImageView, Interval, Spot};
pub use blobtrack_detect::DetectorConfig;
pub use blobtrack_morphology::{MorphologyParams, ShapeLabel};

mod io;
mod pipeline;

pub use io::{DetectConfig, DetectReport, IoError};
pub use pipeline::{detect_spots, feature_table, PipelineError, PipelineOutput};

#[cfg(feature = "image")]
pub use pipeline::run_config;

#[cfg(feature = "image")]
pub mod load;
