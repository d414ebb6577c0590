//! Blob morphology: ellipsoid fitting and shape classification of spots.
//!
//! For every spot the analyzer gathers the intensity inside a disc (2D) or
//! ball (3D) of the spot radius, builds the mass-normalised inertia tensor,
//! derives the semi-axes of the equivalent uniform ellipse/ellipsoid from its
//! eigen-decomposition and labels the shape as sphere, oblate, prolate or
//! scalene.
//!
//! ```no_run
//! use blobtrack_core::{Calibration, Image, Shape, Spot, SpotFeatureAnalyzer};
//! use blobtrack_morphology::{BlobMorphology, MorphologyParams, MORPHOLOGY};
//!
//! let img = Image::zeros(Shape::planar(64, 64).unwrap());
//! let analyzer =
//!     BlobMorphology::new(img.view(), Calibration::default(), &MorphologyParams::default())
//!         .unwrap();
//! let mut spot = Spot::new([32.0, 32.0, 0.0], 6.0);
//! if analyzer.process(&mut spot).is_ok() {
//!     println!("shape code {:?}", spot.feature(MORPHOLOGY));
//! }
//! ```

mod analyzer;
mod classify;
mod ellipsoid;
mod error;
mod moments;

pub use analyzer::{
    analyze, fit_spot, morphology_features, BlobMorphology, Morphology, MorphologyParams,
    MorphologyReport, SkippedSpot, AXIS_PHI, AXIS_THETA, MORPHOLOGY, SEMI_AXIS_LENGTH,
};
pub use classify::{ShapeClassifier, ShapeLabel, DEFAULT_TOLERANCE};
pub use ellipsoid::{fit_ellipsoid, fold_azimuth, SemiAxis, SemiAxisSet};
pub use error::MorphologyError;
pub use moments::{InertiaTensor, MomentAccumulator};
