use blobtrack_core::{
    Calibration, FeatureDimension, FeatureTable, ImageView, Spot, SpotFeatureAnalyzer,
};
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    fit_ellipsoid, MomentAccumulator, MorphologyError, SemiAxisSet, ShapeClassifier, ShapeLabel,
    DEFAULT_TOLERANCE,
};

pub const MORPHOLOGY: &str = "MORPHOLOGY";
/// Semi-axis length keys, smallest (C) to largest (A).
pub const SEMI_AXIS_LENGTH: [&str; 3] = [
    "ELLIPSOIDFIT_SEMIAXISLENGTH_C",
    "ELLIPSOIDFIT_SEMIAXISLENGTH_B",
    "ELLIPSOIDFIT_SEMIAXISLENGTH_A",
];
pub const AXIS_PHI: [&str; 3] = [
    "ELLIPSOIDFIT_AXISPHI_C",
    "ELLIPSOIDFIT_AXISPHI_B",
    "ELLIPSOIDFIT_AXISPHI_A",
];
pub const AXIS_THETA: [&str; 3] = [
    "ELLIPSOIDFIT_AXISTHETA_C",
    "ELLIPSOIDFIT_AXISTHETA_B",
    "ELLIPSOIDFIT_AXISTHETA_A",
];

const AXIS_NAMES: [char; 3] = ['C', 'B', 'A'];

/// Catalogue entries for every feature written by [`BlobMorphology`].
pub fn morphology_features() -> FeatureTable {
    let mut table =
        FeatureTable::new().with(MORPHOLOGY, "Morphology", "Morpho.", FeatureDimension::None);
    for (i, name) in AXIS_NAMES.iter().enumerate() {
        let lower = name.to_ascii_lowercase();
        table = table
            .with(
                SEMI_AXIS_LENGTH[i],
                &format!("Ellipsoid {name} semi-axis length"),
                &format!("l{lower}"),
                FeatureDimension::Length,
            )
            .with(
                AXIS_PHI[i],
                &format!("Ellipsoid {name} axis φ azimuth"),
                &format!("φ{lower}"),
                FeatureDimension::Angle,
            )
            .with(
                AXIS_THETA[i],
                &format!("Ellipsoid {name} axis θ elevation"),
                &format!("θ{lower}"),
                FeatureDimension::Angle,
            );
    }
    table
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologyParams {
    /// Ratio above which one semi-axis counts as longer than another.
    pub tolerance: f64,
}

impl Default for MorphologyParams {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Result of fitting one spot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Morphology {
    pub axes: SemiAxisSet,
    pub label: ShapeLabel,
}

/// A spot the batch analyzer could not fit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkippedSpot {
    /// Index in the batch passed to [`BlobMorphology::process_all`].
    pub index: usize,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MorphologyReport {
    pub analyzed: usize,
    pub skipped: Vec<SkippedSpot>,
}

/// Fit the ellipsoid of the intensity around `spot` and classify it with the
/// default tolerance.
pub fn analyze(
    spot: &Spot,
    radius: f64,
    image: &ImageView<'_>,
    calibration: &Calibration,
) -> Result<(SemiAxisSet, ShapeLabel), MorphologyError> {
    let axes = fit_spot(spot, radius, image, calibration)?;
    let label = ShapeClassifier::default().classify(&axes.lengths())?;
    Ok((axes, label))
}

/// Fit the ellipsoid of the intensity inside the disc/ball of `radius`.
pub fn fit_spot(
    spot: &Spot,
    radius: f64,
    image: &ImageView<'_>,
    calibration: &Calibration,
) -> Result<SemiAxisSet, MorphologyError> {
    let moments = MomentAccumulator::gather(spot, radius, image, calibration)?;
    Ok(fit_ellipsoid(&moments.tensor()?))
}

/// Spot analyzer writing ellipsoid-fit and shape features.
pub struct BlobMorphology<'a> {
    image: ImageView<'a>,
    calibration: Calibration,
    classifier: ShapeClassifier,
    features: FeatureTable,
    /// Dedicated pool for [`BlobMorphology::process_all`]; `None` runs inline.
    pool: Option<rayon::ThreadPool>,
}

impl<'a> BlobMorphology<'a> {
    pub fn new(
        image: ImageView<'a>,
        calibration: Calibration,
        params: &MorphologyParams,
    ) -> Result<Self, MorphologyError> {
        let ndim = image.num_dimensions();
        if !(2..=3).contains(&ndim) {
            return Err(MorphologyError::UnsupportedDimensionality { ndim });
        }
        Ok(Self {
            image,
            calibration,
            classifier: ShapeClassifier::new(params.tolerance)?,
            features: morphology_features(),
            pool: None,
        })
    }

    /// Run [`BlobMorphology::process_all`] on a pool of `num_threads`
    /// workers. `0` and `1` keep the work on the calling thread.
    pub fn with_num_threads(mut self, num_threads: usize) -> Result<Self, MorphologyError> {
        self.pool = if num_threads <= 1 {
            None
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build()
                .map_err(|e| MorphologyError::ThreadPool {
                    reason: e.to_string(),
                })?;
            Some(pool)
        };
        Ok(self)
    }

    /// Fit and classify one spot without touching its features.
    ///
    /// The neighbourhood radius is the spot's `RADIUS` feature.
    pub fn analyze(&self, spot: &Spot) -> Result<Morphology, MorphologyError> {
        let axes = fit_spot(spot, spot.analysis_radius(), &self.image, &self.calibration)?;
        let label = self.classifier.classify(&axes.lengths())?;
        Ok(Morphology { axes, label })
    }

    /// Process every spot, on the worker pool set by
    /// [`BlobMorphology::with_num_threads`] if any. Spots that cannot be
    /// fitted keep their features unchanged and are listed in the report.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(spots = spots.len())))]
    pub fn process_all(&self, spots: &mut [Spot]) -> MorphologyReport {
        let skip = |index: usize, spot: &mut Spot| {
            self.process(spot).err().map(|e| SkippedSpot {
                index,
                reason: e.to_string(),
            })
        };
        let failures: Vec<Option<SkippedSpot>> = match &self.pool {
            Some(pool) => pool.install(|| {
                spots
                    .par_iter_mut()
                    .enumerate()
                    .map(|(index, spot)| skip(index, spot))
                    .collect()
            }),
            None => spots
                .iter_mut()
                .enumerate()
                .map(|(index, spot)| skip(index, spot))
                .collect(),
        };

        let skipped: Vec<SkippedSpot> = failures.into_iter().flatten().collect();
        for s in &skipped {
            warn!("morphology skipped spot {}: {}", s.index, s.reason);
        }
        let report = MorphologyReport {
            analyzed: spots.len() - skipped.len(),
            skipped,
        };
        debug!(
            "morphology: {} analyzed, {} skipped",
            report.analyzed,
            report.skipped.len()
        );
        report
    }
}

fn write_features(spot: &mut Spot, result: &Morphology) {
    for (i, axis) in result.axes.axes().iter().enumerate() {
        spot.put_feature(SEMI_AXIS_LENGTH[i], axis.length);
        spot.put_feature(AXIS_PHI[i], axis.azimuth);
        spot.put_feature(AXIS_THETA[i], axis.elevation);
    }
    // planar fits have no A axis
    for i in result.axes.len()..3 {
        spot.put_feature(SEMI_AXIS_LENGTH[i], 0.0);
        spot.put_feature(AXIS_PHI[i], 0.0);
        spot.put_feature(AXIS_THETA[i], 0.0);
    }
    spot.put_feature(MORPHOLOGY, result.label.code() as f64);
}

impl SpotFeatureAnalyzer for BlobMorphology<'_> {
    type Error = MorphologyError;

    fn features(&self) -> &FeatureTable {
        &self.features
    }

    fn process(&self, spot: &mut Spot) -> Result<(), MorphologyError> {
        let result = self.analyze(spot)?;
        write_features(spot, &result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobtrack_core::{Image, Shape};

    #[test]
    fn feature_table_lists_every_key_with_its_dimension() {
        let table = morphology_features();
        assert_eq!(table.len(), 10);
        assert_eq!(
            table.get(MORPHOLOGY).map(|d| d.dimension),
            Some(FeatureDimension::None)
        );
        for i in 0..3 {
            assert_eq!(
                table.get(SEMI_AXIS_LENGTH[i]).map(|d| d.dimension),
                Some(FeatureDimension::Length)
            );
            assert_eq!(
                table.get(AXIS_PHI[i]).map(|d| d.dimension),
                Some(FeatureDimension::Angle)
            );
            let theta = table.get(AXIS_THETA[i]).unwrap();
            assert_eq!(theta.dimension, FeatureDimension::Angle);
            assert!(theta.name.contains("elevation"));
        }
        assert_eq!(table.get(SEMI_AXIS_LENGTH[2]).unwrap().short_name, "la");
    }

    #[test]
    fn process_writes_all_keys_for_planar_spots() {
        let shape = Shape::planar(21, 21).unwrap();
        let mut img = Image::zeros(shape);
        for x in 5..16 {
            img.set(&[x, 10], 1.0);
            img.set(&[x, 11], 1.0);
        }
        let analyzer =
            BlobMorphology::new(img.view(), Calibration::default(), &MorphologyParams::default())
                .unwrap();
        let mut spot = Spot::new([10.0, 10.0, 0.0], 8.0);
        analyzer.process(&mut spot).unwrap();
        for key in analyzer.features().keys() {
            assert!(spot.feature(key).is_some(), "missing {key}");
        }
        assert_eq!(spot.feature(SEMI_AXIS_LENGTH[2]), Some(0.0));
        assert_eq!(spot.feature(MORPHOLOGY), Some(ShapeLabel::Prolate.code() as f64));
        let lc = spot.feature(SEMI_AXIS_LENGTH[0]).unwrap();
        let lb = spot.feature(SEMI_AXIS_LENGTH[1]).unwrap();
        assert!(lc <= lb);
        assert!(spot.feature(AXIS_PHI[1]).unwrap().abs() < 1e-9);
    }

    #[test]
    fn empty_neighbourhood_is_skipped_and_reported() {
        let shape = Shape::planar(32, 32).unwrap();
        let mut img = Image::zeros(shape);
        for y in 2..7 {
            for x in 2..7 {
                img.set(&[x, y], 5.0);
            }
        }
        let analyzer =
            BlobMorphology::new(img.view(), Calibration::default(), &MorphologyParams::default())
                .unwrap();
        let mut spots = vec![
            Spot::new([4.0, 4.0, 0.0], 3.0),
            Spot::new([25.0, 25.0, 0.0], 3.0),
        ];
        let report = analyzer.process_all(&mut spots);
        assert_eq!(report.analyzed, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 1);
        assert!(report.skipped[0].reason.contains("total mass"));
        assert_eq!(spots[0].feature(MORPHOLOGY), Some(0.0));
        assert_eq!(spots[1].feature(MORPHOLOGY), None);
    }

    #[test]
    fn pooled_batch_matches_inline_batch() {
        let shape = Shape::planar(40, 40).unwrap();
        let mut img = Image::zeros(shape);
        for pos in shape.interval().positions() {
            let (x, y) = (pos[0] as f64, pos[1] as f64);
            let a = (-((x - 10.0).powi(2) / 18.0 + (y - 12.0).powi(2) / 4.0)).exp();
            let b = (-((x - 28.0).powi(2) + (y - 27.0).powi(2)) / 8.0).exp();
            img.set(&pos, (50.0 * (a + b)) as f32);
        }
        let spots = vec![
            Spot::new([10.0, 12.0, 0.0], 6.0),
            Spot::new([28.0, 27.0, 0.0], 5.0),
            Spot::new([38.0, 2.0, 0.0], 1.0),
        ];
        let params = MorphologyParams::default();

        let inline = BlobMorphology::new(img.view(), Calibration::default(), &params)
            .unwrap()
            .with_num_threads(1)
            .unwrap();
        let mut a = spots.clone();
        let report_a = inline.process_all(&mut a);

        let pooled = BlobMorphology::new(img.view(), Calibration::default(), &params)
            .unwrap()
            .with_num_threads(4)
            .unwrap();
        let mut b = spots;
        let report_b = pooled.process_all(&mut b);

        assert_eq!(report_a, report_b);
        assert_eq!(report_a.analyzed + report_a.skipped.len(), 3);
        for (sa, sb) in a.iter().zip(&b) {
            for key in inline.features().keys() {
                assert_eq!(sa.feature(key), sb.feature(key), "{key}");
            }
        }
        assert_eq!(
            a[0].feature(MORPHOLOGY),
            Some(ShapeLabel::Prolate.code() as f64)
        );
    }

    #[test]
    fn rejects_bad_tolerance() {
        let img = Image::zeros(Shape::planar(4, 4).unwrap());
        let params = MorphologyParams { tolerance: 0.9 };
        assert!(matches!(
            BlobMorphology::new(img.view(), Calibration::default(), &params),
            Err(MorphologyError::InvalidTolerance { .. })
        ));
    }
}
