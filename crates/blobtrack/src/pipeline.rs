use blobtrack_core::{Calibration, CalibrationError, FeatureTable, ImageError, ImageView, Spot};
use blobtrack_detect::{detect_blocked, DetectError, DetectorConfig};
use blobtrack_morphology::{
    morphology_features, BlobMorphology, MorphologyError, MorphologyParams, MorphologyReport,
};
use log::info;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the end-to-end helpers.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("no image paths given")]
    NoImages,

    #[error("plane {index} is {got:?} but the first plane is {expected:?}")]
    PlaneSizeMismatch {
        index: usize,
        expected: (u32, u32),
        got: (u32, u32),
    },

    #[cfg(feature = "image")]
    #[error(transparent)]
    Decode(#[from] ::image::ImageError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Morphology(#[from] MorphologyError),
}

/// Spots and the optional morphology summary of one run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub spots: Vec<Spot>,
    pub morphology: Option<MorphologyReport>,
}

/// Catalogue of the features written by a run.
pub fn feature_table(with_morphology: bool) -> FeatureTable {
    let table = FeatureTable::spot_defaults();
    if with_morphology {
        table.merged(&morphology_features())
    } else {
        table
    }
}

/// Detect spots over the whole image, then fit their morphology if requested.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(shape = ?image.shape.dims()))
)]
pub fn detect_spots(
    image: &ImageView<'_>,
    calibration: &Calibration,
    detector: &DetectorConfig,
    morphology: Option<&MorphologyParams>,
) -> Result<PipelineOutput, PipelineError> {
    let mut spots = detect_blocked(image, &image.interval(), calibration, detector)?;
    info!("detected {} spots", spots.len());

    let morphology = match morphology {
        Some(params) => {
            let analyzer = BlobMorphology::new(*image, *calibration, params)?
                .with_num_threads(detector.num_threads)?;
            Some(analyzer.process_all(&mut spots))
        }
        None => None,
    };
    Ok(PipelineOutput { spots, morphology })
}

/// Load the images named by `config`, run the pipeline and build a report.
///
/// Failures past image loading are recorded in [`DetectReport::error`] so the
/// report can still be written.
#[cfg(feature = "image")]
pub fn run_config(
    config: &crate::DetectConfig,
    config_path: &std::path::Path,
) -> Result<crate::DetectReport, PipelineError> {
    let paths = config.resolved_image_paths(config_path);
    let image = crate::load::load_stack(&paths)?;
    info!(
        "running on {:?} from {} file(s)",
        image.shape.dims(),
        paths.len()
    );

    let features = feature_table(config.morphology.is_some());
    let mut report = crate::DetectReport::new(config_path, image.shape.dims(), features);
    match detect_spots(
        &image.view(),
        &config.calibration,
        &config.detector,
        config.morphology.as_ref(),
    ) {
        Ok(out) => report.set_spots(out.spots, out.morphology),
        Err(err) => {
            log::warn!("detection failed: {err}");
            report.set_error(err);
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobtrack_core::{Image, Shape};
    use blobtrack_morphology::{ShapeLabel, MORPHOLOGY};

    #[test]
    fn feature_table_includes_morphology_on_request() {
        assert_eq!(feature_table(false).len(), 5);
        let full = feature_table(true);
        assert_eq!(full.len(), 15);
        assert!(full.get(MORPHOLOGY).is_some());
        assert!(full.get(Spot::QUALITY).is_some());
    }

    #[test]
    fn detected_round_blob_gets_sphere_label() {
        let shape = Shape::planar(48, 48).unwrap();
        let mut img = Image::zeros(shape);
        for pos in shape.interval().positions() {
            let r2 = (pos[0] as f64 - 12.0).powi(2) + (pos[1] as f64 - 13.0).powi(2);
            img.set(&pos, (100.0 * (-r2 / 8.0).exp()) as f32);
        }
        let detector = DetectorConfig::new(2.0 * 2f64.sqrt(), 10.0)
            .with_nsplit(2)
            .with_num_threads(2);
        let out = detect_spots(
            &img.view(),
            &Calibration::default(),
            &detector,
            Some(&MorphologyParams::default()),
        )
        .unwrap();
        assert_eq!(out.spots.len(), 1);
        assert_eq!(
            out.spots[0].feature(MORPHOLOGY),
            Some(ShapeLabel::Sphere.code() as f64)
        );
        assert_eq!(out.morphology.map(|m| m.analyzed), Some(1));
    }
}
