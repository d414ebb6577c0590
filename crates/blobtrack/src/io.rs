//! JSON run configuration and detection report.

use std::{
    fs,
    path::{Path, PathBuf},
};

use blobtrack_core::{Calibration, FeatureTable, Spot};
use blobtrack_detect::DetectorConfig;
use blobtrack_morphology::{MorphologyParams, MorphologyReport, SkippedSpot};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn default_morphology() -> Option<MorphologyParams> {
    Some(MorphologyParams::default())
}

/// Configuration of one detection run.
///
/// `image_paths` lists single-plane files; more than one path is stacked
/// into a volume, one Z plane per file. Set `morphology` to `null` to skip
/// the ellipsoid fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectConfig {
    pub image_paths: Vec<String>,
    #[serde(default)]
    pub calibration: Calibration,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default = "default_morphology")]
    pub morphology: Option<MorphologyParams>,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            image_paths: vec!["plane_000.png".to_owned()],
            calibration: Calibration::default(),
            detector: DetectorConfig::default(),
            morphology: default_morphology(),
            output_path: None,
        }
    }
}

impl DetectConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Report path, `blobtrack_report.json` when unset.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("blobtrack_report.json"))
    }

    /// Image paths resolved against the directory holding the config file.
    pub fn resolved_image_paths(&self, config_path: &Path) -> Vec<PathBuf> {
        let base = config_path.parent().unwrap_or_else(|| Path::new(""));
        self.image_paths
            .iter()
            .map(|p| {
                let p = Path::new(p);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    base.join(p)
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectReport {
    pub config_path: String,
    pub image_shape: Vec<usize>,
    pub num_spots: usize,
    pub spots: Vec<Spot>,
    /// Catalogue of every feature key present on the spots.
    pub features: FeatureTable,
    #[serde(default)]
    pub skipped_morphology: Vec<SkippedSpot>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DetectReport {
    pub fn new(config_path: &Path, image_shape: &[usize], features: FeatureTable) -> Self {
        Self {
            config_path: config_path.to_string_lossy().into_owned(),
            image_shape: image_shape.to_vec(),
            num_spots: 0,
            spots: Vec::new(),
            features,
            skipped_morphology: Vec::new(),
            error: None,
        }
    }

    pub fn set_spots(&mut self, spots: Vec<Spot>, morphology: Option<MorphologyReport>) {
        self.num_spots = spots.len();
        self.spots = spots;
        self.skipped_morphology = morphology.map(|m| m.skipped).unwrap_or_default();
        self.error = None;
    }

    pub fn set_error(&mut self, err: impl std::fmt::Display) {
        self.error = Some(err.to_string());
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
