use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Settings shared by every region detector of one detection run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Expected blob radius, in physical units.
    pub radius: f64,
    /// Minimal LoG response for a local maximum to become a spot.
    pub threshold: f64,
    /// Refine maxima positions with a per-axis parabolic fit.
    pub sub_pixel: bool,
    /// Run a 3x3 median filter on each XY plane before filtering.
    pub median_filter: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            radius: 5.0,
            threshold: 0.0,
            sub_pixel: true,
            median_filter: false,
        }
    }
}

impl LogSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigError::InvalidRadius {
                radius: self.radius,
            });
        }
        if !self.threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold {
                threshold: self.threshold,
            });
        }
        Ok(())
    }
}

/// Full configuration of a blocked LoG detection run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    #[serde(flatten)]
    pub log: LogSettings,
    /// Number of grid divisions along X and along Y.
    pub nsplit: usize,
    /// Total worker budget shared between blocks and per-block filtering.
    pub num_threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            log: LogSettings::default(),
            nsplit: 1,
            num_threads: default_num_threads(),
        }
    }
}

impl DetectorConfig {
    pub fn new(radius: f64, threshold: f64) -> Self {
        Self {
            log: LogSettings {
                radius,
                threshold,
                ..LogSettings::default()
            },
            ..Self::default()
        }
    }

    pub fn with_nsplit(mut self, nsplit: usize) -> Self {
        self.nsplit = nsplit;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nsplit < 1 {
            return Err(ConfigError::NSplitTooSmall {
                nsplit: self.nsplit,
            });
        }
        if self.num_threads < 1 {
            return Err(ConfigError::ZeroThreads);
        }
        self.log.validate()
    }
}

fn default_num_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
