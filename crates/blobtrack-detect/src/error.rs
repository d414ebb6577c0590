use blobtrack_core::{Interval, IntervalError};

/// Configuration problems detected before any work starts.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("nsplit cannot be lower than 1, got {nsplit}")]
    NSplitTooSmall { nsplit: usize },
    #[error("number of threads must be at least 1")]
    ZeroThreads,
    #[error("radius must be positive and finite, got {radius}")]
    InvalidRadius { radius: f64 },
    #[error("threshold must be finite, got {threshold}")]
    InvalidThreshold { threshold: f64 },
    #[error("block index ix={ix}, iy={iy} is outside a {nsplit}x{nsplit} grid")]
    BlockIndexOutOfRange { ix: usize, iy: usize, nsplit: usize },
    #[error("axis {axis} spans {extent} pixels, too few to split {nsplit} ways")]
    IntervalTooSmall { axis: usize, extent: i64, nsplit: usize },
    #[error("expected 2 or 3 axes, got {ndim}")]
    UnsupportedDimensionality { ndim: usize },
    #[error("interval has {interval} axes but the image has {image}")]
    DimensionMismatch { interval: usize, image: usize },
    #[error("calibration for axis {axis} must be positive and finite, got {scale}")]
    InvalidCalibration { axis: usize, scale: f64 },
    #[error("interval {interval:?} is not inside the image bounds {bounds:?}")]
    IntervalOutsideImage { interval: Interval, bounds: Interval },
    #[error(transparent)]
    Interval(#[from] IntervalError),
}

/// Errors returned by region and blocked detectors.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    #[error("block ix={ix}, iy={iy}: {source}")]
    DetectionFailure {
        ix: usize,
        iy: usize,
        #[source]
        source: Box<DetectError>,
    },
    #[error("region detection failed: {0}")]
    Region(String),
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl DetectError {
    /// Grid coordinates of the failing block, if this error came from one.
    pub fn block(&self) -> Option<(usize, usize)> {
        match self {
            Self::DetectionFailure { ix, iy, .. } => Some((*ix, *iy)),
            _ => None,
        }
    }
}
