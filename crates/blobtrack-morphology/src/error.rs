#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MorphologyError {
    #[error("neighbourhood has non-positive or non-finite total mass {total_mass}")]
    DegenerateInput { total_mass: f64 },
    #[error("morphology needs a 2D or 3D image, got {ndim} axes")]
    UnsupportedDimensionality { ndim: usize },
    #[error("shape classification needs 2 or 3 semi-axes, got {count}")]
    InvalidAxisCount { count: usize },
    #[error("neighbourhood radius must be positive and finite, got {radius}")]
    InvalidRadius { radius: f64 },
    #[error("tolerance factor must be finite and at least 1, got {tolerance}")]
    InvalidTolerance { tolerance: f64 },
    #[error("failed to build a morphology thread pool: {reason}")]
    ThreadPool { reason: String },
}
