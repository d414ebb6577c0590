//! Laplacian-of-Gaussian spot detection with tiled execution.
//!
//! - [`LogDetector`] finds blobs of a given radius inside one interval of an
//!   image,
//! - [`compute_block`] / [`block_grid`] split an interval into an
//!   `nsplit x nsplit` grid over X and Y,
//! - [`BlockedDetector`] runs any [`RegionDetector`] on every block and merges
//!   the spots in row-major block order.
//!
//! [`detect_blocked`] wires the three together from a [`DetectorConfig`].

mod blocked;
mod error;
mod laplacian;
mod params;
mod partition;
mod region;

pub use blocked::{detect_blocked, split_thread_budget, BlockedDetector, ThreadBudget};
pub use error::{ConfigError, DetectError};
pub use laplacian::LogDetector;
pub use params::{DetectorConfig, LogSettings};
pub use partition::{block_grid, compute_block, Block};
pub use region::RegionDetector;
