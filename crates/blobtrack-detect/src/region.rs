use blobtrack_core::{Interval, Spot};

use crate::DetectError;

/// A detector that finds spots inside one sub-interval of its image.
///
/// Implementors are used as prototypes by [`crate::BlockedDetector`]: each
/// block gets its own copy built with [`RegionDetector::with_num_threads`],
/// so a detector must not carry per-call mutable state.
pub trait RegionDetector: Sync {
    /// Detect spots whose voxel lies inside `interval`.
    fn detect(&self, interval: &Interval) -> Result<Vec<Spot>, DetectError>;

    /// Check that `interval` and the detector settings are usable without
    /// doing any detection work. Called once on the whole interval before
    /// it is split into blocks.
    fn validate(&self, _interval: &Interval) -> Result<(), DetectError> {
        Ok(())
    }

    /// Copy of this detector with identical settings and a new worker budget.
    fn with_num_threads(&self, num_threads: usize) -> Self
    where
        Self: Sized;
}
