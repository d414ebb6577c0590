//! Tiled execution of a region detector.
//!
//! [`BlockedDetector`] splits the requested interval into an `nsplit x nsplit`
//! grid over X and Y, runs a copy of its prototype detector on every block and
//! concatenates the results in row-major block order (`ix` outer, `iy`
//! inner). Spots are not deduplicated across block borders.

use std::sync::atomic::{AtomicBool, Ordering};

use blobtrack_core::{Calibration, ImageView, Interval, Spot};
use log::debug;
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::partition::{block_grid, Block};
use crate::{ConfigError, DetectError, DetectorConfig, LogDetector, RegionDetector};

/// How a total worker budget is shared between blocks and each block's detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThreadBudget {
    /// Blocks processed concurrently.
    pub outer: usize,
    /// Workers handed to each block's detector.
    pub inner: usize,
}

/// Split `num_threads` over `num_blocks` blocks.
///
/// `outer = min(num_threads, num_blocks)` and `inner = max(1, num_threads /
/// outer)`, so a single block gets the whole budget.
pub fn split_thread_budget(num_threads: usize, num_blocks: usize) -> ThreadBudget {
    let outer = num_threads.min(num_blocks).max(1);
    let inner = (num_threads / outer).max(1);
    ThreadBudget { outer, inner }
}

/// Runs a prototype [`RegionDetector`] on every block of a grid.
#[derive(Clone, Debug)]
pub struct BlockedDetector<D> {
    prototype: D,
    nsplit: usize,
    num_threads: usize,
}

impl<D: RegionDetector> BlockedDetector<D> {
    pub fn new(prototype: D, nsplit: usize, num_threads: usize) -> Result<Self, ConfigError> {
        check(nsplit, num_threads)?;
        Ok(Self {
            prototype,
            nsplit,
            num_threads,
        })
    }

    pub fn nsplit(&self) -> usize {
        self.nsplit
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn prototype(&self) -> &D {
        &self.prototype
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self), fields(nsplit = self.nsplit, threads = self.num_threads))
    )]
    fn run(&self, interval: &Interval) -> Result<Vec<Spot>, DetectError> {
        let blocks = self.plan(interval)?;
        let budget = split_thread_budget(self.num_threads, blocks.len());
        debug!(
            "blocked detection: {} blocks, {} concurrent, {} threads each",
            blocks.len(),
            budget.outer,
            budget.inner
        );

        let spots = if budget.outer == 1 {
            self.run_sequential(&blocks, budget.inner)?
        } else {
            self.run_pooled(&blocks, budget)?
        };
        debug!("blocked detection: {} spots in total", spots.len());
        Ok(spots)
    }

    /// Validate everything up front and lay out the block grid.
    fn plan(&self, interval: &Interval) -> Result<Vec<Block>, DetectError> {
        check(self.nsplit, self.num_threads)?;
        self.prototype.validate(interval)?;
        Ok(block_grid(interval, self.nsplit)?)
    }

    fn run_sequential(&self, blocks: &[Block], inner: usize) -> Result<Vec<Spot>, DetectError> {
        let detector = self.prototype.with_num_threads(inner);
        let mut spots = Vec::new();
        for block in blocks {
            spots.extend(detect_block(&detector, block)?);
        }
        Ok(spots)
    }

    fn run_pooled(&self, blocks: &[Block], budget: ThreadBudget) -> Result<Vec<Spot>, DetectError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(budget.outer)
            .build()?;
        let failed = AtomicBool::new(false);

        // `None` marks blocks skipped after another block failed.
        let results: Vec<Option<Result<Vec<Spot>, DetectError>>> = pool.install(|| {
            blocks
                .par_iter()
                .map(|block| {
                    if failed.load(Ordering::Relaxed) {
                        return None;
                    }
                    let detector = self.prototype.with_num_threads(budget.inner);
                    let result = detect_block(&detector, block);
                    if result.is_err() {
                        failed.store(true, Ordering::Relaxed);
                    }
                    Some(result)
                })
                .collect()
        });

        let mut spots = Vec::new();
        for result in results.into_iter().flatten() {
            spots.extend(result?);
        }
        Ok(spots)
    }
}

impl<D: RegionDetector> RegionDetector for BlockedDetector<D> {
    fn detect(&self, interval: &Interval) -> Result<Vec<Spot>, DetectError> {
        self.run(interval)
    }

    fn validate(&self, interval: &Interval) -> Result<(), DetectError> {
        self.plan(interval).map(|_| ())
    }

    fn with_num_threads(&self, num_threads: usize) -> Self {
        Self {
            prototype: self.prototype.with_num_threads(num_threads),
            nsplit: self.nsplit,
            num_threads,
        }
    }
}

fn check(nsplit: usize, num_threads: usize) -> Result<(), ConfigError> {
    if nsplit < 1 {
        return Err(ConfigError::NSplitTooSmall { nsplit });
    }
    if num_threads < 1 {
        return Err(ConfigError::ZeroThreads);
    }
    Ok(())
}

fn detect_block<D: RegionDetector>(detector: &D, block: &Block) -> Result<Vec<Spot>, DetectError> {
    let spots = detector
        .detect(&block.interval)
        .map_err(|source| DetectError::DetectionFailure {
            ix: block.ix,
            iy: block.iy,
            source: Box::new(source),
        })?;
    debug!(
        "block ({}, {}) {:?}..={:?}: {} spots",
        block.ix,
        block.iy,
        block.interval.mins(),
        block.interval.maxs(),
        spots.len()
    );
    Ok(spots)
}

/// Blocked LoG detection over `interval` of `image`.
pub fn detect_blocked(
    image: &ImageView<'_>,
    interval: &Interval,
    calibration: &Calibration,
    config: &DetectorConfig,
) -> Result<Vec<Spot>, DetectError> {
    config.validate()?;
    let prototype = LogDetector::new(*image, *calibration, config.log, config.num_threads);
    BlockedDetector::new(prototype, config.nsplit, config.num_threads)?.detect(interval)
}
