//! Laplacian-of-Gaussian spot detector for a single region.
//!
//! The detector copies the requested interval plus a halo of surrounding
//! image voxels into a work volume, optionally median-filters it, convolves
//! it with a scale-normalised LoG tuned to the expected blob radius and
//! reports thresholded local maxima lying inside the interval as spots.
//!
//! The halo covers every sample the filters and the maxima test read for a
//! voxel of the interval, so the response inside a region equals the response
//! of the whole image there. Mirroring only happens at the image border.

mod filter;
mod maxima;

use std::ops::Range;

use blobtrack_core::{Calibration, ImageView, Interval, Spot};
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{ConfigError, DetectError, LogSettings, RegionDetector};
use filter::{Executor, Volume};

/// LoG detector bound to one image.
#[derive(Clone, Copy, Debug)]
pub struct LogDetector<'a> {
    image: ImageView<'a>,
    calibration: Calibration,
    settings: LogSettings,
    num_threads: usize,
}

impl<'a> LogDetector<'a> {
    pub fn new(
        image: ImageView<'a>,
        calibration: Calibration,
        settings: LogSettings,
        num_threads: usize,
    ) -> Self {
        Self {
            image,
            calibration,
            settings,
            num_threads,
        }
    }

    pub fn settings(&self) -> &LogSettings {
        &self.settings
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Gaussian scale matched to the configured radius: `radius / sqrt(ndim)`.
    pub fn sigma(&self) -> f64 {
        self.settings.radius / (self.image.num_dimensions() as f64).sqrt()
    }

    /// Voxels read beyond a region edge along each axis.
    ///
    /// Gaussian half-width, plus one for the second difference of the
    /// neighbour ring used by the maxima test, plus one for that ring itself,
    /// plus one in X/Y when the median prefilter runs.
    pub fn halo(&self) -> [i64; 3] {
        let sigma = self.sigma();
        let median = i64::from(self.settings.median_filter);
        let mut halo = [0i64; 3];
        for (d, h) in halo
            .iter_mut()
            .enumerate()
            .take(self.image.num_dimensions())
        {
            let half = filter::kernel_half_width(sigma / self.calibration.scale(d)) as i64;
            *h = half + 2 + if d < 2 { median } else { 0 };
        }
        halo
    }

    /// `interval` grown by the halo and clipped to the image.
    fn padded(&self, interval: &Interval) -> Result<Interval, ConfigError> {
        let bounds = self.image.interval();
        let halo = self.halo();
        let ndim = interval.num_dimensions();
        let min = (0..ndim)
            .map(|d| (interval.min(d) - halo[d]).max(bounds.min(d)))
            .collect();
        let max = (0..ndim)
            .map(|d| (interval.max(d) + halo[d]).min(bounds.max(d)))
            .collect();
        Ok(Interval::new(min, max)?)
    }

    fn check(&self, interval: &Interval) -> Result<(), ConfigError> {
        let ndim = self.image.num_dimensions();
        if !(2..=3).contains(&ndim) {
            return Err(ConfigError::UnsupportedDimensionality { ndim });
        }
        if interval.num_dimensions() != ndim {
            return Err(ConfigError::DimensionMismatch {
                interval: interval.num_dimensions(),
                image: ndim,
            });
        }
        let bounds = self.image.interval();
        if !bounds.contains_interval(interval) {
            return Err(ConfigError::IntervalOutsideImage {
                interval: interval.clone(),
                bounds,
            });
        }
        self.settings.validate()?;
        for axis in 0..ndim {
            let scale = self.calibration.scale(axis);
            if !(scale.is_finite() && scale > 0.0) {
                return Err(ConfigError::InvalidCalibration { axis, scale });
            }
        }
        if self.num_threads < 1 {
            return Err(ConfigError::ZeroThreads);
        }
        Ok(())
    }
}

impl RegionDetector for LogDetector<'_> {
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self), fields(threads = self.num_threads))
    )]
    fn detect(&self, interval: &Interval) -> Result<Vec<Spot>, DetectError> {
        self.check(interval)?;

        let exec = Executor::new(self.num_threads)?;
        let padded = self.padded(interval)?;
        let mut volume = Volume::crop(&self.image, &padded);
        if self.settings.median_filter {
            volume = filter::median_3x3(&exec, &volume);
        }

        let ndim = volume.ndim;
        let scales = self.calibration.scales();
        let sigma = self.sigma();
        let response = filter::laplacian_of_gaussian(&exec, &volume, sigma, &scales[..ndim]);

        // the requested interval in work-volume coordinates
        let window: [Range<usize>; 3] = std::array::from_fn(|d| {
            if d < ndim {
                let lo = (interval.min(d) - padded.min(d)) as usize;
                lo..lo + interval.dimension(d) as usize
            } else {
                0..1
            }
        });
        let peaks = maxima::find_peaks(
            &exec,
            &response,
            &window,
            self.settings.threshold,
            self.settings.sub_pixel,
        );

        let spots: Vec<Spot> = peaks
            .into_iter()
            .map(|peak| {
                let mut position = [0.0; 3];
                for (d, p) in position.iter_mut().enumerate().take(ndim) {
                    let pixel = (padded.min(d) + peak.voxel[d] as i64) as f64 + peak.offset[d];
                    *p = self.calibration.to_physical(d, pixel);
                }
                Spot::new(position, self.settings.radius).with_quality(peak.value)
            })
            .collect();

        debug!(
            "LoG on {:?}..={:?} (padded {:?}..={:?}): sigma {:.3}, {} spots",
            interval.mins(),
            interval.maxs(),
            padded.mins(),
            padded.maxs(),
            sigma,
            spots.len()
        );
        Ok(spots)
    }

    fn validate(&self, interval: &Interval) -> Result<(), DetectError> {
        Ok(self.check(interval)?)
    }

    fn with_num_threads(&self, num_threads: usize) -> Self {
        Self {
            num_threads,
            ..*self
        }
    }
}
