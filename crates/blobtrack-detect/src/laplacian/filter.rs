//! Separable filtering on a block-local work volume.
//!
//! Every pass reads from an immutable source volume and fills an output
//! volume row by row (a row is one X line at fixed Y/Z). Samples that fall
//! outside the work volume are mirrored back inside it.

use blobtrack_core::{ImageView, Interval};
use rayon::prelude::*;

use crate::DetectError;

/// Runs row passes either inline or on a dedicated rayon pool.
pub(crate) enum Executor {
    Sequential,
    Pool(rayon::ThreadPool),
}

impl Executor {
    pub(crate) fn new(num_threads: usize) -> Result<Self, DetectError> {
        if num_threads <= 1 {
            return Ok(Self::Sequential);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;
        Ok(Self::Pool(pool))
    }

    pub(crate) fn fill_rows<F>(&self, out: &mut [f64], row_len: usize, f: F)
    where
        F: Fn(usize, &mut [f64]) + Send + Sync,
    {
        match self {
            Self::Sequential => out
                .chunks_mut(row_len)
                .enumerate()
                .for_each(|(r, row)| f(r, row)),
            Self::Pool(pool) => pool.install(|| {
                out.par_chunks_mut(row_len)
                    .enumerate()
                    .for_each(|(r, row)| f(r, row))
            }),
        }
    }

    /// Concatenate per-row results in row order.
    pub(crate) fn flat_map_rows<T, F>(&self, rows: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> Vec<T> + Send + Sync,
    {
        match self {
            Self::Sequential => (0..rows).flat_map(f).collect(),
            Self::Pool(pool) => pool.install(|| {
                let per_row: Vec<Vec<T>> = (0..rows).into_par_iter().map(f).collect();
                per_row.into_iter().flatten().collect()
            }),
        }
    }
}

/// Reflect `i` into `[0, n)`, repeating the edge sample (`-1 -> 0`).
#[inline]
pub(crate) fn mirror(i: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m >= n {
        (period - 1 - m) as usize
    } else {
        m as usize
    }
}

/// Dense block-local copy of an image region, X fastest.
///
/// Planar data is stored with a depth of 1.
#[derive(Clone, Debug)]
pub(crate) struct Volume {
    pub dims: [usize; 3],
    pub ndim: usize,
    pub data: Vec<f64>,
}

impl Volume {
    /// Copy the voxels of `interval` out of `image`.
    ///
    /// The caller has already checked that the interval lies inside the image
    /// and has the image's rank.
    pub(crate) fn crop(image: &ImageView<'_>, interval: &Interval) -> Self {
        let ndim = interval.num_dimensions();
        let mut dims = [1usize; 3];
        for (d, dim) in dims.iter_mut().enumerate().take(ndim) {
            *dim = interval.dimension(d) as usize;
        }
        let [nx, ny, nz] = dims;
        let mut data = Vec::with_capacity(nx * ny * nz);
        let mut start = interval.mins().to_vec();
        for z in 0..nz {
            if ndim == 3 {
                start[2] = interval.min(2) + z as i64;
            }
            for y in 0..ny {
                start[1] = interval.min(1) + y as i64;
                if let Some(base) = image.shape.offset_of(&start) {
                    data.extend(image.data[base..base + nx].iter().map(|&v| v as f64));
                }
            }
        }
        Self { dims, ndim, data }
    }

    #[cfg(test)]
    pub(crate) fn from_data(dims: &[usize], data: Vec<f64>) -> Self {
        let mut full = [1usize; 3];
        full[..dims.len()].copy_from_slice(dims);
        Self {
            dims: full,
            ndim: dims.len(),
            data,
        }
    }

    pub(crate) fn zeros_like(&self) -> Self {
        Self {
            dims: self.dims,
            ndim: self.ndim,
            data: vec![0.0; self.data.len()],
        }
    }

    #[inline]
    pub(crate) fn rows(&self) -> usize {
        self.dims[1] * self.dims[2]
    }

    #[inline]
    pub(crate) fn strides(&self) -> [usize; 3] {
        [1, self.dims[0], self.dims[0] * self.dims[1]]
    }

    /// `(y, z)` of a row index.
    #[inline]
    pub(crate) fn row_coords(&self, row: usize) -> (usize, usize) {
        (row % self.dims[1], row / self.dims[1])
    }

    #[inline]
    pub(crate) fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.dims[0] * (y + self.dims[1] * z)
    }
}

/// Half-width of the Gaussian kernel for a standard deviation in pixels.
#[inline]
pub(crate) fn kernel_half_width(sigma_px: f64) -> usize {
    (3.0 * sigma_px).ceil().max(1.0) as usize
}

/// Normalised Gaussian taps for a standard deviation in pixels.
pub(crate) fn gaussian_kernel(sigma_px: f64) -> Vec<f64> {
    let half = kernel_half_width(sigma_px) as isize;
    let two_s2 = 2.0 * sigma_px * sigma_px;
    let mut taps: Vec<f64> = (-half..=half)
        .map(|k| (-((k * k) as f64) / two_s2).exp())
        .collect();
    let sum: f64 = taps.iter().sum();
    taps.iter_mut().for_each(|t| *t /= sum);
    taps
}

/// Correlate every line along `axis` with an odd-length centred kernel.
pub(crate) fn convolve_axis(
    exec: &Executor,
    src: &Volume,
    axis: usize,
    kernel: &[f64],
) -> Volume {
    let half = (kernel.len() / 2) as isize;
    let strides = src.strides();
    let extent = src.dims[axis];
    let mut out = src.zeros_like();
    exec.fill_rows(&mut out.data, src.dims[0], |row, line| {
        let (y, z) = src.row_coords(row);
        for (x, o) in line.iter_mut().enumerate() {
            let coord = [x, y, z][axis] as isize;
            let base = src.index(x, y, z) - coord as usize * strides[axis];
            *o = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let c = mirror(coord + k as isize - half, extent);
                    w * src.data[base + c * strides[axis]]
                })
                .sum();
        }
    });
    out
}

/// 3x3 median of each XY plane.
pub(crate) fn median_3x3(exec: &Executor, src: &Volume) -> Volume {
    let [nx, ny, _] = src.dims;
    let mut out = src.zeros_like();
    exec.fill_rows(&mut out.data, nx, |row, line| {
        let (y, z) = src.row_coords(row);
        let mut window = [0.0f64; 9];
        for (x, o) in line.iter_mut().enumerate() {
            let mut i = 0;
            for dy in -1..=1isize {
                let yy = mirror(y as isize + dy, ny);
                for dx in -1..=1isize {
                    let xx = mirror(x as isize + dx, nx);
                    window[i] = src.data[src.index(xx, yy, z)];
                    i += 1;
                }
            }
            window.select_nth_unstable_by(4, f64::total_cmp);
            *o = window[4];
        }
    });
    out
}

/// Scale-normalised negative Laplacian of a Gaussian.
///
/// `sigma` is physical; `scales` holds the physical size of a pixel per axis.
pub(crate) fn laplacian_of_gaussian(
    exec: &Executor,
    src: &Volume,
    sigma: f64,
    scales: &[f64],
) -> Volume {
    let mut smoothed = src.clone();
    for (axis, &scale) in scales.iter().enumerate().take(src.ndim) {
        smoothed = convolve_axis(exec, &smoothed, axis, &gaussian_kernel(sigma / scale));
    }

    let mut response = src.zeros_like();
    for (axis, &scale) in scales.iter().enumerate().take(src.ndim) {
        let h2 = scale * scale;
        let second = convolve_axis(exec, &smoothed, axis, &[1.0 / h2, -2.0 / h2, 1.0 / h2]);
        response
            .data
            .iter_mut()
            .zip(&second.data)
            .for_each(|(r, s)| *r += s);
    }
    let norm = -sigma * sigma;
    response.data.iter_mut().for_each(|r| *r *= norm);
    response
}
