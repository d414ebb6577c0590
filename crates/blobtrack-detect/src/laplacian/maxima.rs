use std::ops::Range;

use super::filter::{Executor, Volume};

/// Local maximum of a response volume, in block-local voxel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Peak {
    pub voxel: [usize; 3],
    /// Sub-voxel offset per axis, within `[-0.5, 0.5]`.
    pub offset: [f64; 3],
    pub value: f64,
}

/// Linear offsets of the 3^ndim - 1 neighbours, with their coordinate deltas.
fn neighbourhood(vol: &Volume) -> Vec<([isize; 3], isize)> {
    let strides = vol.strides();
    let range = |d: usize| if d < vol.ndim { -1..=1isize } else { 0..=0isize };
    let mut out = Vec::with_capacity(26);
    for dz in range(2) {
        for dy in range(1) {
            for dx in range(0) {
                if dx == 0 && dy == 0 && dz == 0 {
                    continue;
                }
                let delta = dx + dy * strides[1] as isize + dz * strides[2] as isize;
                out.push(([dx, dy, dz], delta));
            }
        }
    }
    out
}

/// Voxels of `window` whose response exceeds `threshold` and every neighbour.
///
/// Neighbours are read from the whole volume, including voxels outside the
/// window. A neighbour earlier in raster order must be strictly lower, a later
/// one lower or equal, so a flat plateau yields a single peak. Neighbours
/// outside the volume are ignored. Peaks come back in raster order.
pub(crate) fn find_peaks(
    exec: &Executor,
    response: &Volume,
    window: &[Range<usize>; 3],
    threshold: f64,
    sub_pixel: bool,
) -> Vec<Peak> {
    let neighbours = neighbourhood(response);
    let dims = response.dims;
    exec.flat_map_rows(response.rows(), |row| {
        let (y, z) = response.row_coords(row);
        let mut peaks = Vec::new();
        if !(window[1].contains(&y) && window[2].contains(&z)) {
            return peaks;
        }
        for x in window[0].clone() {
            let here = [x, y, z];
            let idx = response.index(x, y, z);
            let value = response.data[idx];
            if !(value > threshold) {
                continue;
            }
            let is_peak = neighbours.iter().all(|(step, delta)| {
                let inside = (0..3).all(|d| {
                    let c = here[d] as isize + step[d];
                    c >= 0 && c < dims[d] as isize
                });
                if !inside {
                    return true;
                }
                let other = response.data[(idx as isize + delta) as usize];
                if *delta < 0 {
                    value > other
                } else {
                    value >= other
                }
            });
            if is_peak {
                let offset = if sub_pixel {
                    refine(response, here)
                } else {
                    [0.0; 3]
                };
                peaks.push(Peak {
                    voxel: here,
                    offset,
                    value,
                });
            }
        }
        peaks
    })
}

/// Per-axis parabola through the peak and its two neighbours.
fn refine(vol: &Volume, voxel: [usize; 3]) -> [f64; 3] {
    let strides = vol.strides();
    let idx = vol.index(voxel[0], voxel[1], voxel[2]);
    let mut offset = [0.0; 3];
    for d in 0..vol.ndim {
        if voxel[d] == 0 || voxel[d] + 1 >= vol.dims[d] {
            continue;
        }
        let before = vol.data[idx - strides[d]];
        let centre = vol.data[idx];
        let after = vol.data[idx + strides[d]];
        let curvature = before - 2.0 * centre + after;
        if curvature < 0.0 {
            offset[d] = (0.5 * (before - after) / curvature).clamp(-0.5, 0.5);
        }
    }
    offset
}
