//! Split an interval into an `nsplit x nsplit` grid of blocks over X and Y.
//!
//! Only axes 0 and 1 are divided; any further axis keeps the full extent of
//! the source interval. Each block gets `floor(extent / nsplit)` pixels per
//! split axis, and the last row/column also absorbs the remainder, so the
//! grid tiles the source interval exactly.

use blobtrack_core::Interval;

use crate::ConfigError;

const SPLIT_AXES: usize = 2;

/// One cell of the block grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub ix: usize,
    pub iy: usize,
    pub interval: Interval,
}

/// Sub-interval `(ix, iy)` of `interval` split `nsplit` ways along X and Y.
pub fn compute_block(
    interval: &Interval,
    nsplit: usize,
    ix: usize,
    iy: usize,
) -> Result<Interval, ConfigError> {
    check_grid(interval, nsplit)?;
    if ix >= nsplit || iy >= nsplit {
        return Err(ConfigError::BlockIndexOutOfRange { ix, iy, nsplit });
    }

    let index = [ix, iy];
    let mut min = interval.mins().to_vec();
    let mut max = interval.maxs().to_vec();
    for d in 0..SPLIT_AXES {
        let extent = interval.dimension(d);
        let n = nsplit as i64;
        let mut size = extent / n;
        min[d] = interval.min(d) + index[d] as i64 * size;
        if index[d] == nsplit - 1 {
            size += extent % n;
        }
        max[d] = min[d] + size - 1;
    }
    Ok(Interval::new(min, max)?)
}

/// All blocks of the grid in row-major order (`ix` outer, `iy` inner).
pub fn block_grid(interval: &Interval, nsplit: usize) -> Result<Vec<Block>, ConfigError> {
    check_grid(interval, nsplit)?;
    let mut blocks = Vec::with_capacity(nsplit * nsplit);
    for ix in 0..nsplit {
        for iy in 0..nsplit {
            blocks.push(Block {
                ix,
                iy,
                interval: compute_block(interval, nsplit, ix, iy)?,
            });
        }
    }
    Ok(blocks)
}

fn check_grid(interval: &Interval, nsplit: usize) -> Result<(), ConfigError> {
    if nsplit < 1 {
        return Err(ConfigError::NSplitTooSmall { nsplit });
    }
    let ndim = interval.num_dimensions();
    if ndim < SPLIT_AXES {
        return Err(ConfigError::UnsupportedDimensionality { ndim });
    }
    for axis in 0..SPLIT_AXES {
        let extent = interval.dimension(axis);
        if extent < nsplit as i64 {
            return Err(ConfigError::IntervalTooSmall {
                axis,
                extent,
                nsplit,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lo: i64, hi: i64) -> Interval {
        Interval::new(vec![lo, lo], vec![hi, hi]).unwrap()
    }

    #[test]
    fn even_split_has_equal_blocks() {
        let src = square(0, 9);
        let b = compute_block(&src, 2, 1, 0).unwrap();
        assert_eq!(b.mins(), &[5, 0]);
        assert_eq!(b.maxs(), &[9, 4]);
    }

    #[test]
    fn remainder_goes_to_last_block() {
        // 10 pixels in 3 ways: 3, 3, 4
        let src = square(0, 9);
        let sizes: Vec<i64> = (0..3)
            .map(|ix| compute_block(&src, 3, ix, 0).unwrap().dimension(0))
            .collect();
        assert_eq!(sizes, vec![3, 3, 4]);

        // 11 pixels in 3 ways: 3, 3, 5
        let src = square(0, 10);
        let last = compute_block(&src, 3, 2, 2).unwrap();
        assert_eq!(last.mins(), &[6, 6]);
        assert_eq!(last.maxs(), &[10, 10]);
    }

    #[test]
    fn grid_tiles_interval_exactly() {
        let src = Interval::new(vec![-3, 5, 0], vec![17, 21, 4]).unwrap();
        for nsplit in 1..=5 {
            let blocks = block_grid(&src, nsplit).unwrap();
            assert_eq!(blocks.len(), nsplit * nsplit);
            let total: u64 = blocks.iter().map(|b| b.interval.num_elements()).sum();
            assert_eq!(total, src.num_elements());
            for b in &blocks {
                assert!(src.contains_interval(&b.interval));
                assert_eq!(b.interval.min(2), 0);
                assert_eq!(b.interval.max(2), 4);
            }
            for (i, a) in blocks.iter().enumerate() {
                for b in &blocks[i + 1..] {
                    assert!(a.interval.intersection(&b.interval).is_none());
                }
            }
        }
    }

    #[test]
    fn grid_order_is_ix_outer() {
        let blocks = block_grid(&square(0, 7), 2).unwrap();
        let order: Vec<(usize, usize)> = blocks.iter().map(|b| (b.ix, b.iy)).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn same_inputs_give_same_block() {
        let src = square(2, 40);
        assert_eq!(
            compute_block(&src, 4, 3, 1).unwrap(),
            compute_block(&src, 4, 3, 1).unwrap()
        );
    }

    #[test]
    fn invalid_requests_are_rejected() {
        let src = square(0, 9);
        assert_eq!(
            compute_block(&src, 0, 0, 0),
            Err(ConfigError::NSplitTooSmall { nsplit: 0 })
        );
        assert_eq!(
            compute_block(&src, 2, 2, 0),
            Err(ConfigError::BlockIndexOutOfRange {
                ix: 2,
                iy: 0,
                nsplit: 2
            })
        );
        assert_eq!(
            compute_block(&src, 11, 0, 0),
            Err(ConfigError::IntervalTooSmall {
                axis: 0,
                extent: 10,
                nsplit: 11
            })
        );
        let line = Interval::new(vec![0], vec![9]).unwrap();
        assert_eq!(
            compute_block(&line, 1, 0, 0),
            Err(ConfigError::UnsupportedDimensionality { ndim: 1 })
        );
    }
}
