//! Axis-aligned integer boxes over image coordinates.
//!
//! An [`Interval`] stores an inclusive `(min, max)` pair per axis. It is the
//! unit of spatial partitioning for blocked detection and the bound over
//! which local neighbourhoods are iterated.

use serde::{Deserialize, Serialize};

/// Errors returned when building an [`Interval`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    #[error("interval needs at least one axis")]
    NoAxes,
    #[error("min has {min} axes but max has {max}")]
    DimensionMismatch { min: usize, max: usize },
    #[error("axis {axis}: min {min} is greater than max {max}")]
    Inverted { axis: usize, min: i64, max: i64 },
}

/// Axis-aligned N-dimensional integer box with inclusive bounds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IntervalRepr", into = "IntervalRepr")]
pub struct Interval {
    min: Vec<i64>,
    max: Vec<i64>,
}

#[derive(Serialize, Deserialize)]
struct IntervalRepr {
    min: Vec<i64>,
    max: Vec<i64>,
}

impl TryFrom<IntervalRepr> for Interval {
    type Error = IntervalError;

    fn try_from(value: IntervalRepr) -> Result<Self, Self::Error> {
        Interval::new(value.min, value.max)
    }
}

impl From<Interval> for IntervalRepr {
    fn from(value: Interval) -> Self {
        Self {
            min: value.min,
            max: value.max,
        }
    }
}

impl Interval {
    /// Build an interval from per-axis inclusive bounds.
    pub fn new(min: Vec<i64>, max: Vec<i64>) -> Result<Self, IntervalError> {
        if min.len() != max.len() {
            return Err(IntervalError::DimensionMismatch {
                min: min.len(),
                max: max.len(),
            });
        }
        if min.is_empty() {
            return Err(IntervalError::NoAxes);
        }
        for (axis, (&lo, &hi)) in min.iter().zip(&max).enumerate() {
            if lo > hi {
                return Err(IntervalError::Inverted {
                    axis,
                    min: lo,
                    max: hi,
                });
            }
        }
        Ok(Self { min, max })
    }

    /// Caller guarantees matching lengths and `min <= max` on every axis.
    pub(crate) fn new_unchecked(min: Vec<i64>, max: Vec<i64>) -> Self {
        debug_assert!(min.len() == max.len() && min.iter().zip(&max).all(|(a, b)| a <= b));
        Self { min, max }
    }

    /// Interval starting at the origin with the given extent per axis.
    ///
    /// Every extent must be at least 1.
    pub fn from_dimensions(dims: &[usize]) -> Result<Self, IntervalError> {
        let min = vec![0; dims.len()];
        let max = dims.iter().map(|&d| d as i64 - 1).collect();
        Self::new(min, max)
    }

    #[inline]
    pub fn num_dimensions(&self) -> usize {
        self.min.len()
    }

    #[inline]
    pub fn min(&self, d: usize) -> i64 {
        self.min[d]
    }

    #[inline]
    pub fn max(&self, d: usize) -> i64 {
        self.max[d]
    }

    pub fn mins(&self) -> &[i64] {
        &self.min
    }

    pub fn maxs(&self) -> &[i64] {
        &self.max
    }

    /// Number of integer positions along axis `d`.
    #[inline]
    pub fn dimension(&self, d: usize) -> i64 {
        self.max[d] - self.min[d] + 1
    }

    pub fn dimensions(&self) -> Vec<i64> {
        (0..self.num_dimensions()).map(|d| self.dimension(d)).collect()
    }

    /// Total number of integer positions covered.
    pub fn num_elements(&self) -> u64 {
        (0..self.num_dimensions())
            .map(|d| self.dimension(d) as u64)
            .product()
    }

    pub fn contains(&self, position: &[i64]) -> bool {
        position.len() == self.num_dimensions()
            && position
                .iter()
                .zip(self.min.iter().zip(&self.max))
                .all(|(&p, (&lo, &hi))| p >= lo && p <= hi)
    }

    pub fn contains_interval(&self, other: &Interval) -> bool {
        other.num_dimensions() == self.num_dimensions()
            && (0..self.num_dimensions())
                .all(|d| other.min[d] >= self.min[d] && other.max[d] <= self.max[d])
    }

    /// Overlap of two intervals, `None` when disjoint or of different rank.
    pub fn intersection(&self, other: &Interval) -> Option<Interval> {
        if other.num_dimensions() != self.num_dimensions() {
            return None;
        }
        let min: Vec<i64> = self.min.iter().zip(&other.min).map(|(a, b)| *a.max(b)).collect();
        let max: Vec<i64> = self.max.iter().zip(&other.max).map(|(a, b)| *a.min(b)).collect();
        Interval::new(min, max).ok()
    }

    /// Iterate every integer position, axis 0 varying fastest.
    pub fn positions(&self) -> Positions<'_> {
        Positions {
            interval: self,
            next: Some(self.min.clone()),
        }
    }
}

/// Row-major iterator over the positions of an [`Interval`].
pub struct Positions<'a> {
    interval: &'a Interval,
    next: Option<Vec<i64>>,
}

impl Iterator for Positions<'_> {
    type Item = Vec<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let mut advanced = current.clone();
        for d in 0..advanced.len() {
            if advanced[d] < self.interval.max[d] {
                advanced[d] += 1;
                self.next = Some(advanced);
                return Some(current);
            }
            advanced[d] = self.interval.min[d];
        }
        Some(current)
    }
}
