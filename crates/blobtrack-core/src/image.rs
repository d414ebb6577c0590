use serde::Serialize;

use crate::Interval;

/// Maximum number of axes an image can carry (X, Y, Z).
pub const MAX_DIMS: usize = 3;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("images must have 2 or 3 axes, got {0}")]
    UnsupportedDimensionality(usize),
    #[error("axis {axis} has zero extent")]
    EmptyAxis { axis: usize },
    #[error("buffer length {got} does not match shape (expected {expected})")]
    BufferLength { expected: usize, got: usize },
}

/// Extent of a 2D or 3D image, axis 0 (X) varying fastest in memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Shape {
    dims: [usize; MAX_DIMS],
    ndim: usize,
}

impl Shape {
    pub fn new(dims: &[usize]) -> Result<Self, ImageError> {
        if dims.len() < 2 || dims.len() > MAX_DIMS {
            return Err(ImageError::UnsupportedDimensionality(dims.len()));
        }
        if let Some(axis) = dims.iter().position(|&d| d == 0) {
            return Err(ImageError::EmptyAxis { axis });
        }
        let mut out = [1usize; MAX_DIMS];
        out[..dims.len()].copy_from_slice(dims);
        Ok(Self {
            dims: out,
            ndim: dims.len(),
        })
    }

    pub fn planar(width: usize, height: usize) -> Result<Self, ImageError> {
        Self::new(&[width, height])
    }

    pub fn volumetric(width: usize, height: usize, depth: usize) -> Result<Self, ImageError> {
        Self::new(&[width, height, depth])
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    #[inline]
    pub fn dim(&self, d: usize) -> usize {
        self.dims[d]
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims[..self.ndim]
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.dims[0]
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.dims[1]
    }

    /// Number of Z planes (1 for planar images).
    #[inline]
    pub fn depth(&self) -> usize {
        self.dims[2]
    }

    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Linear offset of an absolute position, `None` outside the image.
    #[inline]
    pub fn offset_of(&self, position: &[i64]) -> Option<usize> {
        if position.len() != self.ndim {
            return None;
        }
        let mut offset = 0usize;
        let mut stride = 1usize;
        for (d, &p) in position.iter().enumerate() {
            if p < 0 || p >= self.dims[d] as i64 {
                return None;
            }
            offset += p as usize * stride;
            stride *= self.dims[d];
        }
        Some(offset)
    }

    /// Interval covering the whole image.
    pub fn interval(&self) -> Interval {
        let max = self.dims().iter().map(|&d| d as i64 - 1).collect();
        Interval::new_unchecked(vec![0; self.ndim], max)
    }
}

/// Borrowed real-valued image.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
    pub shape: Shape,
    pub data: &'a [f32], // axis 0 fastest, len = shape.len()
}

/// Owned real-valued image.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub shape: Shape,
    pub data: Vec<f32>,
}

impl<'a> ImageView<'a> {
    pub fn new(shape: Shape, data: &'a [f32]) -> Result<Self, ImageError> {
        if data.len() != shape.len() {
            return Err(ImageError::BufferLength {
                expected: shape.len(),
                got: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    #[inline]
    pub fn num_dimensions(&self) -> usize {
        self.shape.ndim()
    }

    /// Intensity at an absolute position, `None` outside the image.
    #[inline]
    pub fn get(&self, position: &[i64]) -> Option<f32> {
        self.shape.offset_of(position).map(|i| self.data[i])
    }

    pub fn interval(&self) -> Interval {
        self.shape.interval()
    }
}

impl Image {
    pub fn new(shape: Shape, data: Vec<f32>) -> Result<Self, ImageError> {
        if data.len() != shape.len() {
            return Err(ImageError::BufferLength {
                expected: shape.len(),
                got: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    pub fn zeros(shape: Shape) -> Self {
        Self {
            shape,
            data: vec![0.0; shape.len()],
        }
    }

    pub fn from_u8(shape: Shape, data: &[u8]) -> Result<Self, ImageError> {
        Self::new(shape, data.iter().map(|&v| v as f32).collect())
    }

    pub fn from_u16(shape: Shape, data: &[u16]) -> Result<Self, ImageError> {
        Self::new(shape, data.iter().map(|&v| v as f32).collect())
    }

    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            shape: self.shape,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, position: &[i64]) -> Option<f32> {
        self.view().get(position)
    }

    /// Write a value; returns `false` if the position is outside the image.
    pub fn set(&mut self, position: &[i64], value: f32) -> bool {
        match self.shape.offset_of(position) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_rejects_bad_rank_and_empty_axes() {
        assert_eq!(
            Shape::new(&[4]),
            Err(ImageError::UnsupportedDimensionality(1))
        );
        assert_eq!(
            Shape::new(&[4, 4, 4, 4]),
            Err(ImageError::UnsupportedDimensionality(4))
        );
        assert_eq!(Shape::new(&[4, 0]), Err(ImageError::EmptyAxis { axis: 1 }));
    }

    #[test]
    fn offsets_are_x_fastest() {
        let shape = Shape::volumetric(4, 3, 2).unwrap();
        assert_eq!(shape.len(), 24);
        assert_eq!(shape.offset_of(&[1, 0, 0]), Some(1));
        assert_eq!(shape.offset_of(&[0, 1, 0]), Some(4));
        assert_eq!(shape.offset_of(&[0, 0, 1]), Some(12));
        assert_eq!(shape.offset_of(&[3, 2, 1]), Some(23));
        assert_eq!(shape.offset_of(&[4, 0, 0]), None);
        assert_eq!(shape.offset_of(&[-1, 0, 0]), None);
        assert_eq!(shape.offset_of(&[0, 0]), None);
    }

    #[test]
    fn view_reads_back_written_values() {
        let shape = Shape::planar(5, 4).unwrap();
        let mut img = Image::zeros(shape);
        assert!(img.set(&[2, 3], 7.5));
        assert!(!img.set(&[5, 0], 1.0));
        let view = img.view();
        assert_eq!(view.get(&[2, 3]), Some(7.5));
        assert_eq!(view.get(&[0, 0]), Some(0.0));
        assert_eq!(view.get(&[0, 4]), None);
        assert_eq!(view.interval().dimensions(), vec![5, 4]);
    }

    #[test]
    fn buffer_length_is_checked() {
        let shape = Shape::planar(3, 3).unwrap();
        assert_eq!(
            Image::from_u8(shape, &[0; 8]),
            Err(ImageError::BufferLength {
                expected: 9,
                got: 8
            })
        );
        let img = Image::from_u16(shape, &[1000; 9]).unwrap();
        assert_eq!(img.get(&[1, 1]), Some(1000.0));
    }
}
