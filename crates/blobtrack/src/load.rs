//! Reading planes and Z stacks from image files.

use std::path::Path;

use ::image::{ColorType, DynamicImage};
use blobtrack_core::{Image, Shape};
use log::debug;

use crate::PipelineError;

fn is_wide(color: ColorType) -> bool {
    matches!(
        color,
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16
    )
}

/// Convert a decoded image to a grayscale plane, keeping 16-bit depth when
/// the source has it.
pub fn plane_from_dynamic(img: &DynamicImage) -> Result<Image, PipelineError> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let shape = Shape::planar(w, h)?;
    let plane = if is_wide(img.color()) {
        Image::from_u16(shape, img.to_luma16().as_raw())?
    } else {
        Image::from_u8(shape, img.to_luma8().as_raw())?
    };
    Ok(plane)
}

/// Load a single file as a 2D plane.
pub fn load_plane(path: impl AsRef<Path>) -> Result<Image, PipelineError> {
    let path = path.as_ref();
    let img = ::image::open(path)?;
    debug!(
        "loaded {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );
    plane_from_dynamic(&img)
}

/// Load one file as a plane or several files as the Z planes of a volume.
///
/// Every plane must have the size of the first one.
pub fn load_stack<P: AsRef<Path>>(paths: &[P]) -> Result<Image, PipelineError> {
    let (first, rest) = paths.split_first().ok_or(PipelineError::NoImages)?;
    let first = load_plane(first)?;
    if rest.is_empty() {
        return Ok(first);
    }

    let (w, h) = (first.shape.width(), first.shape.height());
    let mut data = Vec::with_capacity(first.data.len() * paths.len());
    data.extend_from_slice(&first.data);
    for (i, path) in rest.iter().enumerate() {
        let plane = load_plane(path)?;
        let got = (plane.shape.width(), plane.shape.height());
        if got != (w, h) {
            return Err(PipelineError::PlaneSizeMismatch {
                index: i + 1,
                expected: (w as u32, h as u32),
                got: (got.0 as u32, got.1 as u32),
            });
        }
        data.extend_from_slice(&plane.data);
    }
    let shape = Shape::volumetric(w, h, paths.len())?;
    Ok(Image::new(shape, data)?)
}
