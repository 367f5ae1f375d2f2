//! Conversions between `OwnedImage` and the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::OwnedImage;
use crate::util::{FaceAlignError, FaceAlignResult};
use std::path::Path;

/// Creates an owned 3-channel image from an RGB image buffer.
pub fn owned_from_rgb_image(img: &image::RgbImage) -> FaceAlignResult<OwnedImage> {
    OwnedImage::new(
        img.as_raw().clone(),
        img.width() as usize,
        img.height() as usize,
        3,
    )
}

/// Converts a 3-channel `OwnedImage` back into an `image::RgbImage`.
pub fn rgb_image_from_owned(img: &OwnedImage) -> FaceAlignResult<image::RgbImage> {
    if img.channels() != 3 {
        return Err(FaceAlignError::InvalidInput("expected a 3-channel image"));
    }
    let width = u32::try_from(img.width()).map_err(|_| FaceAlignError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    })?;
    let height = u32::try_from(img.height()).map_err(|_| FaceAlignError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    })?;
    image::RgbImage::from_raw(width, height, img.data().to_vec())
        .ok_or(FaceAlignError::InvalidInput("buffer does not match RGB dimensions"))
}

/// Loads an image from disk and converts it to an owned RGB image.
pub fn load_rgb_image<P: AsRef<Path>>(path: P) -> FaceAlignResult<OwnedImage> {
    let img = image::open(path).map_err(|err| FaceAlignError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_from_rgb_image(&img.to_rgb8())
}

/// Writes a 3-channel image to disk; the format follows the file extension.
pub fn save_rgb_image<P: AsRef<Path>>(img: &OwnedImage, path: P) -> FaceAlignResult<()> {
    rgb_image_from_owned(img)?
        .save(path)
        .map_err(|err| FaceAlignError::ImageIo {
            reason: err.to_string(),
        })
}
