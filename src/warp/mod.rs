//! Affine warping into fixed-size crops.
//!
//! The forward matrix maps source pixels to output pixels. Each output pixel
//! center `(x, y)` is pulled back through the inverse matrix and sampled
//! bilinearly; pixel centers sit on integer coordinates. Taps falling outside
//! the source contribute `border` instead, so a crop edge blends smoothly into
//! the constant border. Values are rounded to the nearest integer and clamped
//! to `[0, 255]`.

use crate::image::{ImageView, OwnedImage};
use crate::trace::trace_span;
use crate::transform::{invert, AffineMatrix};
use crate::util::math::saturate_u8;
use crate::util::{FaceAlignError, FaceAlignResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Border value used by the aligner for out-of-bounds samples.
pub const DEFAULT_BORDER: u8 = 0;

/// Warps `src` through `m` into a `crop_size x crop_size` image.
pub fn warp_affine(
    src: ImageView<'_, u8>,
    m: &AffineMatrix,
    crop_size: usize,
    border: u8,
) -> FaceAlignResult<OwnedImage> {
    warp_affine_to(src, m, crop_size, crop_size, border)
}

/// Warps `src` through `m` into an image of `width x height`.
pub fn warp_affine_to(
    src: ImageView<'_, u8>,
    m: &AffineMatrix,
    width: usize,
    height: usize,
    border: u8,
) -> FaceAlignResult<OwnedImage> {
    let _span = trace_span!("warp_affine", width = width, height = height).entered();
    let (inv, mut out) = prepare(src, m, width, height, border)?;
    let row_len = width * src.channels();
    for (y, row) in out.data_mut().chunks_exact_mut(row_len).enumerate() {
        warp_row(src, &inv, y, row, border);
    }
    Ok(out)
}

/// Row-parallel form of [`warp_affine`].
#[cfg(feature = "rayon")]
pub fn warp_affine_par(
    src: ImageView<'_, u8>,
    m: &AffineMatrix,
    crop_size: usize,
    border: u8,
) -> FaceAlignResult<OwnedImage> {
    let _span = trace_span!(
        "warp_affine",
        width = crop_size,
        height = crop_size,
        parallel = true
    )
    .entered();
    let (inv, mut out) = prepare(src, m, crop_size, crop_size, border)?;
    let row_len = crop_size * src.channels();
    out.data_mut()
        .par_chunks_exact_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| warp_row(src, &inv, y, row, border));
    Ok(out)
}

fn prepare(
    src: ImageView<'_, u8>,
    m: &AffineMatrix,
    width: usize,
    height: usize,
    border: u8,
) -> FaceAlignResult<(AffineMatrix, OwnedImage)> {
    if width == 0 || height == 0 {
        return Err(FaceAlignError::InvalidDimensions { width, height });
    }
    let inv = invert(m)?;
    let out = OwnedImage::filled(width, height, src.channels(), border)?;
    Ok((inv, out))
}

fn warp_row(src: ImageView<'_, u8>, inv: &AffineMatrix, y: usize, row: &mut [u8], border: u8) {
    let channels = src.channels();
    for (x, px) in row.chunks_exact_mut(channels).enumerate() {
        let [sx, sy] = inv.apply([x as f64, y as f64]);
        sample_bilinear(src, sx, sy, border, px);
    }
}

/// Samples `src` at the sub-pixel location `(sx, sy)` into `out`.
fn sample_bilinear(src: ImageView<'_, u8>, sx: f64, sy: f64, border: u8, out: &mut [u8]) {
    if !sx.is_finite() || !sy.is_finite() {
        out.fill(border);
        return;
    }
    let fx0 = sx.floor();
    let fy0 = sy.floor();
    let width = src.width() as f64;
    let height = src.height() as f64;
    if fx0 + 1.0 < 0.0 || fy0 + 1.0 < 0.0 || fx0 >= width || fy0 >= height {
        out.fill(border);
        return;
    }

    let fx = sx - fx0;
    let fy = sy - fy0;
    let x0 = fx0 as i64;
    let y0 = fy0 as i64;
    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1, y0, fx * (1.0 - fy)),
        (x0, y0 + 1, (1.0 - fx) * fy),
        (x0 + 1, y0 + 1, fx * fy),
    ];
    let pixels = taps.map(|(x, y, w)| (fetch(src, x, y), w));

    for (c, dst) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (pixel, w) in pixels {
            if w == 0.0 {
                continue;
            }
            let value = pixel.map_or(border, |p| p[c]);
            acc += w * f64::from(value);
        }
        *dst = saturate_u8(acc);
    }
}

fn fetch(src: ImageView<'_, u8>, x: i64, y: i64) -> Option<&[u8]> {
    if x < 0 || y < 0 {
        return None;
    }
    src.pixel(x as usize, y as usize)
}

#[cfg(test)]
mod tests {
    use super::{warp_affine, warp_affine_to};
    use crate::image::{ImageView, OwnedImage};
    use crate::transform::AffineMatrix;
    use crate::util::FaceAlignError;

    fn gradient(width: usize, height: usize) -> OwnedImage {
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x * 10) as u8, (y * 10) as u8, 200]);
            }
        }
        OwnedImage::new(data, width, height, 3).unwrap()
    }

    #[test]
    fn identity_copies_top_left_window() {
        let img = gradient(8, 6);
        let out = warp_affine(img.view(), &AffineMatrix::IDENTITY, 4, 0).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(out.pixel(x, y), img.pixel(x, y));
            }
        }
    }

    #[test]
    fn translation_fills_border() {
        let img = gradient(4, 4);
        let m = AffineMatrix::translation(2.0, 1.0);
        let out = warp_affine(img.view(), &m, 4, 0).unwrap();
        assert_eq!(out.pixel(0, 0).unwrap(), &[0, 0, 0]);
        assert_eq!(out.pixel(1, 3).unwrap(), &[0, 0, 0]);
        assert_eq!(out.pixel(2, 1), img.pixel(0, 0));
        assert_eq!(out.pixel(3, 3), img.pixel(1, 2));
    }

    #[test]
    fn half_pixel_shift_interpolates() {
        let data = [0u8, 100, 200, 50];
        let img = ImageView::from_slice(&data, 4, 1, 1).unwrap();
        let m = AffineMatrix::translation(-0.5, 0.0);
        let out = warp_affine_to(img, &m, 4, 1, 0).unwrap();
        assert_eq!(out.data(), &[50, 150, 125, 25]);
    }

    #[test]
    fn downscale_samples_every_other_pixel() {
        let img = gradient(8, 8);
        let m = AffineMatrix::scaling(0.5);
        let out = warp_affine(img.view(), &m, 4, 0).unwrap();
        assert_eq!(out.pixel(3, 2), img.pixel(6, 4));
    }

    #[test]
    fn degenerate_matrix_and_zero_size_fail() {
        let img = gradient(4, 4);
        let singular = AffineMatrix::new([[0.0, 0.0, 1.0], [0.0, 0.0, 1.0]]);
        assert!(matches!(
            warp_affine(img.view(), &singular, 4, 0),
            Err(FaceAlignError::DegenerateTransform { .. })
        ));
        assert!(matches!(
            warp_affine(img.view(), &AffineMatrix::IDENTITY, 0, 0),
            Err(FaceAlignError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn input_is_untouched() {
        let img = gradient(5, 5);
        let before = img.clone();
        let _ = warp_affine(img.view(), &AffineMatrix::rotation_deg(20.0), 5, 0).unwrap();
        assert_eq!(img, before);
    }
}
