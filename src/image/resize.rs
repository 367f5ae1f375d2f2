//! Bilinear resizing and square letterboxing.
//!
//! Resizing uses half-pixel centers: destination pixel `x` samples source
//! coordinate `(x + 0.5) * src_w / dst_w - 0.5`, clamped to the image so edge
//! pixels replicate instead of blending with a border.

use crate::image::{ImageView, OwnedImage};
use crate::trace::trace_span;
use crate::util::math::saturate_u8;
use crate::util::{FaceAlignError, FaceAlignResult};

#[derive(Clone, Copy)]
struct Tap {
    i0: usize,
    i1: usize,
    frac: f64,
}

fn axis_taps(src_len: usize, dst_len: usize) -> Vec<Tap> {
    let scale = src_len as f64 / dst_len as f64;
    let last = src_len - 1;
    (0..dst_len)
        .map(|d| {
            let s = ((d as f64 + 0.5) * scale - 0.5).max(0.0);
            let i0 = (s.floor() as usize).min(last);
            let i1 = (i0 + 1).min(last);
            let frac = if i0 == last { 0.0 } else { s - i0 as f64 };
            Tap { i0, i1, frac }
        })
        .collect()
}

/// Resizes `src` to `width x height` with bilinear interpolation.
pub fn resize_bilinear(
    src: ImageView<'_, u8>,
    width: usize,
    height: usize,
) -> FaceAlignResult<OwnedImage> {
    if width == 0 || height == 0 {
        return Err(FaceAlignError::InvalidDimensions { width, height });
    }
    let channels = src.channels();
    let xs = axis_taps(src.width(), width);
    let ys = axis_taps(src.height(), height);

    let mut out = OwnedImage::filled(width, height, channels, 0)?;
    let row_len = width * channels;
    for (ty, dst_row) in ys.iter().zip(out.data_mut().chunks_exact_mut(row_len)) {
        let (Some(r0), Some(r1)) = (src.row(ty.i0), src.row(ty.i1)) else {
            return Err(FaceAlignError::BufferTooSmall {
                needed: (ty.i1 + 1) * src.stride(),
                got: src.as_slice().len(),
            });
        };
        for (tx, px) in xs.iter().zip(dst_row.chunks_exact_mut(channels)) {
            let a = tx.i0 * channels;
            let b = tx.i1 * channels;
            for (c, dst) in px.iter_mut().enumerate() {
                let top = f64::from(r0[a + c]) * (1.0 - tx.frac) + f64::from(r0[b + c]) * tx.frac;
                let bottom =
                    f64::from(r1[a + c]) * (1.0 - tx.frac) + f64::from(r1[b + c]) * tx.frac;
                *dst = saturate_u8(top * (1.0 - ty.frac) + bottom * ty.frac);
            }
        }
    }
    Ok(out)
}

/// Letterboxes `src` into a `size x size` canvas.
///
/// The image is resized so its longer side equals `size` (the shorter side is
/// truncated to an integer), then copied into the top-left corner of a black
/// canvas. Returns the canvas and the applied scale factor, which maps
/// detections on the canvas back to the source by division.
pub fn square_crop(src: ImageView<'_, u8>, size: usize) -> FaceAlignResult<(OwnedImage, f64)> {
    let _span = trace_span!("square_crop", size = size).entered();
    if size == 0 {
        return Err(FaceAlignError::InvalidDimensions {
            width: size,
            height: size,
        });
    }
    let (w, h) = (src.width() as f64, src.height() as f64);
    let (width, height, scale) = if src.height() > src.width() {
        let width = (w / h * size as f64) as usize;
        (width.max(1), size, size as f64 / h)
    } else {
        let height = (h / w * size as f64) as usize;
        (size, height.max(1), size as f64 / w)
    };

    let resized = resize_bilinear(src, width, height)?;
    let channels = src.channels();
    let mut canvas = OwnedImage::filled(size, size, channels, 0)?;
    let src_row = width * channels;
    let dst_row = size * channels;
    for (dst, row) in canvas
        .data_mut()
        .chunks_exact_mut(dst_row)
        .zip(resized.data().chunks_exact(src_row))
    {
        dst[..src_row].copy_from_slice(row);
    }
    Ok((canvas, scale))
}
