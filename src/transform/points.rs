//! Mapping auxiliary landmark sets through an affine matrix.
//!
//! Point sets are flat row-major buffers of `N x dim` values. Two-dimensional
//! points are mapped directly; three-dimensional points have their `(x, y)`
//! mapped and their third coordinate (depth or size) multiplied by the
//! matrix's isotropic scale, which assumes a similarity.

use crate::transform::AffineMatrix;
use crate::util::{FaceAlignError, FaceAlignResult};

/// Maps a flat `N x dim` point buffer, dispatching on `dim` (2 or 3).
pub fn transform_points(
    points: &[f64],
    dim: usize,
    m: &AffineMatrix,
) -> FaceAlignResult<Vec<f64>> {
    if dim != 2 && dim != 3 {
        return Err(FaceAlignError::InvalidPointDim { dim });
    }
    if points.len() % dim != 0 {
        return Err(FaceAlignError::InvalidInput(
            "point buffer length is not a multiple of the point dimension",
        ));
    }

    let scale = m.scale();
    let mut out = Vec::with_capacity(points.len());
    for p in points.chunks_exact(dim) {
        let q = m.apply([p[0], p[1]]);
        out.extend_from_slice(&q);
        if dim == 3 {
            out.push(p[2] * scale);
        }
    }
    Ok(out)
}

/// Maps 2D points.
pub fn transform_points_2d(points: &[[f64; 2]], m: &AffineMatrix) -> Vec<[f64; 2]> {
    points.iter().map(|&p| m.apply(p)).collect()
}

/// Maps 3D points, scaling the third coordinate by `m.scale()`.
pub fn transform_points_3d(points: &[[f64; 3]], m: &AffineMatrix) -> Vec<[f64; 3]> {
    let scale = m.scale();
    points
        .iter()
        .map(|p| {
            let [x, y] = m.apply([p[0], p[1]]);
            [x, y, p[2] * scale]
        })
        .collect()
}
