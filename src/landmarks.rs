//! Five-point facial landmark sets.

use crate::util::{FaceAlignError, FaceAlignResult};

/// Number of points in a landmark set.
pub const NUM_LANDMARKS: usize = 5;

/// Five ordered landmarks in source-image pixel coordinates.
///
/// Order is fixed: left eye, right eye, nose tip, left mouth corner, right
/// mouth corner. The estimator pairs points with template points by index,
/// so the order must never be permuted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandmarkSet {
    points: [[f64; 2]; NUM_LANDMARKS],
}

impl LandmarkSet {
    /// Wraps five points.
    pub const fn new(points: [[f64; 2]; NUM_LANDMARKS]) -> Self {
        Self { points }
    }

    /// Builds a set from `(x, y)` rows; there must be exactly five.
    pub fn from_rows(rows: &[[f64; 2]]) -> FaceAlignResult<Self> {
        let points: [[f64; 2]; NUM_LANDMARKS] =
            rows.try_into().map_err(|_| FaceAlignError::InvalidLandmarkShape {
                len: rows.len() * 2,
            })?;
        Ok(Self { points })
    }

    /// Builds a set from ten interleaved values `x0, y0, x1, y1, ...`.
    pub fn from_flat(values: &[f64]) -> FaceAlignResult<Self> {
        if values.len() != NUM_LANDMARKS * 2 {
            return Err(FaceAlignError::InvalidLandmarkShape { len: values.len() });
        }
        let mut points = [[0.0; 2]; NUM_LANDMARKS];
        for (dst, src) in points.iter_mut().zip(values.chunks_exact(2)) {
            *dst = [src[0], src[1]];
        }
        Ok(Self { points })
    }

    /// Splits an `N x 5 x 2` buffer into `N` sets. An empty buffer yields an
    /// empty batch.
    pub fn batch_from_flat(values: &[f64]) -> FaceAlignResult<Vec<Self>> {
        if values.len() % (NUM_LANDMARKS * 2) != 0 {
            return Err(FaceAlignError::InvalidLandmarkShape { len: values.len() });
        }
        values
            .chunks_exact(NUM_LANDMARKS * 2)
            .map(Self::from_flat)
            .collect()
    }

    /// The five points.
    pub fn points(&self) -> &[[f64; 2]; NUM_LANDMARKS] {
        &self.points
    }

    /// Interleaved copy of the points.
    pub fn to_flat(&self) -> [f64; NUM_LANDMARKS * 2] {
        let mut out = [0.0; NUM_LANDMARKS * 2];
        for (dst, p) in out.chunks_exact_mut(2).zip(self.points.iter()) {
            dst.copy_from_slice(p);
        }
        out
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.points.iter().flatten().all(|v| v.is_finite())
    }
}

impl From<[[f64; 2]; NUM_LANDMARKS]> for LandmarkSet {
    fn from(points: [[f64; 2]; NUM_LANDMARKS]) -> Self {
        Self::new(points)
    }
}
