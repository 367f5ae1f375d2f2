//! Small numeric helpers shared by the estimator and the warp code.

/// Computes sine and cosine for an angle in degrees.
pub(crate) fn sin_cos_deg(angle_deg: f64) -> (f64, f64) {
    angle_deg.to_radians().sin_cos()
}

/// Euclidean distance between two 2D points.
pub(crate) fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// Centroid of a set of 2D points. Returns the origin for an empty set.
pub(crate) fn centroid(points: &[[f64; 2]]) -> [f64; 2] {
    if points.is_empty() {
        return [0.0, 0.0];
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    [sx / n, sy / n]
}

/// Rounds a resampled value to the nearest `u8`, saturating at the range ends.
#[inline]
pub(crate) fn saturate_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
