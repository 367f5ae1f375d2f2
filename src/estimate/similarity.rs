//! Closed-form least-squares similarity fit.
//!
//! Finds `a, b, tx, ty` minimizing `sum |M * src_i - dst_i|^2` for
//! `M = [a -b tx; b a ty]`. After centering both point sets on their
//! centroids the problem decouples:
//!
//! ```text
//! a = sum(x*u + y*v) / sum(x^2 + y^2)
//! b = sum(x*v - y*u) / sum(x^2 + y^2)
//! t = mean(dst) - R * mean(src)
//! ```
//!
//! where `(x, y)` are centered source points and `(u, v)` centered targets.
//! This is the 2D Umeyama solution; it never produces a reflection.

use crate::transform::AffineMatrix;
use crate::util::math::centroid;
use crate::util::{FaceAlignError, FaceAlignResult};

/// Fits the similarity that best maps `src[i]` onto `dst[i]`.
///
/// Fails with `DegenerateTransform` when the source points all coincide, in
/// which case rotation and scale are undetermined.
pub fn fit_similarity(src: &[[f64; 2]], dst: &[[f64; 2]]) -> FaceAlignResult<AffineMatrix> {
    if src.len() != dst.len() {
        return Err(FaceAlignError::InvalidInput(
            "source and target point counts differ",
        ));
    }
    if src.is_empty() {
        return Err(FaceAlignError::InvalidInput("no point correspondences"));
    }

    let [sx, sy] = centroid(src);
    let [dx, dy] = centroid(dst);

    let mut norm = 0.0;
    let mut dot = 0.0;
    let mut cross = 0.0;
    for (s, d) in src.iter().zip(dst) {
        let (x, y) = (s[0] - sx, s[1] - sy);
        let (u, v) = (d[0] - dx, d[1] - dy);
        norm += x * x + y * y;
        dot += x * u + y * v;
        cross += x * v - y * u;
    }

    if norm == 0.0 || !norm.is_finite() {
        return Err(FaceAlignError::DegenerateTransform { det: 0.0 });
    }

    let a = dot / norm;
    let b = cross / norm;
    let tx = dx - (a * sx - b * sy);
    let ty = dy - (b * sx + a * sy);
    Ok(AffineMatrix::similarity(a, b, tx, ty))
}

#[cfg(test)]
mod tests {
    use super::fit_similarity;
    use crate::transform::AffineMatrix;
    use crate::util::FaceAlignError;

    const SRC: [[f64; 2]; 5] = [
        [30.0, 40.0],
        [70.0, 41.0],
        [50.0, 60.0],
        [35.0, 80.0],
        [66.0, 79.0],
    ];

    fn map(m: &AffineMatrix) -> Vec<[f64; 2]> {
        SRC.iter().map(|&p| m.apply(p)).collect()
    }

    #[test]
    fn identity_fit() {
        let m = fit_similarity(&SRC, &SRC).unwrap();
        assert!(m.approx_eq(&AffineMatrix::IDENTITY, 1e-12), "{m:?}");
    }

    #[test]
    fn pure_scale_fit() {
        let truth = AffineMatrix::scaling(2.5);
        let m = fit_similarity(&SRC, &map(&truth)).unwrap();
        assert!(m.approx_eq(&truth, 1e-10), "{m:?}");
    }

    #[test]
    fn pure_rotation_fit() {
        let truth = AffineMatrix::rotation_deg(-37.0);
        let m = fit_similarity(&SRC, &map(&truth)).unwrap();
        assert!(m.approx_eq(&truth, 1e-10), "{m:?}");
    }

    #[test]
    fn full_similarity_fit() {
        let truth = AffineMatrix::rotation_deg(12.0)
            .then(&AffineMatrix::scaling(0.7))
            .then(&AffineMatrix::translation(-14.0, 9.5));
        let m = fit_similarity(&SRC, &map(&truth)).unwrap();
        assert!(m.approx_eq(&truth, 1e-10), "{m:?}");
    }

    #[test]
    fn centroids_carry_the_shift() {
        // Scale comes from the centered spread, shift from the centroids.
        let src = [[-1.0, 0.0], [1.0, 0.0]];
        let dst = [[-3.0, 0.0], [1.0, 0.0]];
        let m = fit_similarity(&src, &dst).unwrap();
        let expected = AffineMatrix::similarity(2.0, 0.0, -1.0, 0.0);
        assert!(m.approx_eq(&expected, 1e-12), "{m:?}");
    }

    #[test]
    fn tiny_spread_still_fits() {
        let tiny: Vec<[f64; 2]> = SRC.iter().map(|p| [p[0] * 1e-9, p[1] * 1e-9]).collect();
        let m = fit_similarity(&tiny, &SRC).unwrap();
        assert!((m.scale() - 1e9).abs() / 1e9 < 1e-9, "{m:?}");
        for (p, q) in tiny.iter().zip(SRC) {
            let mapped = m.apply(*p);
            assert!((mapped[0] - q[0]).abs() < 1e-6 && (mapped[1] - q[1]).abs() < 1e-6);
        }
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let src = [[5.0, 5.0]; 5];
        assert!(matches!(
            fit_similarity(&src, &SRC),
            Err(FaceAlignError::DegenerateTransform { .. })
        ));
        assert!(matches!(
            fit_similarity(&SRC[..2], &SRC),
            Err(FaceAlignError::InvalidInput(_))
        ));
    }
}
