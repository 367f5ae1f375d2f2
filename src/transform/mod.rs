//! 2x3 affine matrices and the operations that consume them.
//!
//! A matrix `[a b c; d e f]` maps `(x, y)` to `(a*x + b*y + c, d*x + e*y + f)`.
//! Matrices produced by the estimator are similarities (`a == e`, `b == -d`),
//! but everything in this module accepts general affine maps unless noted.

pub mod inverse;
pub mod points;

pub use inverse::{invert, invert_batch};
#[cfg(feature = "rayon")]
pub use inverse::invert_batch_par;
pub use points::{transform_points, transform_points_2d, transform_points_3d};

/// Row-major 2x3 affine transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineMatrix {
    rows: [[f64; 3]; 2],
}

impl AffineMatrix {
    /// The identity map.
    pub const IDENTITY: AffineMatrix = AffineMatrix {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
    };

    /// Creates a matrix from its two rows.
    pub const fn new(rows: [[f64; 3]; 2]) -> Self {
        Self { rows }
    }

    /// Creates a matrix from six row-major values `[a, b, c, d, e, f]`.
    pub const fn from_flat(v: [f64; 6]) -> Self {
        Self {
            rows: [[v[0], v[1], v[2]], [v[3], v[4], v[5]]],
        }
    }

    /// Builds the similarity `[a -b tx; b a ty]`, i.e. scale `hypot(a, b)` and
    /// rotation `atan2(b, a)` followed by a translation.
    pub const fn similarity(a: f64, b: f64, tx: f64, ty: f64) -> Self {
        Self {
            rows: [[a, -b, tx], [b, a, ty]],
        }
    }

    /// Pure translation.
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self::similarity(1.0, 0.0, tx, ty)
    }

    /// Uniform scale about the origin.
    pub const fn scaling(s: f64) -> Self {
        Self::similarity(s, 0.0, 0.0, 0.0)
    }

    /// Rotation about the origin by `angle_deg` (counter-clockwise in a y-up
    /// frame, clockwise on screen).
    pub fn rotation_deg(angle_deg: f64) -> Self {
        let (sin, cos) = crate::util::math::sin_cos_deg(angle_deg);
        Self::similarity(cos, sin, 0.0, 0.0)
    }

    /// Returns the two rows.
    pub fn rows(&self) -> [[f64; 3]; 2] {
        self.rows
    }

    /// Returns the six row-major values.
    pub fn to_flat(&self) -> [f64; 6] {
        let [[a, b, c], [d, e, f]] = self.rows;
        [a, b, c, d, e, f]
    }

    /// Maps a single point.
    #[inline]
    pub fn apply(&self, p: [f64; 2]) -> [f64; 2] {
        let [[a, b, c], [d, e, f]] = self.rows;
        [a * p[0] + b * p[1] + c, d * p[0] + e * p[1] + f]
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        let [[a, b, _], [d, e, _]] = self.rows;
        a * e - b * d
    }

    /// Isotropic scale factor, the magnitude of the first row's linear part.
    ///
    /// Only meaningful for similarities.
    pub fn scale(&self) -> f64 {
        self.rows[0][0].hypot(self.rows[0][1])
    }

    /// Returns the map that applies `self` first and `next` second.
    pub fn then(&self, next: &AffineMatrix) -> AffineMatrix {
        let [[a1, b1, c1], [d1, e1, f1]] = self.rows;
        let [[a2, b2, c2], [d2, e2, f2]] = next.rows;
        AffineMatrix::new([
            [
                a2 * a1 + b2 * d1,
                a2 * b1 + b2 * e1,
                a2 * c1 + b2 * f1 + c2,
            ],
            [
                d2 * a1 + e2 * d1,
                d2 * b1 + e2 * e1,
                d2 * c1 + e2 * f1 + f2,
            ],
        ])
    }

    /// True when every element is finite.
    pub fn is_finite(&self) -> bool {
        self.rows.iter().flatten().all(|v| v.is_finite())
    }

    /// Element-wise comparison within an absolute tolerance.
    pub fn approx_eq(&self, other: &AffineMatrix, tol: f64) -> bool {
        self.rows
            .iter()
            .flatten()
            .zip(other.rows.iter().flatten())
            .all(|(x, y)| (x - y).abs() <= tol)
    }
}

impl Default for AffineMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[[f64; 3]; 2]> for AffineMatrix {
    fn from(rows: [[f64; 3]; 2]) -> Self {
        Self::new(rows)
    }
}
