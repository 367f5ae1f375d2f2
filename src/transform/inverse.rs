//! Closed-form inversion of 2x3 affine matrices.
//!
//! For `[a b c; d e f]` the inverse is
//!
//! ```text
//! div1 = a*e - b*d
//! [ e/div1   -b/div1   -(c*e - b*f)/div1 ]
//! div2 = b*d - a*e = -div1
//! [ d/div2   -a/div2   -(c*d - a*f)/div2 ]
//! ```
//!
//! A singular linear part is reported as `DegenerateTransform` instead of
//! letting infinities or NaNs reach the compositing stage. The batch forms map
//! the same formula over every element and report failures per element.

use crate::trace::{trace_event, trace_span};
use crate::transform::AffineMatrix;
use crate::util::{FaceAlignError, FaceAlignResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Inverts a single affine matrix.
pub fn invert(m: &AffineMatrix) -> FaceAlignResult<AffineMatrix> {
    let [[a, b, c], [d, e, f]] = m.rows();

    let div1 = a * e - b * d;
    if div1 == 0.0 || !div1.is_finite() {
        return Err(FaceAlignError::DegenerateTransform { det: div1 });
    }
    let div2 = b * d - a * e;

    let inv = AffineMatrix::new([
        [e / div1, -b / div1, -(c * e - b * f) / div1],
        [d / div2, -a / div2, -(c * d - a * f) / div2],
    ]);
    // Subnormal determinants overflow the quotients.
    if !inv.is_finite() {
        return Err(FaceAlignError::DegenerateTransform { det: div1 });
    }
    Ok(inv)
}

/// Inverts every matrix in `matrices`; `result[i]` is the inverse of
/// `matrices[i]` or the error for that element alone.
pub fn invert_batch(matrices: &[AffineMatrix]) -> Vec<FaceAlignResult<AffineMatrix>> {
    let _span = trace_span!("invert_batch", len = matrices.len()).entered();
    let out: Vec<_> = matrices.iter().map(invert).collect();
    trace_event!("invert_batch_done", degenerate = count_failures(&out));
    out
}

/// Parallel form of [`invert_batch`] over the rayon pool.
#[cfg(feature = "rayon")]
pub fn invert_batch_par(matrices: &[AffineMatrix]) -> Vec<FaceAlignResult<AffineMatrix>> {
    let _span = trace_span!("invert_batch", len = matrices.len(), parallel = true).entered();
    let out: Vec<_> = matrices.par_iter().map(invert).collect();
    trace_event!("invert_batch_done", degenerate = count_failures(&out));
    out
}

fn count_failures(results: &[FaceAlignResult<AffineMatrix>]) -> usize {
    results.iter().filter(|r| r.is_err()).count()
}
