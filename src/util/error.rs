//! Error types for facealign.

use thiserror::Error;

/// Result alias for facealign operations.
pub type FaceAlignResult<T> = std::result::Result<T, FaceAlignError>;

/// Errors that can occur when estimating, warping or inverting transforms.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FaceAlignError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Image or crop dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is shorter than a row of pixels.
    #[error("invalid stride {stride} for row length {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer cannot hold the described image.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A landmark set did not contain exactly five 2D points.
    #[error("landmark set must be 5x2, got {len} values")]
    InvalidLandmarkShape { len: usize },
    /// The alignment mode string is not recognized.
    #[error("unknown alignment mode {mode:?}")]
    UnknownMode { mode: String },
    /// A point set had a trailing dimension other than 2 or 3.
    #[error("points must have 2 or 3 coordinates, got {dim}")]
    InvalidPointDim { dim: usize },
    /// The linear part of an affine matrix is singular.
    #[error("degenerate transform (determinant {det})")]
    DegenerateTransform { det: f64 },
    /// Image decoding or encoding failed.
    #[error("image io: {reason}")]
    ImageIo { reason: String },
}
