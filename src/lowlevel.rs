//! Low-level building blocks for custom alignment pipelines.
//!
//! These expose the solver, scoring, raw template data and resampling
//! primitives behind the high-level `Aligner` API. Most users should prefer
//! `estimate`, `align_face` and `Aligner`.

pub use crate::align::center_crop_matrix;
pub use crate::estimate::{fit_similarity, reprojection_error};
pub use crate::image::resize::resize_bilinear;
pub use crate::template::canonical;
pub use crate::transform::{transform_points_2d, transform_points_3d};
pub use crate::warp::{warp_affine_to, DEFAULT_BORDER};
#[cfg(feature = "rayon")]
pub use crate::warp::warp_affine_par;
