//! facealign is a CPU-first face alignment library.
//!
//! Given five facial landmarks per face it fits a similarity transform onto
//! canonical pose templates, warps the source frame into fixed-size crops for
//! downstream inference, and inverts the transforms so processed crops can be
//! composited back. Batched entry points can run on rayon with the `rayon`
//! feature.

pub mod align;
pub mod estimate;
pub mod image;
pub mod landmarks;
pub mod lowlevel;
pub mod template;
mod trace;
pub mod transform;
pub mod util;
pub mod warp;

#[cfg(feature = "image-io")]
pub use crate::image::io;

pub use align::{align_face, crop_about_center, AlignConfig, AlignedFace, Aligner, NormCrop};
#[cfg(feature = "rayon")]
pub use align::align_face_par;
pub use estimate::{estimate, estimate_both, estimate_with_mode, BothTransforms, TransformResult};
pub use crate::image::resize::square_crop;
pub use crate::image::{ImageView, OwnedImage};
pub use landmarks::LandmarkSet;
pub use template::{templates_for, AlignMode, PoseClass, Template, TemplateGroup};
#[cfg(feature = "rayon")]
pub use transform::invert_batch_par;
pub use transform::{invert, invert_batch, transform_points, AffineMatrix};
pub use util::{FaceAlignError, FaceAlignResult};
pub use warp::warp_affine;
