//! Similarity transform estimation against a template group.
//!
//! Every template of the group is fitted independently and scored by the sum
//! of Euclidean distances between the mapped landmarks and the template
//! points. The lowest score wins; ties keep the earlier template. Scores are
//! informational: a poor best fit is still returned, callers threshold
//! `reprojection_error` themselves.

mod similarity;

pub use similarity::fit_similarity;

use crate::landmarks::LandmarkSet;
use crate::template::{PoseClass, TemplateGroup};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::transform::AffineMatrix;
use crate::util::math::distance;
use crate::util::{FaceAlignError, FaceAlignResult};

/// Best-fitting transform for one landmark set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformResult {
    /// Forward map from source-image pixels to crop pixels.
    pub matrix: AffineMatrix,
    /// Index of the winning template inside `group`.
    pub template_index: usize,
    /// Sum of point distances between mapped landmarks and the template.
    pub reprojection_error: f64,
    /// Group the template was taken from.
    pub group: TemplateGroup,
}

impl TransformResult {
    /// Pose class of the winning template (`None` for the FFHQ group).
    pub fn pose(&self) -> Option<PoseClass> {
        match self.group {
            TemplateGroup::Default => PoseClass::from_index(self.template_index),
            TemplateGroup::Ffhq => None,
        }
    }
}

/// Results of aligning one landmark set against both groups.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BothTransforms {
    pub ffhq: TransformResult,
    pub default: TransformResult,
}

/// Sum of Euclidean distances between `m * landmarks[i]` and `target[i]`.
pub fn reprojection_error(
    m: &AffineMatrix,
    landmarks: &[[f64; 2]],
    target: &[[f64; 2]],
) -> f64 {
    landmarks
        .iter()
        .zip(target)
        .map(|(&p, &t)| distance(m.apply(p), t))
        .sum()
}

/// Estimates the transform mapping `landmarks` onto the best template of
/// `group`, with templates scaled to `crop_size`.
pub fn estimate(
    landmarks: &LandmarkSet,
    crop_size: usize,
    group: TemplateGroup,
) -> FaceAlignResult<TransformResult> {
    let _span = trace_span!("estimate", group = group.name(), crop_size = crop_size).entered();

    if !landmarks.is_finite() {
        return Err(FaceAlignError::InvalidInput("landmarks must be finite"));
    }
    let templates = group.templates(crop_size)?;

    let best = templates.iter().enumerate().try_fold(
        None::<TransformResult>,
        |best, (template_index, tpl)| -> FaceAlignResult<_> {
            let matrix = fit_similarity(landmarks.points(), tpl.points())?;
            let error = reprojection_error(&matrix, landmarks.points(), tpl.points());
            trace_debug!("template_scored", index = template_index, error = error);
            Ok(match best {
                Some(b) if b.reprojection_error <= error || error.is_nan() => Some(b),
                _ => Some(TransformResult {
                    matrix,
                    template_index,
                    reprojection_error: error,
                    group,
                }),
            })
        },
    )?;

    let best = best.ok_or(FaceAlignError::InvalidInput("template group is empty"))?;
    trace_event!(
        "template_selected",
        index = best.template_index,
        error = best.reprojection_error
    );
    Ok(best)
}

/// Parses `mode` (`"ffhq"`, `"default"`) and runs [`estimate`].
pub fn estimate_with_mode(
    landmarks: &LandmarkSet,
    crop_size: usize,
    mode: &str,
) -> FaceAlignResult<TransformResult> {
    estimate(landmarks, crop_size, mode.parse()?)
}

/// Estimates against the FFHQ group and the pose group independently.
pub fn estimate_both(landmarks: &LandmarkSet, crop_size: usize) -> FaceAlignResult<BothTransforms> {
    Ok(BothTransforms {
        ffhq: estimate(landmarks, crop_size, TemplateGroup::Ffhq)?,
        default: estimate(landmarks, crop_size, TemplateGroup::Default)?,
    })
}
