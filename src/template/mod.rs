//! Template library: canonical landmark layouts scaled to a crop size.
//!
//! Two groups exist. The `default` group holds five pose classes defined at a
//! 112-unit reference; the `ffhq` group holds a single frontal layout defined
//! at 512 units. Templates are plain data, scaled on demand by
//! `crop_size / reference_size`.

pub mod canonical;

use crate::util::{FaceAlignError, FaceAlignResult};
use std::fmt;
use std::str::FromStr;

/// Discrete head pose classes of the `default` group, in scoring order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoseClass {
    LeftProfile,
    Left,
    Frontal,
    Right,
    RightProfile,
}

impl PoseClass {
    /// All pose classes in the order the estimator tries them.
    pub const ALL: [PoseClass; 5] = [
        PoseClass::LeftProfile,
        PoseClass::Left,
        PoseClass::Frontal,
        PoseClass::Right,
        PoseClass::RightProfile,
    ];

    /// Position of this pose inside the `default` group.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Pose for a template index of the `default` group.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Reference landmarks at [`canonical::POSE_REFERENCE_SIZE`].
    pub fn reference_points(self) -> &'static [[f64; 2]; 5] {
        match self {
            PoseClass::LeftProfile => &canonical::LEFT_PROFILE,
            PoseClass::Left => &canonical::LEFT,
            PoseClass::Frontal => &canonical::FRONTAL,
            PoseClass::Right => &canonical::RIGHT,
            PoseClass::RightProfile => &canonical::RIGHT_PROFILE,
        }
    }
}

/// A set of templates scored together by the estimator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TemplateGroup {
    /// Single FFHQ layout.
    #[default]
    Ffhq,
    /// Five pose classes.
    Default,
}

impl TemplateGroup {
    /// Number of templates in the group.
    pub fn template_count(self) -> usize {
        match self {
            TemplateGroup::Ffhq => 1,
            TemplateGroup::Default => PoseClass::ALL.len(),
        }
    }

    /// Resolution the group's reference coordinates are expressed in.
    pub fn reference_size(self) -> f64 {
        match self {
            TemplateGroup::Ffhq => canonical::FFHQ_REFERENCE_SIZE,
            TemplateGroup::Default => canonical::POSE_REFERENCE_SIZE,
        }
    }

    /// Short lowercase name, as accepted by `FromStr`.
    pub fn name(self) -> &'static str {
        match self {
            TemplateGroup::Ffhq => "ffhq",
            TemplateGroup::Default => "default",
        }
    }

    /// Returns the group's templates scaled to `crop_size`.
    pub fn templates(self, crop_size: usize) -> FaceAlignResult<Vec<Template>> {
        if crop_size == 0 {
            return Err(FaceAlignError::InvalidDimensions {
                width: crop_size,
                height: crop_size,
            });
        }
        let ratio = crop_size as f64 / self.reference_size();
        let out = match self {
            TemplateGroup::Ffhq => vec![Template::scaled(None, &canonical::FFHQ, ratio)],
            TemplateGroup::Default => PoseClass::ALL
                .iter()
                .map(|&pose| Template::scaled(Some(pose), pose.reference_points(), ratio))
                .collect(),
        };
        Ok(out)
    }
}

impl FromStr for TemplateGroup {
    type Err = FaceAlignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ffhq" => Ok(TemplateGroup::Ffhq),
            "default" | "none" => Ok(TemplateGroup::Default),
            _ => Err(FaceAlignError::UnknownMode { mode: s.to_string() }),
        }
    }
}

impl fmt::Display for TemplateGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Alignment mode for single-face cropping: one group, or both at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlignMode {
    Single(TemplateGroup),
    /// Align against `ffhq` and `default` independently.
    Both,
}

impl Default for AlignMode {
    fn default() -> Self {
        AlignMode::Single(TemplateGroup::Ffhq)
    }
}

impl FromStr for AlignMode {
    type Err = FaceAlignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("both") {
            return Ok(AlignMode::Both);
        }
        s.parse().map(AlignMode::Single)
    }
}

impl From<TemplateGroup> for AlignMode {
    fn from(group: TemplateGroup) -> Self {
        AlignMode::Single(group)
    }
}

/// A template scaled to a concrete crop size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Template {
    pose: Option<PoseClass>,
    points: [[f64; 2]; 5],
}

impl Template {
    fn scaled(pose: Option<PoseClass>, reference: &[[f64; 2]; 5], ratio: f64) -> Self {
        let points = reference.map(|[x, y]| [x * ratio, y * ratio]);
        Self { pose, points }
    }

    /// Pose class for `default`-group templates; `None` for FFHQ.
    pub fn pose(&self) -> Option<PoseClass> {
        self.pose
    }

    /// The five target points in crop coordinates.
    pub fn points(&self) -> &[[f64; 2]; 5] {
        &self.points
    }
}

/// Looks up a group by name and returns its templates scaled to `crop_size`.
pub fn templates_for(mode: &str, crop_size: usize) -> FaceAlignResult<Vec<Template>> {
    mode.parse::<TemplateGroup>()?.templates(crop_size)
}
