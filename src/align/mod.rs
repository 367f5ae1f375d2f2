//! Face alignment pipeline: estimate, then warp.
//!
//! `Aligner` owns an `AlignConfig` and turns landmark sets into aligned crops.
//! Faces are independent of each other, so batches are plain maps that keep
//! input order; with the `rayon` feature and `parallel` set they run on the
//! rayon pool instead.

use crate::estimate::{estimate, estimate_both, TransformResult};
use crate::image::{ImageView, OwnedImage};
use crate::landmarks::LandmarkSet;
use crate::template::{AlignMode, TemplateGroup};
use crate::trace::{trace_event, trace_span};
use crate::transform::{invert, AffineMatrix};
use crate::util::{FaceAlignError, FaceAlignResult};
use crate::warp::{warp_affine, DEFAULT_BORDER};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Configuration for aligning faces.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignConfig {
    /// Side length of the square output crop.
    pub crop_size: usize,
    /// Template group to align against.
    pub group: TemplateGroup,
    /// Value written for samples outside the source frame.
    pub border_value: u8,
    /// Dispatch batch elements across the rayon pool (requires the `rayon`
    /// feature; ignored otherwise).
    pub parallel: bool,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            crop_size: 112,
            group: TemplateGroup::Ffhq,
            border_value: DEFAULT_BORDER,
            parallel: false,
        }
    }
}

impl AlignConfig {
    /// Checks the configuration for invalid values.
    pub fn validate(&self) -> FaceAlignResult<()> {
        if self.crop_size == 0 {
            return Err(FaceAlignError::InvalidDimensions {
                width: self.crop_size,
                height: self.crop_size,
            });
        }
        Ok(())
    }

    pub fn with_crop_size(mut self, crop_size: usize) -> Self {
        self.crop_size = crop_size;
        self
    }

    pub fn with_group(mut self, group: TemplateGroup) -> Self {
        self.group = group;
        self
    }

    pub fn with_border_value(mut self, border_value: u8) -> Self {
        self.border_value = border_value;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// An aligned crop and the transform that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedFace {
    /// `crop_size x crop_size` crop, same channel layout as the source.
    pub crop: OwnedImage,
    /// Winning template and forward matrix.
    pub transform: TransformResult,
}

impl AlignedFace {
    /// Forward matrix from source pixels to crop pixels.
    pub fn matrix(&self) -> &AffineMatrix {
        &self.transform.matrix
    }

    /// Matrix mapping crop pixels back into the source frame, for pasting a
    /// processed crop into the original image.
    pub fn inverse(&self) -> FaceAlignResult<AffineMatrix> {
        invert(&self.transform.matrix)
    }
}

/// Output of [`Aligner::norm_crop`].
#[derive(Clone, Debug, PartialEq)]
pub enum NormCrop {
    Single(AlignedFace),
    Both {
        ffhq: AlignedFace,
        default: AlignedFace,
    },
}

/// Face aligner with a fixed configuration.
#[derive(Clone, Debug)]
pub struct Aligner {
    cfg: AlignConfig,
}

impl Aligner {
    /// Creates an aligner after validating `cfg`.
    pub fn new(cfg: AlignConfig) -> FaceAlignResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AlignConfig {
        &self.cfg
    }

    /// Aligns one face against the configured group.
    pub fn align_one(
        &self,
        image: ImageView<'_, u8>,
        landmarks: &LandmarkSet,
    ) -> FaceAlignResult<AlignedFace> {
        let transform = estimate(landmarks, self.cfg.crop_size, self.cfg.group)?;
        self.warp(image, transform)
    }

    /// Aligns every face of a batch. `result[i]` belongs to `batch[i]`; the
    /// first failing face aborts the batch.
    pub fn align_faces(
        &self,
        image: ImageView<'_, u8>,
        batch: &[LandmarkSet],
    ) -> FaceAlignResult<Vec<AlignedFace>> {
        let _span = trace_span!("align_faces", faces = batch.len()).entered();

        #[cfg(feature = "rayon")]
        let faces = if self.cfg.parallel {
            batch
                .par_iter()
                .map(|lmk| self.align_one(image, lmk))
                .collect::<FaceAlignResult<Vec<_>>>()?
        } else {
            self.align_sequential(image, batch)?
        };
        #[cfg(not(feature = "rayon"))]
        let faces = self.align_sequential(image, batch)?;

        trace_event!("faces_aligned", count = faces.len());
        Ok(faces)
    }

    /// Aligns a single face according to `mode`; `AlignMode::Both` produces
    /// independent FFHQ and pose-group crops.
    pub fn norm_crop(
        &self,
        image: ImageView<'_, u8>,
        landmarks: &LandmarkSet,
        mode: AlignMode,
    ) -> FaceAlignResult<NormCrop> {
        match mode {
            AlignMode::Single(group) => {
                let transform = estimate(landmarks, self.cfg.crop_size, group)?;
                Ok(NormCrop::Single(self.warp(image, transform)?))
            }
            AlignMode::Both => {
                let both = estimate_both(landmarks, self.cfg.crop_size)?;
                Ok(NormCrop::Both {
                    ffhq: self.warp(image, both.ffhq)?,
                    default: self.warp(image, both.default)?,
                })
            }
        }
    }

    fn align_sequential(
        &self,
        image: ImageView<'_, u8>,
        batch: &[LandmarkSet],
    ) -> FaceAlignResult<Vec<AlignedFace>> {
        batch
            .iter()
            .map(|lmk| self.align_one(image, lmk))
            .collect()
    }

    fn warp(
        &self,
        image: ImageView<'_, u8>,
        transform: TransformResult,
    ) -> FaceAlignResult<AlignedFace> {
        let crop = warp_affine(
            image,
            &transform.matrix,
            self.cfg.crop_size,
            self.cfg.border_value,
        )?;
        Ok(AlignedFace { crop, transform })
    }
}

/// Aligns every landmark set of `batch`, returning crops and forward matrices
/// in input order. An empty batch yields two empty vectors.
pub fn align_face(
    image: ImageView<'_, u8>,
    batch: &[LandmarkSet],
    crop_size: usize,
    group: TemplateGroup,
) -> FaceAlignResult<(Vec<OwnedImage>, Vec<AffineMatrix>)> {
    let aligner = Aligner::new(AlignConfig::default().with_crop_size(crop_size).with_group(group))?;
    Ok(split(aligner.align_faces(image, batch)?))
}

/// Parallel form of [`align_face`].
#[cfg(feature = "rayon")]
pub fn align_face_par(
    image: ImageView<'_, u8>,
    batch: &[LandmarkSet],
    crop_size: usize,
    group: TemplateGroup,
) -> FaceAlignResult<(Vec<OwnedImage>, Vec<AffineMatrix>)> {
    let cfg = AlignConfig::default()
        .with_crop_size(crop_size)
        .with_group(group)
        .with_parallel(true);
    Ok(split(Aligner::new(cfg)?.align_faces(image, batch)?))
}

fn split(faces: Vec<AlignedFace>) -> (Vec<OwnedImage>, Vec<AffineMatrix>) {
    faces
        .into_iter()
        .map(|face| (face.crop, face.transform.matrix))
        .unzip()
}

/// Similarity that scales by `scale`, moves `center` (in source pixels) to the
/// origin, rotates by `rotation_deg`, then moves the origin to the middle of an
/// `output_size` square.
pub fn center_crop_matrix(
    center: [f64; 2],
    output_size: usize,
    scale: f64,
    rotation_deg: f64,
) -> AffineMatrix {
    let half = output_size as f64 / 2.0;
    AffineMatrix::scaling(scale)
        .then(&AffineMatrix::translation(
            -center[0] * scale,
            -center[1] * scale,
        ))
        .then(&AffineMatrix::rotation_deg(rotation_deg))
        .then(&AffineMatrix::translation(half, half))
}

/// Crops an `output_size` square around `center` using
/// [`center_crop_matrix`]; returns the crop and its forward matrix.
pub fn crop_about_center(
    image: ImageView<'_, u8>,
    center: [f64; 2],
    output_size: usize,
    scale: f64,
    rotation_deg: f64,
) -> FaceAlignResult<(OwnedImage, AffineMatrix)> {
    let m = center_crop_matrix(center, output_size, scale, rotation_deg);
    let crop = warp_affine(image, &m, output_size, DEFAULT_BORDER)?;
    Ok((crop, m))
}

#[cfg(test)]
mod tests {
    use super::{align_face, center_crop_matrix, crop_about_center, AlignConfig, Aligner, NormCrop};
    use crate::image::OwnedImage;
    use crate::landmarks::LandmarkSet;
    use crate::template::{canonical, AlignMode, TemplateGroup};
    use crate::util::FaceAlignError;

    fn textured(width: usize, height: usize) -> OwnedImage {
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8]);
            }
        }
        OwnedImage::new(data, width, height, 3).unwrap()
    }

    #[test]
    fn empty_batch_is_empty() {
        let img = textured(16, 16);
        let (crops, matrices) = align_face(img.view(), &[], 112, TemplateGroup::Ffhq).unwrap();
        assert!(crops.is_empty());
        assert!(matrices.is_empty());
    }

    #[test]
    fn config_validation() {
        let cfg = AlignConfig::default().with_crop_size(0);
        assert_eq!(
            Aligner::new(cfg).unwrap_err(),
            FaceAlignError::InvalidDimensions {
                width: 0,
                height: 0
            }
        );
        // Same error as asking the template library for a zero-sized crop.
        assert_eq!(
            crate::template::TemplateGroup::Ffhq.templates(0).unwrap_err(),
            FaceAlignError::InvalidDimensions {
                width: 0,
                height: 0
            }
        );
    }

    #[test]
    fn parallel_flag_gives_sequential_results() {
        let img = textured(96, 96);
        let batch = [
            LandmarkSet::new(canonical::FRONTAL),
            LandmarkSet::new(canonical::RIGHT),
        ];
        let seq = Aligner::new(AlignConfig::default()).unwrap();
        let par = Aligner::new(AlignConfig::default().with_parallel(true)).unwrap();
        assert_eq!(
            seq.align_faces(img.view(), &batch).unwrap(),
            par.align_faces(img.view(), &batch).unwrap()
        );
        assert!(matches!(
            par.align_faces(img.view(), &[LandmarkSet::new([[3.0, 3.0]; 5])]),
            Err(FaceAlignError::DegenerateTransform { .. })
        ));
    }

    #[test]
    fn frontal_landmarks_reproduce_source() {
        let img = textured(112, 112);
        let aligner =
            Aligner::new(AlignConfig::default().with_group(TemplateGroup::Default)).unwrap();
        let face = aligner
            .align_one(img.view(), &LandmarkSet::new(canonical::FRONTAL))
            .unwrap();
        assert_eq!(face.transform.template_index, 2);
        // Identity up to rounding noise in the fitted matrix.
        assert_eq!(face.crop.pixel(56, 68), img.pixel(56, 68));
        let inv = face.inverse().unwrap();
        assert!(inv.approx_eq(&crate::transform::AffineMatrix::IDENTITY, 1e-9));
    }

    #[test]
    fn both_mode_returns_two_crops() {
        let img = textured(128, 128);
        let aligner = Aligner::new(AlignConfig::default()).unwrap();
        let out = aligner
            .norm_crop(img.view(), &LandmarkSet::new(canonical::LEFT), AlignMode::Both)
            .unwrap();
        match out {
            NormCrop::Both { ffhq, default } => {
                assert_eq!(ffhq.transform.group, TemplateGroup::Ffhq);
                assert_eq!(default.transform.group, TemplateGroup::Default);
                assert_eq!(default.transform.template_index, 1);
                assert_eq!(ffhq.crop.width(), 112);
            }
            NormCrop::Single(_) => panic!("expected two crops"),
        }
    }

    #[test]
    fn center_crop_puts_center_in_the_middle() {
        let m = center_crop_matrix([40.0, 30.0], 64, 1.5, 25.0);
        let p = m.apply([40.0, 30.0]);
        assert!((p[0] - 32.0).abs() < 1e-12);
        assert!((p[1] - 32.0).abs() < 1e-12);
        assert!((m.scale() - 1.5).abs() < 1e-12);

        let img = textured(80, 60);
        let (crop, m) = crop_about_center(img.view(), [40.0, 30.0], 20, 1.0, 0.0).unwrap();
        assert_eq!(m.apply([40.0, 30.0]), [10.0, 10.0]);
        assert_eq!(crop.pixel(10, 10), img.pixel(40, 30));
        assert_eq!(crop.pixel(0, 0), img.pixel(30, 20));
    }
}
