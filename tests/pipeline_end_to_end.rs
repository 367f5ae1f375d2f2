//! End-to-end alignment: synthetic frames, known transforms, recovered crops.

use facealign::lowlevel::{canonical, reprojection_error};
use facealign::{
    align_face, crop_about_center, estimate, invert, square_crop, warp_affine, AffineMatrix,
    AlignConfig, AlignMode, Aligner, LandmarkSet, NormCrop, OwnedImage, TemplateGroup,
};

/// Smooth RGB pattern: red follows x, green follows y, blue their sum.
fn smooth_frame(width: usize, height: usize) -> OwnedImage {
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let r = (x as f64 * 255.0 / width as f64) as u8;
            let g = (y as f64 * 255.0 / height as f64) as u8;
            let b = ((x + y) as f64 * 127.0 / (width + height) as f64) as u8;
            data.extend_from_slice(&[r, g, b]);
        }
    }
    OwnedImage::new(data, width, height, 3).unwrap()
}

/// Image whose pixel at (x, y) stores (x, y, 0); only valid below 256x256.
fn identity_coded(size: usize) -> OwnedImage {
    let mut data = Vec::with_capacity(size * size * 3);
    for y in 0..size {
        for x in 0..size {
            data.extend_from_slice(&[x as u8, y as u8, 0]);
        }
    }
    OwnedImage::new(data, size, size, 3).unwrap()
}

/// Places a template in a frame: landmarks = `to_frame * template`.
fn landmarks_in_frame(template: &[[f64; 2]; 5], to_frame: &AffineMatrix) -> LandmarkSet {
    LandmarkSet::new(template.map(|p| to_frame.apply(p)))
}

#[test]
fn template_landmarks_reproduce_identity_coded_image() {
    let img = identity_coded(112);
    let lmk = LandmarkSet::new(canonical::FRONTAL);
    let (crops, matrices) = align_face(img.view(), &[lmk], 112, TemplateGroup::Default).unwrap();
    assert_eq!(crops.len(), 1);
    assert!(matrices[0].approx_eq(&AffineMatrix::IDENTITY, 1e-9));
    assert_eq!(crops[0], img);
    for p in canonical::FRONTAL {
        let (x, y) = (p[0].round() as usize, p[1].round() as usize);
        assert_eq!(crops[0].pixel(x, y).unwrap(), &[x as u8, y as u8, 0]);
    }
}

#[test]
fn recovers_known_similarity() {
    let frame = smooth_frame(320, 240);
    // Crop space -> frame space: rotate 15 degrees, scale 1.6, move into frame.
    let to_frame = AffineMatrix::rotation_deg(15.0)
        .then(&AffineMatrix::scaling(1.6))
        .then(&AffineMatrix::translation(90.0, 30.0));
    let lmk = landmarks_in_frame(&canonical::LEFT, &to_frame);

    let res = estimate(&lmk, 112, TemplateGroup::Default).unwrap();
    assert_eq!(res.template_index, 1);
    assert!(res.reprojection_error < 1e-8);
    let expected = invert(&to_frame).unwrap();
    assert!(res.matrix.approx_eq(&expected, 1e-9), "{:?}", res.matrix);

    let aligner =
        Aligner::new(AlignConfig::default().with_group(TemplateGroup::Default)).unwrap();
    let face = aligner.align_one(frame.view(), &lmk).unwrap();
    let direct = warp_affine(frame.view(), &res.matrix, 112, 0).unwrap();
    assert_eq!(face.crop, direct);
    assert!(face.inverse().unwrap().approx_eq(&to_frame, 1e-9));

    // The crop pixel at a template point samples the frame near the landmark.
    let nose = canonical::LEFT[2];
    let crop_px = face
        .crop
        .pixel(nose[0].round() as usize, nose[1].round() as usize)
        .unwrap();
    let src = face.inverse().unwrap().apply([nose[0].round(), nose[1].round()]);
    let frame_px = frame
        .pixel(src[0].round() as usize, src[1].round() as usize)
        .unwrap();
    for (a, b) in crop_px.iter().zip(frame_px) {
        assert!((*a as i32 - *b as i32).abs() <= 2, "{crop_px:?} vs {frame_px:?}");
    }
}

#[test]
fn batch_preserves_input_order() {
    let frame = smooth_frame(400, 300);
    let placements = [
        AffineMatrix::scaling(1.2).then(&AffineMatrix::translation(10.0, 20.0)),
        AffineMatrix::rotation_deg(-20.0)
            .then(&AffineMatrix::scaling(0.9))
            .then(&AffineMatrix::translation(220.0, 140.0)),
        AffineMatrix::scaling(2.0).then(&AffineMatrix::translation(150.0, 40.0)),
    ];
    let poses = [&canonical::FRONTAL, &canonical::RIGHT, &canonical::RIGHT_PROFILE];
    let batch: Vec<LandmarkSet> = placements
        .iter()
        .zip(poses)
        .map(|(m, tpl)| landmarks_in_frame(tpl, m))
        .collect();

    let (crops, matrices) = align_face(frame.view(), &batch, 112, TemplateGroup::Default).unwrap();
    assert_eq!(crops.len(), 3);
    assert_eq!(matrices.len(), 3);
    for (i, (m, placement)) in matrices.iter().zip(&placements).enumerate() {
        let expected = invert(placement).unwrap();
        assert!(m.approx_eq(&expected, 1e-9), "face {i}: {m:?}");
        assert_eq!((crops[i].width(), crops[i].height()), (112, 112));
    }
}

#[test]
fn ffhq_crop_size_scales_matrix() {
    let lmk = LandmarkSet::new(canonical::FFHQ);
    let res = estimate(&lmk, 256, TemplateGroup::Ffhq).unwrap();
    assert!(res.matrix.approx_eq(&AffineMatrix::scaling(0.5), 1e-9));
    let tpl = TemplateGroup::Ffhq.templates(256).unwrap();
    let err = reprojection_error(&res.matrix, lmk.points(), tpl[0].points());
    assert!(err < 1e-8);
}

#[test]
fn both_mode_crops_match_single_modes() {
    let frame = smooth_frame(256, 256);
    let lmk = landmarks_in_frame(
        &canonical::FRONTAL,
        &AffineMatrix::scaling(1.5).then(&AffineMatrix::translation(40.0, 20.0)),
    );
    let aligner = Aligner::new(AlignConfig::default().with_crop_size(128)).unwrap();

    let NormCrop::Both { ffhq, default } = aligner
        .norm_crop(frame.view(), &lmk, "both".parse().unwrap())
        .unwrap()
    else {
        panic!("expected both crops");
    };
    let NormCrop::Single(single_ffhq) = aligner
        .norm_crop(frame.view(), &lmk, AlignMode::Single(TemplateGroup::Ffhq))
        .unwrap()
    else {
        panic!("expected a single crop");
    };
    let NormCrop::Single(single_default) = aligner
        .norm_crop(frame.view(), &lmk, "default".parse().unwrap())
        .unwrap()
    else {
        panic!("expected a single crop");
    };
    assert_eq!(ffhq, single_ffhq);
    assert_eq!(default, single_default);
    assert_eq!(default.transform.template_index, 2);
}

#[test]
fn face_outside_frame_gets_black_border() {
    let frame = smooth_frame(64, 64);
    // Landmarks near the right edge: most of the crop samples outside the frame.
    let lmk = landmarks_in_frame(&canonical::FRONTAL, &AffineMatrix::translation(40.0, 0.0));
    let (crops, _) = align_face(frame.view(), &[lmk], 112, TemplateGroup::Default).unwrap();
    assert_eq!(crops[0].pixel(111, 111).unwrap(), &[0, 0, 0]);
}

#[test]
fn letterbox_then_crop_about_center() {
    let frame = smooth_frame(200, 100);
    let (square, scale) = square_crop(frame.view(), 100).unwrap();
    assert_eq!(scale, 0.5);
    assert_eq!(square.pixel(50, 75).unwrap(), &[0, 0, 0]);

    let (crop, m) = crop_about_center(frame.view(), [100.0, 50.0], 32, 1.0, 0.0).unwrap();
    assert_eq!(m.apply([100.0, 50.0]), [16.0, 16.0]);
    assert_eq!(crop.pixel(16, 16), frame.pixel(100, 50));
}
