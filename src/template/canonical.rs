//! Canonical five-point layouts.
//!
//! Point order everywhere: left eye, right eye, nose tip, left mouth corner,
//! right mouth corner.

/// Reference resolution of the pose templates.
pub const POSE_REFERENCE_SIZE: f64 = 112.0;

/// Reference resolution of the FFHQ template.
pub const FFHQ_REFERENCE_SIZE: f64 = 512.0;

/// Head turned far to the left.
pub const LEFT_PROFILE: [[f64; 2]; 5] = [
    [51.642, 50.115],
    [57.617, 49.990],
    [35.740, 69.007],
    [51.157, 89.050],
    [57.025, 89.702],
];

pub const LEFT: [[f64; 2]; 5] = [
    [45.031, 50.118],
    [65.568, 50.872],
    [39.677, 68.111],
    [45.177, 86.190],
    [64.246, 86.758],
];

pub const FRONTAL: [[f64; 2]; 5] = [
    [39.730, 51.138],
    [72.270, 51.138],
    [56.000, 68.493],
    [42.463, 87.010],
    [69.537, 87.010],
];

pub const RIGHT: [[f64; 2]; 5] = [
    [46.845, 50.872],
    [67.382, 50.118],
    [72.737, 68.111],
    [48.167, 86.758],
    [67.236, 86.190],
];

/// Head turned far to the right; mirror of [`LEFT_PROFILE`].
pub const RIGHT_PROFILE: [[f64; 2]; 5] = [
    [54.796, 49.990],
    [60.771, 50.115],
    [76.673, 69.007],
    [55.388, 89.702],
    [61.257, 89.050],
];

/// FFHQ-style high-resolution frontal layout.
pub const FFHQ: [[f64; 2]; 5] = [
    [192.98138, 239.94708],
    [318.90277, 240.1936],
    [256.63416, 314.01935],
    [201.26117, 371.41043],
    [313.08905, 371.15118],
];
