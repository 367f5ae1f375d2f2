//! Python bindings for the facealign face alignment library.
//!
//! Images are `(height, width, channels)` uint8 arrays, landmarks are
//! `(5, 2)` or `(N, 5, 2)` float64 arrays and matrices are `(2, 3)` float64
//! arrays.

use numpy::ndarray::{arr2, Array3};
use numpy::{
    IntoPyArray, PyArray2, PyArray3, PyReadonlyArray2, PyReadonlyArray3, PyUntypedArrayMethods,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError, PyZeroDivisionError};
use pyo3::prelude::*;

use facealign::{
    AffineMatrix, AlignConfig, AlignMode, AlignedFace, Aligner, FaceAlignError, ImageView,
    LandmarkSet, NormCrop, OwnedImage, TemplateGroup, TransformResult,
};

/// Convert a FaceAlignError to a Python exception.
fn to_py_err(err: FaceAlignError) -> PyErr {
    match err {
        FaceAlignError::DegenerateTransform { .. } => PyZeroDivisionError::new_err(err.to_string()),
        FaceAlignError::ImageIo { .. } => PyRuntimeError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// Estimated alignment for one face.
#[pyclass]
#[derive(Clone)]
pub struct Transform {
    inner: TransformResult,
}

#[pymethods]
impl Transform {
    /// Forward 2x3 matrix mapping source pixels to crop pixels.
    #[getter]
    fn matrix<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        matrix_to_py(py, &self.inner.matrix)
    }

    /// Index of the winning template.
    #[getter]
    fn template_index(&self) -> usize {
        self.inner.template_index
    }

    /// Sum of distances between the mapped landmarks and the template.
    #[getter]
    fn reprojection_error(&self) -> f64 {
        self.inner.reprojection_error
    }

    /// Template group name ("ffhq" or "default").
    #[getter]
    fn group(&self) -> &'static str {
        self.inner.group.name()
    }

    fn __repr__(&self) -> String {
        format!(
            "Transform(group={:?}, template_index={}, reprojection_error={:.4})",
            self.inner.group.name(),
            self.inner.template_index,
            self.inner.reprojection_error
        )
    }
}

fn matrix_to_py<'py>(py: Python<'py>, m: &AffineMatrix) -> Bound<'py, PyArray2<f64>> {
    arr2(&m.rows()).into_pyarray(py)
}

fn matrix_from_py(matrix: &PyReadonlyArray2<'_, f64>) -> PyResult<AffineMatrix> {
    if matrix.shape() != [2, 3] {
        return Err(PyValueError::new_err("matrix must have shape (2, 3)"));
    }
    let a = matrix.as_array();
    Ok(AffineMatrix::new([
        [a[[0, 0]], a[[0, 1]], a[[0, 2]]],
        [a[[1, 0]], a[[1, 1]], a[[1, 2]]],
    ]))
}

fn image_to_py<'py>(py: Python<'py>, image: OwnedImage) -> PyResult<Bound<'py, PyArray3<u8>>> {
    let shape = (image.height(), image.width(), image.channels());
    let array = Array3::from_shape_vec(shape, image.into_raw())
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
    Ok(array.into_pyarray(py))
}

fn landmark_batch(landmarks: &PyReadonlyArray3<'_, f64>) -> PyResult<Vec<LandmarkSet>> {
    let shape = landmarks.shape();
    let values: Vec<f64> = landmarks.as_array().iter().copied().collect();
    if shape[1] != 5 || shape[2] != 2 {
        return Err(to_py_err(FaceAlignError::InvalidLandmarkShape {
            len: shape[1] * shape[2],
        }));
    }
    LandmarkSet::batch_from_flat(&values).map_err(to_py_err)
}

fn single_landmarks(landmarks: &PyReadonlyArray2<'_, f64>) -> PyResult<LandmarkSet> {
    let values: Vec<f64> = landmarks.as_array().iter().copied().collect();
    if landmarks.shape() != [5, 2] {
        return Err(to_py_err(FaceAlignError::InvalidLandmarkShape { len: values.len() }));
    }
    LandmarkSet::from_flat(&values).map_err(to_py_err)
}

fn aligned_to_py<'py>(
    py: Python<'py>,
    face: AlignedFace,
) -> PyResult<(Bound<'py, PyArray3<u8>>, Transform)> {
    let transform = Transform {
        inner: face.transform,
    };
    Ok((image_to_py(py, face.crop)?, transform))
}

/// Estimate the similarity transform for one face.
///
/// Args:
///     landmarks: (5, 2) float64 array in source pixel coordinates
///     crop_size: side length of the target crop (default: 112)
///     mode: "ffhq" or "default" (default: "ffhq")
///
/// Returns:
///     Transform with the matrix, template index and reprojection error
#[pyfunction]
#[pyo3(signature = (landmarks, crop_size = 112, mode = "ffhq"))]
fn estimate(landmarks: PyReadonlyArray2<'_, f64>, crop_size: usize, mode: &str) -> PyResult<Transform> {
    let lmk = single_landmarks(&landmarks)?;
    let inner = facealign::estimate_with_mode(&lmk, crop_size, mode).map_err(to_py_err)?;
    Ok(Transform { inner })
}

/// Align every face of a batch.
///
/// Args:
///     image: (H, W, C) uint8 numpy array
///     landmarks: (N, 5, 2) float64 array, one landmark set per face
///     crop_size: side length of each crop (default: 112)
///     mode: "ffhq" or "default" (default: "ffhq")
///     parallel: align faces on the rayon pool (default: False)
///
/// Returns:
///     (crops, matrices) lists in input order
#[pyfunction]
#[pyo3(signature = (image, landmarks, crop_size = 112, mode = "ffhq", parallel = false))]
#[allow(clippy::type_complexity)]
fn align_face<'py>(
    py: Python<'py>,
    image: PyReadonlyArray3<'py, u8>,
    landmarks: PyReadonlyArray3<'py, f64>,
    crop_size: usize,
    mode: &str,
    parallel: bool,
) -> PyResult<(Vec<Bound<'py, PyArray3<u8>>>, Vec<Bound<'py, PyArray2<f64>>>)> {
    let shape = image.shape();
    let (height, width, channels) = (shape[0], shape[1], shape[2]);
    let data = image.as_slice()?;
    let view = ImageView::from_slice(data, width, height, channels).map_err(to_py_err)?;
    let batch = landmark_batch(&landmarks)?;
    let group: TemplateGroup = mode.parse().map_err(to_py_err)?;

    let cfg = AlignConfig::default()
        .with_crop_size(crop_size)
        .with_group(group)
        .with_parallel(parallel);
    let aligner = Aligner::new(cfg).map_err(to_py_err)?;
    let faces = aligner.align_faces(view, &batch).map_err(to_py_err)?;

    let mut crops = Vec::with_capacity(faces.len());
    let mut matrices = Vec::with_capacity(faces.len());
    for face in faces {
        matrices.push(matrix_to_py(py, &face.transform.matrix));
        crops.push(image_to_py(py, face.crop)?);
    }
    Ok((crops, matrices))
}

/// Align a single face, optionally against both template groups.
///
/// Args:
///     image: (H, W, C) uint8 numpy array
///     landmarks: (5, 2) float64 array
///     crop_size: side length of the crop (default: 112)
///     mode: "ffhq", "default" or "both" (default: "ffhq")
///
/// Returns:
///     list of (crop, Transform) pairs: one entry, or two for "both"
///     (the ffhq crop first, then the default-group crop)
#[pyfunction]
#[pyo3(signature = (image, landmarks, crop_size = 112, mode = "ffhq"))]
fn norm_crop<'py>(
    py: Python<'py>,
    image: PyReadonlyArray3<'py, u8>,
    landmarks: PyReadonlyArray2<'py, f64>,
    crop_size: usize,
    mode: &str,
) -> PyResult<Vec<(Bound<'py, PyArray3<u8>>, Transform)>> {
    let shape = image.shape();
    let data = image.as_slice()?;
    let view = ImageView::from_slice(data, shape[1], shape[0], shape[2]).map_err(to_py_err)?;
    let lmk = single_landmarks(&landmarks)?;
    let mode: AlignMode = mode.parse().map_err(to_py_err)?;

    let aligner = Aligner::new(AlignConfig::default().with_crop_size(crop_size)).map_err(to_py_err)?;
    match aligner.norm_crop(view, &lmk, mode).map_err(to_py_err)? {
        NormCrop::Single(face) => Ok(vec![aligned_to_py(py, face)?]),
        NormCrop::Both { ffhq, default } => {
            Ok(vec![aligned_to_py(py, ffhq)?, aligned_to_py(py, default)?])
        }
    }
}

/// Apply a 2x3 matrix to an (N, 2) or (N, 3) float64 array of points.
///
/// For (N, 3) input (x, y) are mapped and the third column is multiplied by
/// the isotropic scale hypot(m[0, 0], m[0, 1]), so depths and sizes follow
/// the crop scale.
#[pyfunction]
fn transform_points<'py>(
    py: Python<'py>,
    points: PyReadonlyArray2<'py, f64>,
    matrix: PyReadonlyArray2<'py, f64>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let m = matrix_from_py(&matrix)?;
    let shape = points.shape();
    let (rows, dim) = (shape[0], shape[1]);
    let values: Vec<f64> = points.as_array().iter().copied().collect();
    let out = facealign::transform_points(&values, dim, &m).map_err(to_py_err)?;
    let array = numpy::ndarray::Array2::from_shape_vec((rows, dim), out)
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
    Ok(array.into_pyarray(py))
}

/// Invert a 2x3 affine matrix. Raises ZeroDivisionError when singular.
#[pyfunction]
fn invert<'py>(
    py: Python<'py>,
    matrix: PyReadonlyArray2<'py, f64>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let m = matrix_from_py(&matrix)?;
    let inv = facealign::invert(&m).map_err(to_py_err)?;
    Ok(matrix_to_py(py, &inv))
}

/// Invert an (N, 2, 3) stack of matrices.
///
/// Returns a list with one entry per matrix: the inverse, or None where the
/// matrix is singular.
#[pyfunction]
fn invert_batch<'py>(
    py: Python<'py>,
    matrices: PyReadonlyArray3<'py, f64>,
) -> PyResult<Vec<Option<Bound<'py, PyArray2<f64>>>>> {
    let shape = matrices.shape();
    if shape[1] != 2 || shape[2] != 3 {
        return Err(PyValueError::new_err("matrices must have shape (N, 2, 3)"));
    }
    let values: Vec<f64> = matrices.as_array().iter().copied().collect();
    let batch: Vec<AffineMatrix> = values
        .chunks_exact(6)
        .map(|chunk| {
            let mut flat = [0.0; 6];
            flat.copy_from_slice(chunk);
            AffineMatrix::from_flat(flat)
        })
        .collect();
    Ok(facealign::invert_batch(&batch)
        .into_iter()
        .map(|res| res.ok().map(|inv| matrix_to_py(py, &inv)))
        .collect())
}

/// Letterbox an image into a size x size canvas.
///
/// Returns:
///     (canvas, scale) where dividing canvas coordinates by scale maps them
///     back to the source image
#[pyfunction]
fn square_crop<'py>(
    py: Python<'py>,
    image: PyReadonlyArray3<'py, u8>,
    size: usize,
) -> PyResult<(Bound<'py, PyArray3<u8>>, f64)> {
    let shape = image.shape();
    let data = image.as_slice()?;
    let view = ImageView::from_slice(data, shape[1], shape[0], shape[2]).map_err(to_py_err)?;
    let (canvas, scale) = facealign::square_crop(view, size).map_err(to_py_err)?;
    Ok((image_to_py(py, canvas)?, scale))
}

/// Python module for facealign.
#[pymodule]
fn _facealign(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Transform>()?;
    m.add_function(wrap_pyfunction!(estimate, m)?)?;
    m.add_function(wrap_pyfunction!(align_face, m)?)?;
    m.add_function(wrap_pyfunction!(norm_crop, m)?)?;
    m.add_function(wrap_pyfunction!(transform_points, m)?)?;
    m.add_function(wrap_pyfunction!(invert, m)?)?;
    m.add_function(wrap_pyfunction!(invert_batch, m)?)?;
    m.add_function(wrap_pyfunction!(square_crop, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
