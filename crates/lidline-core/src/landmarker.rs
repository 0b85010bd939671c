//! 68-point landmark regressor via ONNX Runtime.
//!
//! Expects the insightface `1k3d68` model: a 192x192 crop centered on the face
//! region, scaled so the region's longer side spans two thirds of the crop.
//! Output is normalized to [-1, 1] crop coordinates, either as 68 (x, y) pairs
//! or as a larger (x, y, z) tensor whose trailing 68 rows are the landmarks.

use crate::types::{FaceRegion, LandmarkSet, LANDMARK_COUNT};
use image::GrayImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const LANDMARK_INPUT_SIZE: usize = 192;
const LANDMARK_MEAN: f32 = 0.0;
const LANDMARK_STD: f32 = 1.0;
/// Crop side relative to the longer side of the face region.
const LANDMARK_CROP_MARGIN: f32 = 1.5;
/// Outputs at least this long carry a z coordinate per point.
const LANDMARK_3D_MIN_LEN: usize = 3000;

#[derive(Error, Debug)]
pub enum LandmarkPredictorError {
    #[error("model file not found: {0}; download 1k3d68.onnx from insightface buffalo_l")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("face region is empty")]
    EmptyRegion,
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Similarity mapping between crop pixels and source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CropTransform {
    center: (f32, f32),
    scale: f32,
}

impl CropTransform {
    fn for_region(region: &FaceRegion) -> Option<Self> {
        let side = region.width.max(region.height);
        if !(side > 0.0) {
            return None;
        }
        Some(Self {
            center: region.center(),
            scale: LANDMARK_INPUT_SIZE as f32 / (side * LANDMARK_CROP_MARGIN),
        })
    }

    fn to_source(&self, u: f32, v: f32) -> (f32, f32) {
        let half = (LANDMARK_INPUT_SIZE / 2) as f32;
        (
            (u - half) / self.scale + self.center.0,
            (v - half) / self.scale + self.center.1,
        )
    }
}

pub struct LandmarkPredictor {
    session: Session,
}

impl LandmarkPredictor {
    /// Load the landmark ONNX model from the given path.
    pub fn load(model_path: &Path) -> Result<Self, LandmarkPredictorError> {
        if !model_path.exists() {
            return Err(LandmarkPredictorError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = %model_path.display(),
            inputs = ?session.inputs().iter().map(|i| i.name()).collect::<Vec<_>>(),
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded landmark model"
        );

        Ok(Self { session })
    }

    /// Predict the 68 landmarks of the face inside `region`.
    pub fn predict(&mut self, gray: &GrayImage, region: &FaceRegion) -> Result<LandmarkSet, LandmarkPredictorError> {
        let transform = CropTransform::for_region(region).ok_or(LandmarkPredictorError::EmptyRegion)?;
        let input = preprocess(gray, &transform);

        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;
        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| LandmarkPredictorError::InferenceFailed(format!("landmark extraction: {e}")))?;

        decode_landmarks(raw, &transform)
    }
}

/// Bilinear crop into a NCHW tensor, gray replicated across channels.
fn preprocess(gray: &GrayImage, transform: &CropTransform) -> Array4<f32> {
    let size = LANDMARK_INPUT_SIZE;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

    for v in 0..size {
        for u in 0..size {
            let (sx, sy) = transform.to_source(u as f32, v as f32);
            let value = (sample_bilinear(gray, sx, sy) - LANDMARK_MEAN) / LANDMARK_STD;
            for c in 0..3 {
                tensor[[0, c, v, u]] = value;
            }
        }
    }

    tensor
}

/// Out-of-bounds samples read as black.
fn sample_bilinear(gray: &GrayImage, x: f32, y: f32) -> f32 {
    let (w, h) = (gray.width() as i64, gray.height() as i64);
    let pixel = |px: i64, py: i64| -> f32 {
        if px >= 0 && px < w && py >= 0 && py < h {
            gray.get_pixel(px as u32, py as u32).0[0] as f32
        } else {
            0.0
        }
    };

    let (x0, y0) = (x.floor() as i64, y.floor() as i64);
    let (fx, fy) = (x - x.floor(), y - y.floor());

    pixel(x0, y0) * (1.0 - fx) * (1.0 - fy)
        + pixel(x0 + 1, y0) * fx * (1.0 - fy)
        + pixel(x0, y0 + 1) * (1.0 - fx) * fy
        + pixel(x0 + 1, y0 + 1) * fx * fy
}

/// Map raw model output back to source pixel coordinates.
fn decode_landmarks(raw: &[f32], transform: &CropTransform) -> Result<LandmarkSet, LandmarkPredictorError> {
    let dim = if raw.len() >= LANDMARK_3D_MIN_LEN { 3 } else { 2 };
    let available = raw.len() / dim;
    if available < LANDMARK_COUNT {
        return Err(LandmarkPredictorError::InferenceFailed(format!(
            "expected at least {LANDMARK_COUNT} landmarks, model produced {available}"
        )));
    }

    let half = (LANDMARK_INPUT_SIZE / 2) as f32;
    let start = (available - LANDMARK_COUNT) * dim;
    let points: Vec<(i32, i32)> = raw[start..start + LANDMARK_COUNT * dim]
        .chunks_exact(dim)
        .map(|p| {
            let (sx, sy) = transform.to_source((p[0] + 1.0) * half, (p[1] + 1.0) * half);
            (sx.round() as i32, sy.round() as i32)
        })
        .collect();

    LandmarkSet::from_points(&points).map_err(|e| LandmarkPredictorError::InferenceFailed(e.to_string()))
}
