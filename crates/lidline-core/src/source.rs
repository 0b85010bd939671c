//! Face and landmark provider seam.

use crate::detector::{DetectorError, FaceDetector};
use crate::landmarker::{LandmarkPredictor, LandmarkPredictorError};
use crate::types::{FaceRegion, LandmarkSet};
use image::GrayImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("landmark predictor error: {0}")]
    Landmarks(#[from] LandmarkPredictorError),
}

impl SourceError {
    /// True when a required model file is absent, which no later image can recover from.
    pub fn is_missing_model(&self) -> bool {
        matches!(
            self,
            SourceError::Detector(DetectorError::ModelNotFound(_))
                | SourceError::Landmarks(LandmarkPredictorError::ModelNotFound(_))
        )
    }
}

/// Provider of face regions and 68-point landmarks for grayscale images.
pub trait LandmarkSource {
    /// Detected faces, best candidate first.
    fn detect_faces(&mut self, gray: &GrayImage) -> Result<Vec<FaceRegion>, SourceError>;

    /// Landmarks of the face inside `region`.
    fn predict_landmarks(&mut self, gray: &GrayImage, region: &FaceRegion) -> Result<LandmarkSet, SourceError>;
}

/// SCRFD detection paired with the 68-point ONNX landmark regressor.
pub struct OnnxLandmarkSource {
    detector: FaceDetector,
    predictor: LandmarkPredictor,
}

impl OnnxLandmarkSource {
    /// Load both models; fails fast if either file is missing.
    pub fn load(detector_path: &Path, landmark_path: &Path, confidence_threshold: f32) -> Result<Self, SourceError> {
        let detector = FaceDetector::load(detector_path, confidence_threshold)?;
        let predictor = LandmarkPredictor::load(landmark_path)?;
        Ok(Self { detector, predictor })
    }
}

impl LandmarkSource for OnnxLandmarkSource {
    fn detect_faces(&mut self, gray: &GrayImage) -> Result<Vec<FaceRegion>, SourceError> {
        Ok(self.detector.detect(gray)?)
    }

    fn predict_landmarks(&mut self, gray: &GrayImage, region: &FaceRegion) -> Result<LandmarkSet, SourceError> {
        Ok(self.predictor.predict(gray, region)?)
    }
}
