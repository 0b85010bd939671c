use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of points in the canonical facial landmark layout.
pub const LANDMARK_COUNT: usize = 68;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("expected 68 landmarks, got {0}")]
    WrongCount(usize),
}

/// Face region reported by a detector, in source image pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl FaceRegion {
    /// Center of the region.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// The 68 facial landmarks of one face.
///
/// Index layout: jaw 0-16, eyebrows 17-26, nose 27-35, eyes 36-47, mouth 48-67.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandmarkSet {
    points: [(i32, i32); LANDMARK_COUNT],
}

impl LandmarkSet {
    /// Build a landmark set from exactly 68 points in canonical order.
    pub fn from_points(points: &[(i32, i32)]) -> Result<Self, LandmarkError> {
        let points: [(i32, i32); LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| LandmarkError::WrongCount(points.len()))?;
        Ok(Self { points })
    }

    /// Point at landmark index `idx` (0..68).
    pub fn point(&self, idx: usize) -> (i32, i32) {
        self.points[idx]
    }

    pub fn points(&self) -> &[(i32, i32)] {
        &self.points
    }
}

/// One synthesized eyelid line, serialized as `[[x, y], ...]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EyelidCurve {
    pub points: Vec<(i32, i32)>,
}

impl EyelidCurve {
    /// Horizontal extent as (min x, max x), or `None` for an empty curve.
    pub fn x_span(&self) -> Option<(i32, i32)> {
        let min = self.points.iter().map(|p| p.0).min()?;
        let max = self.points.iter().map(|p| p.0).max()?;
        Some((min, max))
    }
}
