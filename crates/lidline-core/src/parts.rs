//! Facial part table: which landmarks outline each part, and the color that
//! keys the part inside a composite mask.

use crate::types::LANDMARK_COUNT;
use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// Background key of the composite mask.
pub const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacePart {
    LeftEye,
    RightEye,
    Nose,
    Mouth,
    LeftEyebrow,
    RightEyebrow,
    Jaw,
}

impl FacePart {
    pub const ALL: [FacePart; 7] = [
        FacePart::LeftEye,
        FacePart::RightEye,
        FacePart::Nose,
        FacePart::Mouth,
        FacePart::LeftEyebrow,
        FacePart::RightEyebrow,
        FacePart::Jaw,
    ];

    /// Name used for output directories and mask file suffixes.
    pub fn name(self) -> &'static str {
        match self {
            FacePart::LeftEye => "left_eye",
            FacePart::RightEye => "right_eye",
            FacePart::Nose => "nose",
            FacePart::Mouth => "mouth",
            FacePart::LeftEyebrow => "left_eyebrow",
            FacePart::RightEyebrow => "right_eyebrow",
            FacePart::Jaw => "jaw",
        }
    }
}

impl fmt::Display for FacePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One part's landmark index range and composite color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRegion {
    pub part: FacePart,
    pub landmarks: Range<usize>,
    pub color: Rgb<u8>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PartTableError {
    #[error("part table is empty")]
    Empty,
    #[error("part {0} listed more than once")]
    DuplicatePart(FacePart),
    #[error("part {part} has an empty landmark range")]
    EmptyRange { part: FacePart },
    #[error("part {part} landmark range {start}..{end} exceeds 68 landmarks")]
    RangeOutOfBounds { part: FacePart, start: usize, end: usize },
    #[error("parts {first} and {second} share color {color:?}")]
    DuplicateColor { first: FacePart, second: FacePart, color: [u8; 3] },
    #[error("part {0} uses the background color")]
    BackgroundColor(FacePart),
}

/// Immutable part configuration. Region order is the polygon fill order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartTable {
    regions: Vec<PartRegion>,
}

impl PartTable {
    /// Validate and build a table. Colors must be unique and non-black so that
    /// exact-match extraction recovers each part.
    pub fn new(regions: Vec<PartRegion>) -> Result<Self, PartTableError> {
        if regions.is_empty() {
            return Err(PartTableError::Empty);
        }

        for (i, region) in regions.iter().enumerate() {
            let r = &region.landmarks;
            if r.start >= r.end {
                return Err(PartTableError::EmptyRange { part: region.part });
            }
            if r.end > LANDMARK_COUNT {
                return Err(PartTableError::RangeOutOfBounds {
                    part: region.part,
                    start: r.start,
                    end: r.end,
                });
            }
            if region.color == BACKGROUND {
                return Err(PartTableError::BackgroundColor(region.part));
            }

            for earlier in &regions[..i] {
                if earlier.part == region.part {
                    return Err(PartTableError::DuplicatePart(region.part));
                }
                if earlier.color == region.color {
                    return Err(PartTableError::DuplicateColor {
                        first: earlier.part,
                        second: region.part,
                        color: region.color.0,
                    });
                }
            }
        }

        Ok(Self { regions })
    }

    /// The standard 68-point layout, in declared (fill) order.
    pub fn standard() -> Self {
        let region = |part, landmarks, color| PartRegion { part, landmarks, color: Rgb(color) };
        Self {
            regions: vec![
                region(FacePart::Jaw, 0..17, [128, 128, 128]),
                region(FacePart::LeftEyebrow, 17..22, [255, 0, 255]),
                region(FacePart::RightEyebrow, 22..27, [0, 255, 255]),
                region(FacePart::Nose, 27..36, [0, 0, 255]),
                region(FacePart::LeftEye, 36..42, [255, 0, 0]),
                region(FacePart::RightEye, 42..48, [0, 255, 0]),
                region(FacePart::Mouth, 48..68, [255, 255, 0]),
            ],
        }
    }

    pub fn regions(&self) -> &[PartRegion] {
        &self.regions
    }

    pub fn get(&self, part: FacePart) -> Option<&PartRegion> {
        self.regions.iter().find(|r| r.part == part)
    }
}

impl Default for PartTable {
    fn default() -> Self {
        Self::standard()
    }
}
