//! lidline-core: facial part masks and double-eyelid curve synthesis.
//!
//! Landmarks come from a [`LandmarkSource`]; the bundled implementation runs
//! SCRFD face detection and a 68-point landmark regressor via ONNX Runtime.

pub mod detector;
pub mod eyelid;
pub mod landmarker;
pub mod mask;
pub mod parts;
pub mod record;
pub mod source;
pub mod types;

pub use eyelid::{synthesize, EyelidConfig};
pub use mask::{extract_part_mask, generate_composite_mask, generate_part_masks};
pub use parts::{FacePart, PartRegion, PartTable};
pub use record::EyelidRecord;
pub use source::{LandmarkSource, OnnxLandmarkSource, SourceError};
pub use types::{EyelidCurve, FaceRegion, LandmarkSet};
