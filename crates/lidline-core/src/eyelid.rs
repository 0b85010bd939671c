//! Double-eyelid curve synthesis from a binary eye mask.
//!
//! Each external contour of the mask yields `num_lines` shallow parabolas,
//! spanning the contour horizontally and stacked above its topmost point.
//! Curves are stroked onto the target image and their points returned.

use crate::types::EyelidCurve;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::drawing::draw_antialiased_line_segment_mut;
use imageproc::pixelops::interpolate;
use serde::{Deserialize, Serialize};

const MASK_THRESHOLD: u8 = 127;

/// Styling and placement of synthesized eyelid lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyelidConfig {
    /// Vertical shift of the first curve from the contour's topmost point (negative = up).
    pub eyelid_offset: i32,
    /// Vertical gap between stacked curves.
    pub line_spacing: i32,
    pub num_lines: u32,
    /// Stroke width in pixels.
    pub thickness: u32,
    /// Stroke color, RGB.
    pub color: [u8; 3],
    /// Quadratic coefficient `k` in `y = anchor.y + k * offset^2`.
    pub curvature: f64,
}

impl Default for EyelidConfig {
    fn default() -> Self {
        Self {
            eyelid_offset: -20,
            line_spacing: 5,
            num_lines: 1,
            thickness: 2,
            color: [0, 0, 255],
            curvature: 0.01,
        }
    }
}

/// Extreme points of one contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ContourExtent {
    /// Anchor on the top row: its leftmost boundary point.
    top: (i32, i32),
    left: i32,
    right: i32,
}

/// Draw eyelid curves for every eye region in `eye_mask` onto `image`.
///
/// Returns one curve per (contour, line) pair; an empty mask yields no curves
/// and leaves `image` untouched.
pub fn synthesize(image: &mut RgbImage, eye_mask: &GrayImage, config: &EyelidConfig) -> Vec<EyelidCurve> {
    let binary = binarize(eye_mask);
    let contours = external_contours(&binary);
    tracing::trace!(contours = contours.len(), "eye mask contours");

    let color = Rgb(config.color);
    let mut curves = Vec::new();

    for contour in &contours {
        let Some(extent) = contour_extent(contour) else {
            continue;
        };
        let width = extent.right - extent.left;

        for line_num in 0..config.num_lines {
            let anchor_y = i64::from(extent.top.1) + i64::from(config.eyelid_offset)
                - i64::from(config.line_spacing) * i64::from(line_num);
            // Anchors move monotonically, so every later line is out of range too.
            let Ok(anchor_y) = i32::try_from(anchor_y) else {
                tracing::debug!(line_num, "eyelid anchor outside coordinate range, stopping");
                break;
            };
            let points = curve_points((extent.top.0, anchor_y), width, config.curvature);
            stroke_polyline(image, &points, color, config.thickness);
            curves.push(EyelidCurve { points });
        }
    }

    curves
}

/// Parabola centered on `anchor`, sampled at every integer horizontal offset
/// in `floor(-width/2) ..= floor(width/2)`.
pub fn curve_points(anchor: (i32, i32), width: i32, curvature: f64) -> Vec<(i32, i32)> {
    let half_lo = (-width).div_euclid(2);
    let half_hi = width.div_euclid(2);

    (half_lo..=half_hi)
        .map(|offset| {
            let x = anchor.0 + offset;
            let y = (anchor.1 as f64 + curvature * (offset * offset) as f64) as i32;
            (x, y)
        })
        .collect()
}

fn binarize(mask: &GrayImage) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if mask.get_pixel(x, y).0[0] > MASK_THRESHOLD {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Outermost outer borders only; holes and anything nested inside them are dropped.
fn external_contours(binary: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .collect()
}

fn contour_extent(contour: &Contour<i32>) -> Option<ContourExtent> {
    let points = &contour.points;
    let top_y = points.iter().map(|p| p.y).min()?;
    let left = points.iter().map(|p| p.x).min()?;
    let right = points.iter().map(|p| p.x).max()?;

    let top_x = points.iter().filter(|p| p.y == top_y).map(|p| p.x).min()?;

    Some(ContourExtent {
        top: (top_x, top_y),
        left,
        right,
    })
}

fn stroke_polyline(image: &mut RgbImage, points: &[(i32, i32)], color: Rgb<u8>, thickness: u32) {
    for pair in points.windows(2) {
        stroke_segment(image, pair[0], pair[1], color, thickness);
    }
}

/// Anti-aliased segment widened by parallel copies across its minor axis.
fn stroke_segment(image: &mut RgbImage, start: (i32, i32), end: (i32, i32), color: Rgb<u8>, thickness: u32) {
    let t = thickness.max(1) as i32;
    let lo = -((t - 1) / 2);
    let x_major = (end.0 - start.0).abs() >= (end.1 - start.1).abs();

    for shift in lo..lo + t {
        let (dx, dy) = if x_major { (0, shift) } else { (shift, 0) };
        draw_antialiased_line_segment_mut(
            image,
            (start.0 + dx, start.1 + dy),
            (end.0 + dx, end.1 + dy),
            color,
            interpolate,
        );
    }
}
