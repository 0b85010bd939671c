//! Landmark polygons to composite and per-part binary masks.
//!
//! Every part polygon is filled onto one shared RGB canvas in table order, so
//! overlapping polygons resolve last-drawn-wins. Part masks are then recovered
//! by exact color match against that canvas.

use crate::parts::{FacePart, PartRegion, PartTable, BACKGROUND};
use crate::types::LandmarkSet;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

const MASK_ON: Luma<u8> = Luma([255]);
const MASK_OFF: Luma<u8> = Luma([0]);

/// Fill every part polygon onto a black canvas of the given size.
pub fn generate_composite_mask(
    width: u32,
    height: u32,
    landmarks: &LandmarkSet,
    table: &PartTable,
) -> RgbImage {
    let mut composite = RgbImage::from_pixel(width, height, BACKGROUND);

    for region in table.regions() {
        let polygon = part_polygon(landmarks, region);
        fill_polygon(&mut composite, &polygon, region.color);
    }

    composite
}

/// Binary mask of the pixels exactly equal to `color` (255 on, 0 off).
pub fn extract_part_mask(composite: &RgbImage, color: Rgb<u8>) -> GrayImage {
    GrayImage::from_fn(composite.width(), composite.height(), |x, y| {
        if *composite.get_pixel(x, y) == color {
            MASK_ON
        } else {
            MASK_OFF
        }
    })
}

/// Composite mask followed by one extraction per part, in table order.
pub fn generate_part_masks(
    width: u32,
    height: u32,
    landmarks: &LandmarkSet,
    table: &PartTable,
) -> Vec<(FacePart, GrayImage)> {
    let composite = generate_composite_mask(width, height, landmarks, table);
    table
        .regions()
        .iter()
        .map(|region| (region.part, extract_part_mask(&composite, region.color)))
        .collect()
}

/// Ordered polygon vertices for one part.
fn part_polygon(landmarks: &LandmarkSet, region: &PartRegion) -> Vec<Point<i32>> {
    let mut polygon: Vec<Point<i32>> = region
        .landmarks
        .clone()
        .map(|idx| {
            let (x, y) = landmarks.point(idx);
            Point::new(x, y)
        })
        .collect();

    // The rasterizer closes the polygon itself and rejects an explicit closing vertex.
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }

    polygon
}

fn fill_polygon(canvas: &mut RgbImage, polygon: &[Point<i32>], color: Rgb<u8>) {
    match polygon {
        [] => {}
        [p] => {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < canvas.width() && (p.y as u32) < canvas.height() {
                canvas.put_pixel(p.x as u32, p.y as u32, color);
            }
        }
        _ => draw_polygon_mut(canvas, polygon, color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::f32::consts::PI;

    const JAW: Rgb<u8> = Rgb([128, 128, 128]);

    fn ellipse_points(cx: f32, cy: f32, rx: f32, ry: f32, n: usize) -> Vec<(i32, i32)> {
        (0..n)
            .map(|j| {
                let t = PI + j as f32 * 2.0 * PI / n as f32;
                ((cx + rx * t.cos()).round() as i32, (cy + ry * t.sin()).round() as i32)
            })
            .collect()
    }

    /// A frontal face on a 200x200 canvas: jaw is the lower half-disc of
    /// radius 80 around (100,100); eyebrows, eyes sit above it; nose and mouth
    /// overlap it.
    fn synthetic_face() -> LandmarkSet {
        let mut pts = Vec::with_capacity(68);
        for i in 0..17 {
            let t = PI - i as f32 * PI / 16.0;
            pts.push(((100.0 + 80.0 * t.cos()).round() as i32, (100.0 + 80.0 * t.sin()).round() as i32));
        }
        for base in [40, 120] {
            for (k, dy) in [50, 45, 43, 45, 50].into_iter().enumerate() {
                pts.push((base + 10 * k as i32, dy));
            }
        }
        pts.extend([(100, 60), (100, 72), (100, 84), (100, 96)]);
        pts.extend([(88, 112), (94, 115), (100, 116), (106, 115), (112, 112)]);
        for cx in [60, 140] {
            pts.extend([(cx - 12, 75), (cx - 6, 70), (cx + 6, 70), (cx + 12, 75), (cx + 6, 80), (cx - 6, 80)]);
        }
        pts.extend(ellipse_points(100.0, 145.0, 24.0, 10.0, 12));
        pts.extend(ellipse_points(100.0, 145.0, 14.0, 4.0, 8));
        LandmarkSet::from_points(&pts).unwrap()
    }

    fn color_of(table: &PartTable, part: FacePart) -> Rgb<u8> {
        table.get(part).unwrap().color
    }

    #[test]
    fn test_composite_matches_source_dimensions() {
        let composite = generate_composite_mask(200, 150, &synthetic_face(), &PartTable::standard());
        assert_eq!(composite.dimensions(), (200, 150));
    }

    #[test]
    fn test_composite_assigns_part_colors() {
        let table = PartTable::standard();
        let composite = generate_composite_mask(200, 200, &synthetic_face(), &table);

        let expect = [
            ((60, 48), FacePart::LeftEyebrow),
            ((140, 48), FacePart::RightEyebrow),
            ((60, 75), FacePart::LeftEye),
            ((140, 75), FacePart::RightEye),
            ((104, 105), FacePart::Nose),
            ((100, 138), FacePart::Mouth),
            ((100, 152), FacePart::Mouth),
            ((40, 130), FacePart::Jaw),
            ((160, 130), FacePart::Jaw),
        ];
        for ((x, y), part) in expect {
            assert_eq!(*composite.get_pixel(x, y), color_of(&table, part), "pixel ({x}, {y}) should be {part}");
        }
        assert_eq!(*composite.get_pixel(5, 5), BACKGROUND);
        assert_eq!(*composite.get_pixel(100, 190), BACKGROUND);
    }

    #[test]
    fn test_no_color_bleeds_into_jaw() {
        let table = PartTable::standard();
        let composite = generate_composite_mask(200, 200, &synthetic_face(), &table);
        assert_eq!(color_of(&table, FacePart::Jaw), JAW);

        let in_nose = |x: u32, y: u32| (86..=114).contains(&x) && (58..=118).contains(&y);
        let in_mouth = |x: u32, y: u32| (74..=126).contains(&x) && (133..=157).contains(&y);

        for y in 103..=178u32 {
            for x in 0..200u32 {
                let (dx, dy) = (x as f32 - 100.0, y as f32 - 100.0);
                if dx * dx + dy * dy >= 76.0 * 76.0 || in_nose(x, y) || in_mouth(x, y) {
                    continue;
                }
                assert_eq!(*composite.get_pixel(x, y), JAW, "jaw pixel ({x}, {y}) overwritten");
            }
        }
    }

    #[test]
    fn test_part_masks_are_binary_and_disjoint() {
        let table = PartTable::standard();
        let landmarks = synthetic_face();
        let composite = generate_composite_mask(200, 200, &landmarks, &table);
        let masks = generate_part_masks(200, 200, &landmarks, &table);
        assert_eq!(masks.len(), 7);

        let classes: HashSet<[u8; 3]> = composite.pixels().map(|p| p.0).collect();
        assert!(classes.len() <= 8, "{} pixel classes", classes.len());

        let mut total_on = 0usize;
        for (i, (x, y, _)) in composite.enumerate_pixels().enumerate() {
            let on: usize = masks
                .iter()
                .map(|(_, mask)| {
                    let v = mask.get_pixel(x, y).0[0];
                    assert!(v == 0 || v == 255, "non-binary value {v}");
                    usize::from(v == 255)
                })
                .sum();
            assert!(on <= 1, "pixel #{i} claimed by {on} parts");
            total_on += on;
        }

        let non_background = composite.pixels().filter(|p| **p != BACKGROUND).count();
        assert!(total_on <= non_background);
        assert!(total_on > 0);
    }

    #[test]
    fn test_mask_generation_is_idempotent() {
        let table = PartTable::standard();
        let landmarks = synthetic_face();
        let first = generate_part_masks(200, 200, &landmarks, &table);
        let second = generate_part_masks(200, 200, &landmarks, &table);
        for ((pa, a), (pb, b)) in first.iter().zip(second.iter()) {
            assert_eq!(pa, pb);
            assert_eq!(a.as_raw(), b.as_raw(), "{pa} mask differs between runs");
        }
    }

    #[test]
    fn test_later_parts_overwrite_earlier() {
        // Every part traces the same square once; mouth is filled last.
        let table = PartTable::standard();
        let mut pts = vec![(0, 0); 68];
        for region in table.regions() {
            let n = region.landmarks.len() as i32;
            let mut outline = vec![(10, 10), (30, 10), (30, 30)];
            outline.extend((1..=n - 3).map(|k| (30 - 20 * k / (n - 3), 30)));
            for (idx, p) in region.landmarks.clone().zip(outline) {
                pts[idx] = p;
            }
        }
        let landmarks = LandmarkSet::from_points(&pts).unwrap();

        let composite = generate_composite_mask(40, 40, &landmarks, &table);
        assert_eq!(*composite.get_pixel(20, 20), color_of(&table, FacePart::Mouth));

        let jaw = extract_part_mask(&composite, color_of(&table, FacePart::Jaw));
        for y in 12..=28 {
            for x in 12..=28 {
                assert_eq!(jaw.get_pixel(x, y).0[0], 0, "jaw survives at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_degenerate_polygon_paints_single_pixel() {
        let pts = vec![(5, 7); 68];
        let landmarks = LandmarkSet::from_points(&pts).unwrap();
        let table = PartTable::standard();
        let composite = generate_composite_mask(10, 10, &landmarks, &table);

        assert_eq!(*composite.get_pixel(5, 7), color_of(&table, FacePart::Mouth));
        assert_eq!(composite.pixels().filter(|p| **p != BACKGROUND).count(), 1);
    }

    #[test]
    fn test_out_of_bounds_landmarks_are_clipped() {
        let pts: Vec<(i32, i32)> = synthetic_face().points().iter().map(|&(x, y)| (x - 120, y - 90)).collect();
        let landmarks = LandmarkSet::from_points(&pts).unwrap();
        let masks = generate_part_masks(100, 100, &landmarks, &PartTable::standard());
        assert!(masks.iter().all(|(_, m)| m.dimensions() == (100, 100)));
    }

    #[test]
    fn test_extract_absent_color_is_empty() {
        let composite = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        let mask = extract_part_mask(&composite, Rgb([3, 2, 1]));
        assert!(mask.pixels().all(|p| p.0[0] == 0));

        let mask = extract_part_mask(&composite, Rgb([1, 2, 3]));
        assert!(mask.pixels().all(|p| p.0[0] == 255));
    }
}
