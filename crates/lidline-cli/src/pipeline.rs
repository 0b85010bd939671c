//! Batch drivers for both stages.
//!
//! Stage 1 (`generate_masks`) turns each face image into seven part masks.
//! Stage 2 (`draw_eyelids`) reads back the eye masks, draws eyelid curves onto
//! a copy of each face and accumulates the curve geometry into one record.
//! Per-image failures are logged and skipped; only setup errors and a missing
//! model abort the batch.

use anyhow::{Context, Result};
use image::{GrayImage, RgbImage};
use lidline_core::{
    generate_part_masks, synthesize, EyelidConfig, EyelidRecord, FacePart, LandmarkSource, PartTable,
    SourceError,
};
use std::fs;
use std::path::{Path, PathBuf};

pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Per-batch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    /// Individual output files that failed to persist.
    pub write_failures: usize,
}

enum MaskOutcome {
    Written { write_failures: usize },
    NoFace,
}

/// Image files directly inside `dir`, sorted by file name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading image directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();
    images.sort();
    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

/// File name without its extension.
fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `<root>/<part>/<base>_<part>.png`
pub fn mask_path(root: &Path, part: FacePart, base: &str) -> PathBuf {
    root.join(part.name()).join(format!("{base}_{part}.png"))
}

/// Stage 1: write per-part masks for every image in `input_dir`.
pub fn generate_masks<S: LandmarkSource>(
    source: &mut S,
    table: &PartTable,
    input_dir: &Path,
    output_root: &Path,
) -> Result<BatchSummary> {
    for region in table.regions() {
        let dir = output_root.join(region.part.name());
        fs::create_dir_all(&dir).with_context(|| format!("creating mask directory {}", dir.display()))?;
    }

    let images = list_images(input_dir)?;
    tracing::info!(count = images.len(), dir = %input_dir.display(), "generating part masks");

    let mut summary = BatchSummary { total: images.len(), ..BatchSummary::default() };

    for path in &images {
        match mask_image(source, table, path, output_root) {
            Ok(MaskOutcome::Written { write_failures }) => {
                summary.processed += 1;
                summary.write_failures += write_failures;
                tracing::debug!(path = %path.display(), "masks written");
            }
            Ok(MaskOutcome::NoFace) => {
                summary.skipped += 1;
                tracing::warn!(path = %path.display(), "no face detected, skipping");
            }
            Err(e) => {
                if e.downcast_ref::<SourceError>().is_some_and(SourceError::is_missing_model) {
                    return Err(e);
                }
                summary.skipped += 1;
                tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "skipping image");
            }
        }
    }

    tracing::info!(?summary, "part mask generation complete");
    Ok(summary)
}

fn mask_image<S: LandmarkSource>(
    source: &mut S,
    table: &PartTable,
    path: &Path,
    output_root: &Path,
) -> Result<MaskOutcome> {
    let image = image::open(path).with_context(|| format!("decoding {}", path.display()))?;
    let gray = image.to_luma8();

    let faces = source.detect_faces(&gray)?;
    // Multiple faces: only the best candidate is used.
    let Some(face) = faces.first() else {
        return Ok(MaskOutcome::NoFace);
    };
    let landmarks = source.predict_landmarks(&gray, face)?;

    let base = base_name(path);
    let mut write_failures = 0;
    for (part, mask) in generate_part_masks(image.width(), image.height(), &landmarks, table) {
        let out = mask_path(output_root, part, &base);
        if let Err(e) = mask.save(&out) {
            write_failures += 1;
            tracing::warn!(path = %out.display(), error = %e, "failed to write mask");
        }
    }

    Ok(MaskOutcome::Written { write_failures })
}

/// Stage 2: draw eyelid curves for every image whose eye masks exist.
///
/// Overlays go to `overlay_dir` under the original file name. The returned
/// record has one entry per processed image on both sides.
pub fn draw_eyelids(
    input_dir: &Path,
    mask_root: &Path,
    overlay_dir: &Path,
    config: &EyelidConfig,
) -> Result<(BatchSummary, EyelidRecord)> {
    fs::create_dir_all(overlay_dir)
        .with_context(|| format!("creating overlay directory {}", overlay_dir.display()))?;

    let images = list_images(input_dir)?;
    tracing::info!(count = images.len(), dir = %input_dir.display(), "drawing eyelid lines");

    let mut summary = BatchSummary { total: images.len(), ..BatchSummary::default() };
    let mut record = EyelidRecord::new();

    for path in &images {
        let loaded = load_face_and_masks(path, mask_root);
        let (mut face, left_mask, right_mask) = match loaded {
            Ok(inputs) => inputs,
            Err(e) => {
                summary.skipped += 1;
                tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "skipping image");
                continue;
            }
        };

        let left = synthesize(&mut face, &left_mask, config);
        let right = synthesize(&mut face, &right_mask, config);
        tracing::debug!(path = %path.display(), left = left.len(), right = right.len(), "eyelid curves drawn");
        record.push(left, right);
        summary.processed += 1;

        let Some(file_name) = path.file_name() else {
            continue;
        };
        let out = overlay_dir.join(file_name);
        if let Err(e) = face.save(&out) {
            summary.write_failures += 1;
            tracing::warn!(path = %out.display(), error = %e, "failed to write overlay");
        }
    }

    tracing::info!(?summary, "eyelid drawing complete");
    Ok((summary, record))
}

fn load_face_and_masks(path: &Path, mask_root: &Path) -> Result<(RgbImage, GrayImage, GrayImage)> {
    let base = base_name(path);
    let load_mask = |part: FacePart| -> Result<GrayImage> {
        let mask_file = mask_path(mask_root, part, &base);
        let mask = image::open(&mask_file).with_context(|| format!("loading {part} mask {}", mask_file.display()))?;
        Ok(mask.to_luma8())
    };

    let face = image::open(path).with_context(|| format!("decoding {}", path.display()))?;
    Ok((face.to_rgb8(), load_mask(FacePart::LeftEye)?, load_mask(FacePart::RightEye)?))
}
