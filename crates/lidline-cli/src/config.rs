use anyhow::{Context, Result};
use lidline_core::EyelidConfig;
use std::path::{Path, PathBuf};

/// Model configuration, loaded from environment variables.
pub struct Config {
    /// Directory containing ONNX model files (default: ./models).
    pub model_dir: PathBuf,
    /// SCRFD detector file name inside `model_dir`.
    pub detector_model: String,
    /// 68-point landmark model file name inside `model_dir`.
    pub landmark_model: String,
    /// Minimum SCRFD score for a face candidate.
    pub confidence_threshold: f32,
}

impl Config {
    /// Load configuration from `LIDLINE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            model_dir: std::env::var("LIDLINE_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models")),
            detector_model: std::env::var("LIDLINE_DETECTOR_MODEL")
                .unwrap_or_else(|_| "det_10g.onnx".to_string()),
            landmark_model: std::env::var("LIDLINE_LANDMARK_MODEL")
                .unwrap_or_else(|_| "1k3d68.onnx".to_string()),
            confidence_threshold: env_f32(
                "LIDLINE_CONFIDENCE_THRESHOLD",
                lidline_core::detector::SCRFD_DEFAULT_CONFIDENCE,
            ),
        }
    }

    pub fn detector_model_path(&self) -> PathBuf {
        self.model_dir.join(&self.detector_model)
    }

    pub fn landmark_model_path(&self) -> PathBuf {
        self.model_dir.join(&self.landmark_model)
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read an eyelid style TOML file; missing keys keep their defaults.
pub fn load_style(path: &Path) -> Result<EyelidConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading style file {}", path.display()))?;
    parse_style(&text).with_context(|| format!("parsing style file {}", path.display()))
}

fn parse_style(text: &str) -> Result<EyelidConfig> {
    Ok(toml::from_str(text)?)
}

/// Parse `R,G,B` into a color triplet.
pub fn parse_color(s: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let &[r, g, b] = parts.as_slice() else {
        return Err(format!("expected R,G,B, got {s:?}"));
    };
    let channel = |v: &str| v.parse::<u8>().map_err(|e| format!("bad channel {v:?}: {e}"));
    Ok([channel(r)?, channel(g)?, channel(b)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_paths() {
        let cfg = Config {
            model_dir: PathBuf::from("/opt/models"),
            detector_model: "det.onnx".into(),
            landmark_model: "lmk.onnx".into(),
            confidence_threshold: 0.5,
        };
        assert_eq!(cfg.detector_model_path(), PathBuf::from("/opt/models/det.onnx"));
        assert_eq!(cfg.landmark_model_path(), PathBuf::from("/opt/models/lmk.onnx"));
    }

    #[test]
    fn test_env_f32_default_when_unset() {
        assert_eq!(env_f32("LIDLINE_TEST_UNSET_VARIABLE", 0.25), 0.25);
    }

    #[test]
    fn test_partial_style_keeps_defaults() {
        let style = parse_style("num_lines = 3\ncolor = [255, 0, 0]\n").unwrap();
        assert_eq!(style.num_lines, 3);
        assert_eq!(style.color, [255, 0, 0]);
        assert_eq!(style.eyelid_offset, -20);
        assert_eq!(style.line_spacing, 5);
    }

    #[test]
    fn test_empty_style_is_default() {
        assert_eq!(parse_style("").unwrap(), EyelidConfig::default());
    }

    #[test]
    fn test_style_rejects_wrong_types() {
        assert!(parse_style("num_lines = \"two\"").is_err());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("0, 128,255"), Ok([0, 128, 255]));
        assert!(parse_color("1,2").is_err());
        assert!(parse_color("1,2,300").is_err());
    }
}
