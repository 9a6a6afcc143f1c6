//! Annotator configuration: thresholds, rendering choices and colours.
//!
//! Configuration is plain data. It can be built in code, read from a JSON
//! file (missing fields fall back to defaults) and adjusted from the process
//! environment:
//!
//! - `CONF_THRESHOLD` overrides the segmentation confidence threshold
//! - `IOU_THRESHOLD` overrides the segmentation IoU threshold

use std::path::Path;

use image::Rgb;
use log::info;
use serde::{Deserialize, Serialize};

use crate::annotator::{InstancePolicy, RenderMode};
use crate::error::{NeedleError, Result};
use crate::segmentation::SegmentationThresholds;

pub const CONF_THRESHOLD_ENV: &str = "CONF_THRESHOLD";
pub const IOU_THRESHOLD_ENV: &str = "IOU_THRESHOLD";

/// Named RGB colours used by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Translucent needle highlight.
    pub overlay_color: [u8; 3],
    /// Directional arrow body.
    pub arrow_fill: [u8; 3],
    /// Directional arrow outline, a darker shade of `arrow_fill`.
    pub arrow_stroke: [u8; 3],
    /// Solid tip marker.
    pub marker_color: [u8; 3],
    /// Gradient colour at the needle base.
    pub gradient_dark: [u8; 3],
    /// Gradient colour at the needle tip.
    pub gradient_bright: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            overlay_color: [200, 0, 0],
            arrow_fill: [255, 255, 0],
            arrow_stroke: [200, 200, 0],
            marker_color: [255, 0, 0],
            gradient_dark: [100, 0, 0],
            gradient_bright: [255, 255, 0],
        }
    }
}

impl Palette {
    pub fn overlay(&self) -> Rgb<u8> {
        Rgb(self.overlay_color)
    }

    pub fn arrow_fill(&self) -> Rgb<u8> {
        Rgb(self.arrow_fill)
    }

    pub fn arrow_stroke(&self) -> Rgb<u8> {
        Rgb(self.arrow_stroke)
    }

    pub fn marker(&self) -> Rgb<u8> {
        Rgb(self.marker_color)
    }

    pub fn gradient_dark(&self) -> Rgb<u8> {
        Rgb(self.gradient_dark)
    }

    pub fn gradient_bright(&self) -> Rgb<u8> {
        Rgb(self.gradient_bright)
    }
}

/// Everything the annotator needs besides the image and the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    pub thresholds: SegmentationThresholds,
    /// Opacity of the needle highlight.
    pub overlay_alpha: f64,
    pub render_mode: RenderMode,
    pub instance_policy: InstancePolicy,
    pub palette: Palette,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            thresholds: SegmentationThresholds::default(),
            overlay_alpha: 0.5,
            render_mode: RenderMode::default(),
            instance_policy: InstancePolicy::default(),
            palette: Palette::default(),
        }
    }
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(NeedleError::Config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

fn parse_threshold(name: &str, raw: &str) -> Result<f32> {
    raw.trim()
        .parse::<f32>()
        .map_err(|e| NeedleError::Config(format!("{name}={raw:?} is not a number: {e}")))
}

impl AnnotatorConfig {
    /// Read a JSON config file. Absent fields take their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        info!("Loaded annotator config from {}", path.display());
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Apply `CONF_THRESHOLD` / `IOU_THRESHOLD` from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply threshold overrides from any key/value source.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(CONF_THRESHOLD_ENV) {
            self.thresholds.confidence = parse_threshold(CONF_THRESHOLD_ENV, &raw)?;
        }
        if let Some(raw) = lookup(IOU_THRESHOLD_ENV) {
            self.thresholds.iou = parse_threshold(IOU_THRESHOLD_ENV, &raw)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        check_unit_interval("confidence threshold", self.thresholds.confidence as f64)?;
        check_unit_interval("IoU threshold", self.thresholds.iou as f64)?;
        check_unit_interval("overlay alpha", self.overlay_alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AnnotatorConfig::default();
        assert_eq!(config.thresholds.confidence, 0.65);
        assert_eq!(config.thresholds.iou, 0.5);
        assert_eq!(config.overlay_alpha, 0.5);
        assert_eq!(config.render_mode, RenderMode::OverlayMarker);
        assert_eq!(config.instance_policy, InstancePolicy::AbortOnUndetectable);
        assert_eq!(config.palette.overlay(), Rgb([200, 0, 0]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "thresholds": { "confidence": 0.4 },
            "render_mode": "gradient_arrow",
            "palette": { "marker_color": [0, 255, 0] }
        }"#;
        let config: AnnotatorConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.thresholds.confidence, 0.4);
        assert_eq!(config.thresholds.iou, 0.5);
        assert_eq!(config.render_mode, RenderMode::GradientArrow);
        assert_eq!(config.palette.marker(), Rgb([0, 255, 0]));
        assert_eq!(config.palette.arrow_fill(), Rgb([255, 255, 0]));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("annotator.json");

        let mut config = AnnotatorConfig::default();
        config.overlay_alpha = 0.3;
        config.instance_policy = InstancePolicy::SkipUndetectable;
        config.save_to_file(&path).unwrap();

        let loaded = AnnotatorConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "overlay_alpha": 2.0 }"#).unwrap();

        assert!(matches!(
            AnnotatorConfig::load_from_file(&path),
            Err(NeedleError::Config(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [("CONF_THRESHOLD", "0.25"), ("IOU_THRESHOLD", " 0.7 ")]
            .into_iter()
            .collect();
        let mut config = AnnotatorConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.thresholds.confidence, 0.25);
        assert_eq!(config.thresholds.iou, 0.7);
    }

    #[test]
    fn test_bad_override_rejected() {
        let mut config = AnnotatorConfig::default();
        let result = config.apply_overrides(|key| {
            (key == CONF_THRESHOLD_ENV).then(|| "high".to_string())
        });
        assert!(matches!(result, Err(NeedleError::Config(_))));

        let result = config.apply_overrides(|key| {
            (key == IOU_THRESHOLD_ENV).then(|| "1.5".to_string())
        });
        assert!(matches!(result, Err(NeedleError::Config(_))));
    }
}
