//! Seam between the annotator and the needle segmentation model.
//!
//! The model itself lives outside this crate. Anything that can turn an image
//! into per-instance needle masks implements [`Segmenter`]; the annotator only
//! sees the masks, boxes and confidences it returns.

use std::path::PathBuf;

use image::RgbImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{NeedleError, Result};
use crate::mask::NeedleMask;

/// Detection thresholds handed to the model on every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationThresholds {
    /// Minimum instance confidence.
    pub confidence: f32,
    /// Overlap above which the weaker of two boxes is suppressed.
    pub iou: f32,
}

impl Default for SegmentationThresholds {
    fn default() -> Self {
        Self {
            confidence: 0.65,
            iou: 0.5,
        }
    }
}

/// Axis-aligned box in pixel coordinates, `(x1, y1)` top-left and `(x2, y2)`
/// bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union; 0.0 when neither box has area.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Tight box around the needle pixels of `mask`, spanning whole pixels.
    /// A zero box for an empty mask.
    pub fn enclosing(mask: &NeedleMask) -> Self {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for (row, col) in mask.needle_pixels() {
            bounds = Some(match bounds {
                None => (col, row, col, row),
                Some((min_c, min_r, max_c, max_r)) => {
                    (min_c.min(col), min_r.min(row), max_c.max(col), max_r.max(row))
                }
            });
        }

        match bounds {
            Some((min_c, min_r, max_c, max_r)) => Self::new(
                min_c as f32,
                min_r as f32,
                (max_c + 1) as f32,
                (max_r + 1) as f32,
            ),
            None => Self::default(),
        }
    }
}

/// One needle found by the model.
#[derive(Debug, Clone)]
pub struct SegmentedInstance {
    /// Probability mask, at whatever resolution the model produced.
    pub mask: NeedleMask,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

/// A loaded needle segmentation model.
///
/// Implementations are created and loaded by the caller once and then reused
/// across images. The annotator refuses to run against a handle that reports
/// `is_ready() == false`.
pub trait Segmenter: Send + Sync {
    /// Whether the model is loaded and can serve requests.
    fn is_ready(&self) -> bool {
        true
    }

    /// Detect needle instances in `image`. An empty vector means nothing was
    /// found and is not an error.
    fn segment(
        &self,
        image: &RgbImage,
        thresholds: &SegmentationThresholds,
    ) -> Result<Vec<SegmentedInstance>>;
}

/// Confidence filtering followed by greedy non-maximum suppression.
///
/// Survivors are returned highest confidence first.
pub fn suppress_overlapping(
    mut instances: Vec<SegmentedInstance>,
    thresholds: &SegmentationThresholds,
) -> Vec<SegmentedInstance> {
    instances.retain(|inst| inst.confidence >= thresholds.confidence);
    instances.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<SegmentedInstance> = Vec::with_capacity(instances.len());
    for candidate in instances {
        let overlaps = keep
            .iter()
            .any(|kept| kept.bbox.iou(&candidate.bbox) > thresholds.iou);
        if overlaps {
            debug!(
                "Suppressing instance with confidence {:.3} (box {:?})",
                candidate.confidence, candidate.bbox
            );
        } else {
            keep.push(candidate);
        }
    }
    keep
}

/// Segmenter serving masks that were produced ahead of time and stored as
/// grayscale images, one file per instance.
///
/// Starts unloaded; [`PrecomputedSegmenter::load`] reads the files. Each mask
/// gets confidence 1.0 and a box fitted to its needle pixels, and the usual
/// confidence/overlap filtering applies on every call.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedSegmenter {
    mask_paths: Vec<PathBuf>,
    instances: Option<Vec<SegmentedInstance>>,
}

impl PrecomputedSegmenter {
    pub fn new(mask_paths: Vec<PathBuf>) -> Self {
        Self {
            mask_paths,
            instances: None,
        }
    }

    /// Already-decoded instances, ready immediately.
    pub fn from_instances(instances: Vec<SegmentedInstance>) -> Self {
        Self {
            mask_paths: Vec::new(),
            instances: Some(instances),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        let mut instances = Vec::with_capacity(self.mask_paths.len());
        for path in &self.mask_paths {
            let gray = image::open(path)?.to_luma8();
            let mask = NeedleMask::from_gray_image(&gray);
            debug!(
                "Loaded mask {} ({}, {} needle pixels)",
                path.display(),
                mask.size(),
                mask.needle_pixel_count()
            );
            instances.push(SegmentedInstance {
                bbox: BoundingBox::enclosing(&mask),
                mask,
                confidence: 1.0,
            });
        }
        info!("Loaded {} precomputed needle masks", instances.len());
        self.instances = Some(instances);
        Ok(())
    }
}

impl Segmenter for PrecomputedSegmenter {
    fn is_ready(&self) -> bool {
        self.instances.is_some()
    }

    fn segment(
        &self,
        _image: &RgbImage,
        thresholds: &SegmentationThresholds,
    ) -> Result<Vec<SegmentedInstance>> {
        let instances = self.instances.as_ref().ok_or(NeedleError::ModelNotLoaded)?;
        Ok(suppress_overlapping(instances.clone(), thresholds))
    }
}
