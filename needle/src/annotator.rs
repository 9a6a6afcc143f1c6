//! Per-image annotation flow: segment, localise each needle, render highlights.

use std::fmt;

use clap::ValueEnum;
use image::RgbImage;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::AnnotatorConfig;
use crate::error::{NeedleError, Result};
use crate::geometry::{
    apply_gradient, detect_needle_tip, draw_arrow, draw_tip_marker, NeedleGeometry, Point,
};
use crate::image_size::ImageSize;
use crate::mask::NeedleMask;
use crate::overlay::overlay;
use crate::segmentation::{BoundingBox, Segmenter};

/// How a needle with a detected tip is drawn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Translucent highlight plus a small solid marker at the tip.
    #[default]
    OverlayMarker,
    /// Translucent highlight plus an outlined arrow beyond the tip.
    OverlayArrow,
    /// Base-to-tip colour ramp replacing the needle pixels, plus the arrow.
    GradientArrow,
}

/// What to do when an instance's mask has no needle pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstancePolicy {
    /// Stop at the first such instance; later instances are not drawn.
    #[default]
    AbortOnUndetectable,
    /// Highlight it, keep going, and report the first one at the end.
    SkipUndetectable,
}

/// Outcome of one annotation call.
///
/// `Display` gives the human-readable status line forwarded alongside the
/// image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnotationStatus {
    Success,
    NoNeedleDetected,
    /// 1-based index of the instance whose tip could not be located.
    TipUndetectable { instance: usize },
}

impl AnnotationStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, AnnotationStatus::Success)
    }
}

impl fmt::Display for AnnotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationStatus::Success => write!(f, "success"),
            AnnotationStatus::NoNeedleDetected => write!(f, "no needle detected"),
            AnnotationStatus::TipUndetectable { instance } => {
                write!(f, "tip undetectable for instance {instance}")
            }
        }
    }
}

/// What happened to a single instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceReport {
    /// 1-based position in the model's output.
    pub index: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
    /// `None` when the resized mask was empty.
    pub geometry: Option<NeedleGeometry>,
}

/// Status plus the per-instance details behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationReport {
    pub status: AnnotationStatus,
    pub image_size: ImageSize,
    /// Assumed gauge center.
    pub center: Point,
    /// Instances that were processed, in order. Instances after an abort are absent.
    pub instances: Vec<InstanceReport>,
}

/// Highlights gauge needles found by a segmentation model.
///
/// Holds configuration only; the model handle is passed to each call so the
/// caller decides how it is loaded, cached and shared.
#[derive(Debug, Clone, Default)]
pub struct NeedleAnnotator {
    config: AnnotatorConfig,
}

impl NeedleAnnotator {
    pub fn new(config: AnnotatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Annotate `image` and return the result with a status.
    ///
    /// The input is never modified. See [`NeedleAnnotator::process_image_detailed`].
    pub fn process_image<S>(&self, image: &RgbImage, model: &S) -> Result<(RgbImage, AnnotationStatus)>
    where
        S: Segmenter + ?Sized,
    {
        let (annotated, report) = self.process_image_detailed(image, model)?;
        Ok((annotated, report.status))
    }

    /// Annotate `image`, returning the result and a per-instance report.
    ///
    /// The gauge center is taken to be the image center. Each instance mask
    /// is resized to the image, its tip and base located, and the needle
    /// rendered per the configured [`RenderMode`]. An instance with an empty
    /// mask is still highlighted; under [`InstancePolicy::AbortOnUndetectable`]
    /// the remaining instances are then left undrawn.
    ///
    /// Fails with [`NeedleError::ModelNotLoaded`] if `model` is not ready.
    pub fn process_image_detailed<S>(
        &self,
        image: &RgbImage,
        model: &S,
    ) -> Result<(RgbImage, AnnotationReport)>
    where
        S: Segmenter + ?Sized,
    {
        if !model.is_ready() {
            return Err(NeedleError::ModelNotLoaded);
        }

        let size = ImageSize::of_image(image);
        let center = Point::from(size.center());
        let mut report = AnnotationReport {
            status: AnnotationStatus::Success,
            image_size: size,
            center,
            instances: Vec::new(),
        };

        let instances = model.segment(image, &self.config.thresholds)?;
        info!("Segmentation returned {} instance(s) for {} image", instances.len(), size);

        let mut output = image.clone();
        if instances.is_empty() {
            report.status = AnnotationStatus::NoNeedleDetected;
            return Ok((output, report));
        }

        let mut first_undetectable: Option<usize> = None;

        for (i, instance) in instances.iter().enumerate() {
            let index = i + 1;
            let mask = instance.mask.resized(size);
            let geometry = detect_needle_tip(&mask, center);

            report.instances.push(InstanceReport {
                index,
                confidence: instance.confidence,
                bbox: instance.bbox,
                geometry,
            });

            match geometry {
                Some(geometry) => {
                    debug!(
                        "Instance {index}: tip ({}, {}), base ({}, {})",
                        geometry.tip.x, geometry.tip.y, geometry.base.x, geometry.base.y
                    );
                    output = self.render_needle(&output, &mask, center, geometry)?;
                }
                None => {
                    warn!("Instance {index}: no needle pixels above threshold, tip undetectable");
                    output = self.highlight(&output, &mask)?;

                    match self.config.instance_policy {
                        InstancePolicy::AbortOnUndetectable => {
                            report.status = AnnotationStatus::TipUndetectable { instance: index };
                            return Ok((output, report));
                        }
                        InstancePolicy::SkipUndetectable => {
                            first_undetectable.get_or_insert(index);
                        }
                    }
                }
            }
        }

        if let Some(instance) = first_undetectable {
            report.status = AnnotationStatus::TipUndetectable { instance };
        }
        Ok((output, report))
    }

    fn highlight(&self, image: &RgbImage, mask: &NeedleMask) -> Result<RgbImage> {
        overlay(
            image,
            mask,
            self.config.palette.overlay(),
            self.config.overlay_alpha,
            None,
        )
    }

    fn render_needle(
        &self,
        image: &RgbImage,
        mask: &NeedleMask,
        center: Point,
        geometry: NeedleGeometry,
    ) -> Result<RgbImage> {
        let palette = &self.config.palette;
        let rendered = match self.config.render_mode {
            RenderMode::OverlayMarker => {
                let highlighted = self.highlight(image, mask)?;
                draw_tip_marker(&highlighted, center, geometry.tip, palette.marker())
            }
            RenderMode::OverlayArrow => {
                let highlighted = self.highlight(image, mask)?;
                draw_arrow(
                    &highlighted,
                    center,
                    geometry.tip,
                    palette.arrow_fill(),
                    palette.arrow_stroke(),
                )
            }
            RenderMode::GradientArrow => {
                let ramped = apply_gradient(
                    image,
                    mask,
                    geometry.base,
                    geometry.tip,
                    palette.gradient_dark(),
                    palette.gradient_bright(),
                )?;
                draw_arrow(
                    &ramped,
                    center,
                    geometry.tip,
                    palette.arrow_fill(),
                    palette.arrow_stroke(),
                )
            }
        };
        Ok(rendered)
    }
}
