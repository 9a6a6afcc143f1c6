//! Needle localisation and highlighting for analog gauge photographs.
//!
//! A segmentation model (external, see [`segmentation::Segmenter`]) finds the
//! needle as one mask per instance. This crate turns each mask into a tip and
//! base point relative to the gauge center and draws highlights over the
//! photograph so a downstream reader can tell where the needle points.
//!
//! ```no_run
//! use needle::{AnnotatorConfig, NeedleAnnotator, PrecomputedSegmenter};
//!
//! # fn main() -> needle::Result<()> {
//! let mut model = PrecomputedSegmenter::new(vec!["needle_mask.png".into()]);
//! model.load()?;
//!
//! let annotator = NeedleAnnotator::new(AnnotatorConfig::default())?;
//! let image = image::open("gauge.jpg")?.to_rgb8();
//! let (annotated, status) = annotator.process_image(&image, &model)?;
//! println!("{status}");
//! annotated.save("gauge_annotated.png")?;
//! # Ok(())
//! # }
//! ```

pub mod annotator;
pub mod config;
pub mod error;
pub mod geometry;
pub mod image_size;
pub mod mask;
pub mod overlay;
pub mod segmentation;

pub use annotator::{
    AnnotationReport, AnnotationStatus, InstancePolicy, InstanceReport, NeedleAnnotator,
    RenderMode,
};
pub use config::{AnnotatorConfig, Palette};
pub use error::{NeedleError, Result};
pub use geometry::{detect_needle_tip, NeedleGeometry, Point};
pub use image_size::ImageSize;
pub use mask::{NeedleMask, MASK_THRESHOLD};
pub use overlay::overlay;
pub use segmentation::{
    BoundingBox, PrecomputedSegmenter, SegmentationThresholds, SegmentedInstance, Segmenter,
};
