//! Error types for needle localisation and rendering.

use thiserror::Error;

use crate::image_size::ImageSize;

/// Errors raised by the annotation pipeline.
///
/// Degenerate geometry (an empty mask, a tip sitting on the gauge center) is
/// never reported here; those outcomes are part of the normal result types.
/// The variants below cover contract violations and collaborator failures.
#[derive(Debug, Error)]
pub enum NeedleError {
    /// A mask was paired with an image of a different size.
    #[error("mask size {actual} does not match image size {expected}")]
    DimensionMismatch {
        expected: ImageSize,
        actual: ImageSize,
    },

    /// Blend factor outside `[0, 1]`.
    #[error("alpha {0} is outside [0, 1]")]
    InvalidAlpha(f64),

    /// The segmentation handle has not been loaded yet.
    #[error("segmentation model is not loaded; load it before processing images")]
    ModelNotLoaded,

    /// The segmentation collaborator failed.
    #[error("segmentation failed: {0}")]
    Segmentation(String),

    /// Configuration values are unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NeedleError>;
