//! Shared test infrastructure for the workspace.
//!
//! Provides workspace root discovery, a `test_output/` directory for
//! artifacts worth inspecting by eye (annotated images, reports), and small
//! builders for synthetic needle masks.
//!
//! ```rust
//! use test_helpers::{line_mask, output_path};
//!
//! // 10-pixel diagonal from (40, 40) to (49, 49) in a 100x100 frame
//! let mask = line_mask(100, 100, (40, 40), (49, 49));
//! assert_eq!(mask.iter().filter(|&&v| v > 0.5).count(), 10);
//!
//! let artifact = output_path("annotated.png");
//! assert!(artifact.ends_with("annotated.png"));
//! ```

use ndarray::Array2;
use once_cell::sync::Lazy;
use std::env;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    /// No ancestor of the working directory holds a workspace `Cargo.toml`.
    #[error("Failed to find project root: {0}")]
    ProjectRootNotFound(String),
}

/// Walk up from the working directory to the `Cargo.toml` with a `[workspace]` table.
pub fn find_project_root() -> Result<PathBuf, TestHelperError> {
    let mut current_dir = env::current_dir().map_err(|e| {
        TestHelperError::ProjectRootNotFound(format!("Failed to get current directory: {e}"))
    })?;

    loop {
        let cargo_toml = current_dir.join("Cargo.toml");
        if cargo_toml.exists() {
            let content = std::fs::read_to_string(&cargo_toml).map_err(|e| {
                TestHelperError::ProjectRootNotFound(format!("Failed to read Cargo.toml: {e}"))
            })?;

            if content.contains("[workspace]") {
                return Ok(current_dir);
            }
        }

        if !current_dir.pop() {
            break;
        }
    }

    Err(TestHelperError::ProjectRootNotFound(
        "Workspace root not found".to_string(),
    ))
}

static PROJECT_ROOT: Lazy<PathBuf> =
    Lazy::new(|| find_project_root().expect("Failed to find project root directory"));

/// `<workspace>/test_output`, created on first use.
pub fn get_output_dir() -> PathBuf {
    let output_dir = PROJECT_ROOT.join("test_output");

    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");
    }

    output_dir
}

/// Path of an artifact inside [`get_output_dir`].
pub fn output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    get_output_dir().join(path)
}

/// All-zero mask of the given size, shaped `(height, width)`.
pub fn empty_mask(width: usize, height: usize) -> Array2<f32> {
    Array2::zeros((height, width))
}

/// Mask with a one-pixel-wide straight line from `from` to `to`, both `(x, y)`
/// and both inclusive. Points outside the frame are dropped.
pub fn line_mask(width: usize, height: usize, from: (i64, i64), to: (i64, i64)) -> Array2<f32> {
    let mut mask = empty_mask(width, height);
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs());

    for step in 0..=steps {
        let t = if steps == 0 {
            0.0
        } else {
            step as f64 / steps as f64
        };
        let x = (from.0 as f64 + (to.0 - from.0) as f64 * t).round() as i64;
        let y = (from.1 as f64 + (to.1 - from.1) as f64 * t).round() as i64;
        if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
            mask[[y as usize, x as usize]] = 1.0;
        }
    }

    mask
}

/// Mask with a filled, axis-aligned rectangle; `x`/`y` ranges are half-open.
pub fn rect_mask(
    width: usize,
    height: usize,
    x: std::ops::Range<usize>,
    y: std::ops::Range<usize>,
) -> Array2<f32> {
    let mut mask = empty_mask(width, height);
    for row in y.clone() {
        for col in x.clone() {
            if row < height && col < width {
                mask[[row, col]] = 1.0;
            }
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_root_exists() {
        let root = find_project_root().expect("Failed to find project root");
        assert!(root.join("Cargo.toml").exists());
        assert!(root.join("test_helpers").exists());
    }

    #[test]
    fn test_output_path() {
        let path = output_path("test.png");
        assert_eq!(path, get_output_dir().join("test.png"));
        assert!(get_output_dir().is_dir());
    }

    #[test]
    fn test_line_mask_pixels() {
        let mask = line_mask(20, 10, (2, 1), (12, 1));
        assert_eq!(mask.dim(), (10, 20));
        assert_eq!(mask.iter().filter(|&&v| v > 0.5).count(), 11);
        assert_eq!(mask[[1, 2]], 1.0);
        assert_eq!(mask[[1, 12]], 1.0);
    }

    #[test]
    fn test_line_mask_clips_to_frame() {
        let mask = line_mask(5, 5, (-3, 2), (7, 2));
        assert_eq!(mask.iter().filter(|&&v| v > 0.5).count(), 5);
    }

    #[test]
    fn test_rect_mask() {
        let mask = rect_mask(8, 8, 2..5, 1..3);
        assert_eq!(mask.iter().filter(|&&v| v > 0.5).count(), 6);
        assert_eq!(mask[[1, 2]], 1.0);
        assert_eq!(mask[[3, 2]], 0.0);
    }
}
