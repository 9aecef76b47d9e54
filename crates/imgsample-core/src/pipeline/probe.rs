//! Header-only dimension probe.

use std::path::Path;

use crate::error::PipelineError;
use crate::types::ProbedBounds;

/// Reads image dimensions without decoding pixel data.
pub struct BoundsProber;

impl BoundsProber {
    /// Probe `path` for its width and height.
    ///
    /// Only the container header is parsed; no pixel buffer is allocated.
    pub fn probe(path: &Path) -> Result<ProbedBounds, PipelineError> {
        let reader = image::ImageReader::open(path)
            .map_err(|e| PipelineError::Probe {
                path: path.to_path_buf(),
                message: format!("Cannot open file: {}", e),
            })?
            .with_guessed_format()
            .map_err(|e| PipelineError::Probe {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;

        if reader.format().is_none() {
            return Err(PipelineError::Probe {
                path: path.to_path_buf(),
                message: "Unrecognized image format".to_string(),
            });
        }

        let (width, height) = reader.into_dimensions().map_err(|e| PipelineError::Probe {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if width == 0 || height == 0 {
            return Err(PipelineError::Probe {
                path: path.to_path_buf(),
                message: format!("Header reports empty image ({}x{})", width, height),
            });
        }

        Ok(ProbedBounds { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};

    #[test]
    fn test_probe_png_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.png");
        DynamicImage::new_rgb8(320, 200)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let bounds = BoundsProber::probe(&path).unwrap();
        assert_eq!(
            bounds,
            ProbedBounds {
                width: 320,
                height: 200
            }
        );
    }

    #[test]
    fn test_probe_detects_format_by_content() {
        // PNG bytes behind a .jpg extension still probe correctly
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("misnamed.jpg");
        DynamicImage::new_rgb8(64, 48)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let bounds = BoundsProber::probe(&path).unwrap();
        assert_eq!((bounds.width, bounds.height), (64, 48));
    }

    #[test]
    fn test_probe_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"\x00\x01\x02\x03not an image").unwrap();

        let err = BoundsProber::probe(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Probe { .. }));
    }

    #[test]
    fn test_probe_missing_file_fails() {
        let err = BoundsProber::probe(Path::new("/nonexistent/probe.jpg")).unwrap_err();
        assert!(matches!(err, PipelineError::Probe { .. }));
    }
}
