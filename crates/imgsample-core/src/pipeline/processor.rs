//! Pipeline orchestration - runs every stage for one request.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{ImageRequest, OutputFile};

use super::decode::ImageDecoder;
use super::encode::ImageWriter;
use super::orientation::OrientationCorrector;
use super::plan;
use super::probe::BoundsProber;
use super::validate::Validator;

/// Runs validate → probe → plan → decode → orient → write, synchronously.
///
/// Blocking; [`crate::ImageSampler`] moves it onto the blocking pool.
#[derive(Debug, Clone)]
pub struct Processor {
    validator: Validator,
    writer: ImageWriter,
    max_image_dimension: u32,
}

impl Processor {
    /// Create a new processor with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            validator: Validator::new(config.limits.clone()),
            writer: ImageWriter::new(config.output.clone()),
            max_image_dimension: config.limits.max_image_dimension,
        }
    }

    /// Produce the sampled copy for `request`.
    pub fn run(&self, request: &ImageRequest) -> PipelineResult<OutputFile> {
        self.run_unless(request, &AtomicBool::new(false))
    }

    /// Like [`run`](Self::run), but stops before the next expensive stage
    /// once `abandoned` is set. Nothing is written after abandonment is seen.
    pub fn run_unless(
        &self,
        request: &ImageRequest,
        abandoned: &AtomicBool,
    ) -> PipelineResult<OutputFile> {
        let start = Instant::now();
        let path = request.source_path();
        tracing::debug!("Sampling: {:?}", path);

        self.validator.validate(path)?;
        tracing::trace!("  Validate: {:?}", start.elapsed());

        let probe_start = Instant::now();
        let bounds = BoundsProber::probe(path)?;
        tracing::trace!("  Probe: {:?}", probe_start.elapsed());

        if bounds.width > self.max_image_dimension || bounds.height > self.max_image_dimension {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width: bounds.width,
                height: bounds.height,
                max_dim: self.max_image_dimension,
            });
        }

        let sample_plan = plan::plan(bounds, request.target_dimension());
        tracing::trace!(
            "  Plan: {}x{} at {} -> factor {}",
            bounds.width,
            bounds.height,
            request.target_dimension(),
            sample_plan.sample_factor
        );

        check_abandoned(abandoned, path, "decode")?;
        let decode_start = Instant::now();
        let decoded = ImageDecoder::decode(path, sample_plan)?;
        tracing::trace!("  Decode: {:?}", decode_start.elapsed());

        let orientation = OrientationCorrector::read_or_normal(path);
        let corrected = OrientationCorrector::apply(decoded, orientation);
        tracing::trace!("  Orientation: {:?}", orientation);

        check_abandoned(abandoned, path, "write")?;
        let (width, height) = (corrected.width, corrected.height);
        let write_start = Instant::now();
        let output = self.writer.write(corrected, request.output_directory())?;
        tracing::trace!("  Write: {:?}", write_start.elapsed());

        tracing::debug!(
            "Sampled {:?} -> {:?} in {:?} ({}x{})",
            path,
            output.path,
            start.elapsed(),
            width,
            height
        );

        Ok(output)
    }
}

fn check_abandoned(abandoned: &AtomicBool, path: &Path, stage: &str) -> PipelineResult<()> {
    if abandoned.load(Ordering::Acquire) {
        return Err(PipelineError::Abandoned {
            path: path.to_path_buf(),
            stage: stage.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::orientation::tests::jpeg_with_orientation;
    use image::{DynamicImage, GenericImageView, ImageFormat};

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn test_run_downsamples_large_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("big.png");
        DynamicImage::new_rgb8(400, 300)
            .save_with_format(&source, ImageFormat::Png)
            .unwrap();

        let request = ImageRequest::new(&source, dir.path().join("out"), 100).unwrap();
        let output = Processor::new(&config()).run(&request).unwrap();

        let written = image::open(&output.path).unwrap();
        // 400x300 at 100: factor 3 -> 134x100
        assert_eq!(written.dimensions(), (134, 100));
    }

    #[test]
    fn test_run_keeps_small_source_size() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("small.png");
        DynamicImage::new_rgb8(50, 40)
            .save_with_format(&source, ImageFormat::Png)
            .unwrap();

        let request = ImageRequest::new(&source, dir.path(), 100).unwrap();
        let output = Processor::new(&config()).run(&request).unwrap();
        assert_eq!(image::open(&output.path).unwrap().dimensions(), (50, 40));
        // Source left alone
        assert!(source.exists());
    }

    #[test]
    fn test_run_applies_exif_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("portrait.jpg");
        std::fs::write(&source, jpeg_with_orientation(600, 800, 6)).unwrap();

        let request = ImageRequest::new(&source, dir.path().join("out"), 1000).unwrap();
        let output = Processor::new(&config()).run(&request).unwrap();

        assert_eq!(image::open(&output.path).unwrap().dimensions(), (800, 600));
    }

    #[test]
    fn test_run_corrupt_source_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("corrupt.jpg");
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend_from_slice(&[0x42; 64]);
        std::fs::write(&source, bytes).unwrap();
        let out = dir.path().join("out");

        let request = ImageRequest::new(&source, &out, 100).unwrap();
        assert!(Processor::new(&config()).run(&request).is_err());
        assert!(!out.exists() || std::fs::read_dir(&out).unwrap().next().is_none());
    }

    #[test]
    fn test_abandoned_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.png");
        DynamicImage::new_rgb8(40, 30)
            .save_with_format(&source, ImageFormat::Png)
            .unwrap();
        let out = dir.path().join("out");

        let request = ImageRequest::new(&source, &out, 100).unwrap();
        let err = Processor::new(&config())
            .run_unless(&request, &AtomicBool::new(true))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Abandoned { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn test_run_rejects_oversized_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("wide.png");
        DynamicImage::new_rgb8(300, 10)
            .save_with_format(&source, ImageFormat::Png)
            .unwrap();

        let mut config = config();
        config.limits.max_image_dimension = 200;
        let request = ImageRequest::new(&source, dir.path(), 100).unwrap();
        let err = Processor::new(&config).run(&request).unwrap_err();
        assert!(matches!(err, PipelineError::ImageTooLarge { .. }));
    }
}
