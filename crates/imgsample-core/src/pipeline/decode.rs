//! Image decoding at a reduced linear resolution.

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use std::path::Path;

use crate::error::PipelineError;
use crate::types::SamplePlan;

/// Decoded pixels owned by one pipeline run.
///
/// Stages that transform the pixels take this by value, so the superseded
/// buffer is freed as soon as its replacement exists.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl DecodedImage {
    /// Wrap an image, recording its dimensions.
    pub fn new(image: DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            image,
            width,
            height,
        }
    }
}

/// Decodes a source file at `1/sample_factor` of its linear resolution.
pub struct ImageDecoder;

impl ImageDecoder {
    /// Decode `path` and reduce it according to `plan`.
    ///
    /// The codec has no scale-at-decode hint, so the full frame is decoded and
    /// then area-averaged; the full-resolution buffer is dropped before this
    /// returns.
    pub fn decode(path: &Path, plan: SamplePlan) -> Result<DecodedImage, PipelineError> {
        let reader = image::ImageReader::open(path)
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot open file: {}", e),
            })?
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;

        let full = reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if full.width() == 0 || full.height() == 0 {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Decoder produced an empty buffer".to_string(),
            });
        }

        let image = if plan.sample_factor > 1 {
            downsample(&full, plan.sample_factor)
        } else {
            full
        };

        Ok(DecodedImage::new(image))
    }
}

/// Area-average `image` by `factor` in both dimensions.
///
/// Output is `ceil(w/factor) x ceil(h/factor)`; edge blocks average only the
/// pixels they cover. Channel means are rounded half up, so the result is
/// fully deterministic.
pub fn downsample(image: &DynamicImage, factor: u32) -> DynamicImage {
    let factor = factor.max(1);
    let (width, height) = image.dimensions();
    let out_width = width.div_ceil(factor);
    let out_height = height.div_ceil(factor);
    let mut out = RgbaImage::new(out_width, out_height);

    for oy in 0..out_height {
        let y0 = oy * factor;
        let y1 = (y0 + factor).min(height);
        for ox in 0..out_width {
            let x0 = ox * factor;
            let x1 = (x0 + factor).min(width);

            let mut sum = [0u64; 4];
            for y in y0..y1 {
                for x in x0..x1 {
                    let Rgba(px) = image.get_pixel(x, y);
                    for (acc, channel) in sum.iter_mut().zip(px) {
                        *acc += u64::from(channel);
                    }
                }
            }

            let count = u64::from((x1 - x0) * (y1 - y0));
            let mean = sum.map(|s| ((s + count / 2) / count) as u8);
            out.put_pixel(ox, oy, Rgba(mean));
        }
    }

    DynamicImage::ImageRgba8(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    #[test]
    fn test_downsample_dimensions_round_up() {
        let img = DynamicImage::new_rgb8(10, 7);
        let out = downsample(&img, 3);
        assert_eq!(out.dimensions(), (4, 3));
    }

    #[test]
    fn test_downsample_averages_blocks() {
        // Left half black, right half white; a 2x2 block straddling the seam is grey
        let mut img = RgbImage::new(4, 2);
        for (x, _, px) in img.enumerate_pixels_mut() {
            *px = if x < 1 || x == 3 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            };
        }
        let out = downsample(&DynamicImage::ImageRgb8(img), 2);
        assert_eq!(out.dimensions(), (2, 1));
        // (0 + 255 + 0 + 255) / 4 = 127.5, rounded half up
        assert_eq!(out.get_pixel(0, 0), Rgba([128, 128, 128, 255]));
        assert_eq!(out.get_pixel(1, 0), Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_downsample_edge_block_uses_covered_pixels_only() {
        let img = RgbImage::from_pixel(3, 1, Rgb([200, 100, 50]));
        let out = downsample(&DynamicImage::ImageRgb8(img), 2);
        assert_eq!(out.dimensions(), (2, 1));
        assert_eq!(out.get_pixel(1, 0), Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn test_downsample_is_deterministic() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(31, 17, |x, y| {
            Rgb([(x * 8) as u8, (y * 15) as u8, ((x + y) * 3) as u8])
        }));
        let a = downsample(&img, 4);
        let b = downsample(&img, 4);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_decode_applies_sample_factor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.png");
        DynamicImage::new_rgb8(400, 300)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let decoded = ImageDecoder::decode(&path, SamplePlan { sample_factor: 3 }).unwrap();
        assert_eq!((decoded.width, decoded.height), (134, 100));
    }

    #[test]
    fn test_decode_factor_one_keeps_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.png");
        DynamicImage::new_rgb8(40, 30)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let decoded = ImageDecoder::decode(&path, SamplePlan { sample_factor: 1 }).unwrap();
        assert_eq!((decoded.width, decoded.height), (40, 30));
    }

    #[test]
    fn test_decode_truncated_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truncated.png");
        let mut bytes = Vec::new();
        let noisy = RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 37 + y * 11) as u8, (x * y) as u8, (x ^ y) as u8])
        });
        DynamicImage::ImageRgb8(noisy)
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes.truncate(bytes.len() / 2);
        std::fs::write(&path, bytes).unwrap();

        let result = ImageDecoder::decode(&path, SamplePlan { sample_factor: 1 });
        assert!(matches!(result, Err(PipelineError::Decode { .. })));
    }
}
