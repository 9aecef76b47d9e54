//! EXIF orientation lookup and upright correction.

use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::decode::DecodedImage;
use crate::error::PipelineError;
use crate::types::Orientation;

/// Reads orientation metadata and rotates decoded images upright.
pub struct OrientationCorrector;

impl OrientationCorrector {
    /// Read the orientation tag from `path`.
    ///
    /// This is a metadata-only parse of the container, independent of the
    /// pixel decode. A file without EXIF data is `Normal`; a file whose
    /// metadata cannot be parsed is a `Rotation` error.
    pub fn read(path: &Path) -> Result<Orientation, PipelineError> {
        let rotation_err = |message: String| PipelineError::Rotation {
            path: path.to_path_buf(),
            message,
        };

        let file = File::open(path).map_err(|e| rotation_err(e.to_string()))?;
        let mut reader = BufReader::new(file);
        let exif = match Reader::new().read_from_container(&mut reader) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(Orientation::Normal),
            Err(e) => return Err(rotation_err(e.to_string())),
        };

        let value = exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Short(v) => v.first().map(|&x| u32::from(x)),
                Value::Long(v) => v.first().copied(),
                _ => None,
            });

        Ok(value.map(Orientation::from_exif).unwrap_or_default())
    }

    /// Like [`read`](Self::read), but any failure falls back to `Normal`.
    pub fn read_or_normal(path: &Path) -> Orientation {
        Self::read(path).unwrap_or_else(|e| {
            tracing::debug!("{}; assuming normal orientation", e);
            Orientation::Normal
        })
    }

    /// Rotate `decoded` clockwise per `orientation`.
    ///
    /// `Normal` hands the input back untouched. Otherwise the source buffer is
    /// dropped as soon as the rotated one has been produced.
    pub fn apply(decoded: DecodedImage, orientation: Orientation) -> DecodedImage {
        let rotated = match orientation {
            Orientation::Normal => return decoded,
            Orientation::Rotate90 => decoded.image.rotate90(),
            Orientation::Rotate180 => decoded.image.rotate180(),
            Orientation::Rotate270 => decoded.image.rotate270(),
        };
        drop(decoded);
        DecodedImage::new(rotated)
    }
}
