//! Core data types passed between pipeline stages.

use std::path::{Path, PathBuf};

use crate::error::SamplerError;

/// One sampling request: where to read, where to write, and the size bound.
///
/// Immutable once built; the pipeline only ever borrows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    source_path: PathBuf,
    output_directory: PathBuf,
    target_dimension: u32,
}

impl ImageRequest {
    /// Build a request. `target_dimension` must be positive.
    pub fn new(
        source_path: impl Into<PathBuf>,
        output_directory: impl Into<PathBuf>,
        target_dimension: u32,
    ) -> Result<Self, SamplerError> {
        if target_dimension == 0 {
            return Err(SamplerError::InvalidRequest(
                "target_dimension must be > 0".to_string(),
            ));
        }
        Ok(Self {
            source_path: source_path.into(),
            output_directory: output_directory.into(),
            target_dimension,
        })
    }

    /// Path of the photo to sample.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Directory the sampled copy is written to.
    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Bound applied to both width and height.
    pub fn target_dimension(&self) -> u32 {
        self.target_dimension
    }
}

/// Dimensions read from the source header. Never holds pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbedBounds {
    pub width: u32,
    pub height: u32,
}

/// Integer downscale factor applied to both dimensions at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePlan {
    /// Always >= 1
    pub sample_factor: u32,
}

impl SamplePlan {
    /// Dimensions produced by decoding `bounds` at this factor.
    pub fn scaled_dimensions(&self, bounds: ProbedBounds) -> (u32, u32) {
        let f = self.sample_factor.max(1);
        (bounds.width.div_ceil(f), bounds.height.div_ceil(f))
    }
}

/// Rotation needed to display the source upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Orientation {
    /// Map an EXIF orientation tag value.
    ///
    /// Mirrored variants (2, 4, 5, 7) and unknown values fall back to `Normal`.
    pub fn from_exif(value: u32) -> Self {
        match value {
            6 => Orientation::Rotate90,
            3 => Orientation::Rotate180,
            8 => Orientation::Rotate270,
            _ => Orientation::Normal,
        }
    }

    /// Clockwise rotation in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Orientation::Normal => 0,
            Orientation::Rotate90 => 90,
            Orientation::Rotate180 => 180,
            Orientation::Rotate270 => 270,
        }
    }

    /// Whether applying this orientation swaps width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Orientation::Rotate90 | Orientation::Rotate270)
    }
}

/// The file written for a successful request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
}
