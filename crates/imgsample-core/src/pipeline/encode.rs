//! JPEG output with collision-free, never-overwriting file names.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use super::decode::DecodedImage;
use crate::config::OutputConfig;
use crate::error::PipelineError;
use crate::types::OutputFile;

/// Gives up after this many consecutive name collisions.
const MAX_NAME_ATTEMPTS: u32 = 16;

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Nanosecond stamp, strictly increasing across calls within this process.
pub fn next_stamp() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0);

    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last.saturating_add(1));
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Serializes decoded images into new files under an output directory.
#[derive(Debug, Clone)]
pub struct ImageWriter {
    config: OutputConfig,
}

impl ImageWriter {
    /// Create a new writer with the given output settings.
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Encode `decoded` as JPEG into a fresh file under `directory`.
    ///
    /// The directory (and its parents) is created if missing. Existing files
    /// are never touched; a partially written file is removed on failure.
    pub fn write(
        &self,
        decoded: DecodedImage,
        directory: &Path,
    ) -> Result<OutputFile, PipelineError> {
        std::fs::create_dir_all(directory).map_err(|e| PipelineError::Io {
            path: directory.to_path_buf(),
            message: format!("Cannot create output directory: {}", e),
        })?;

        let (path, file) = self.create_unique(directory)?;

        match self.encode_into(decoded, file) {
            Ok(()) => Ok(OutputFile { path }),
            Err(message) => {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::debug!("Could not remove partial output {:?}: {}", path, e);
                }
                Err(PipelineError::Io { path, message })
            }
        }
    }

    fn file_name(&self, stamp: u64) -> String {
        format!("{}{}.{}", self.config.file_prefix, stamp, self.config.extension)
    }

    fn create_unique(&self, directory: &Path) -> Result<(PathBuf, File), PipelineError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = directory.join(self.file_name(next_stamp()));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::trace!("  Name collision on {:?}, retrying", path);
                }
                Err(e) => {
                    return Err(PipelineError::Io {
                        path,
                        message: format!("Cannot create output file: {}", e),
                    })
                }
            }
        }

        Err(PipelineError::Io {
            path: directory.to_path_buf(),
            message: format!("No free file name after {} attempts", MAX_NAME_ATTEMPTS),
        })
    }

    fn encode_into(&self, decoded: DecodedImage, file: File) -> Result<(), String> {
        // JPEG carries no alpha; the decoded buffer is consumed here
        let rgb = decoded.image.into_rgb8();

        let mut writer = BufWriter::new(file);
        let encoder = JpegEncoder::new_with_quality(&mut writer, self.config.jpeg_quality);
        encoder
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| format!("JPEG encoding failed: {}", e))?;
        drop(rgb);

        writer.flush().map_err(|e| format!("Flush failed: {}", e))?;
        let file = writer
            .into_inner()
            .map_err(|e| format!("Flush failed: {}", e.error()))?;
        file.sync_all().map_err(|e| format!("Sync failed: {}", e))
    }
}
