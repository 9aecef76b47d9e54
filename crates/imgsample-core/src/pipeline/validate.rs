//! Pre-flight checks run before the source header is probed.

use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Validates source files before any decoding work.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check that the source exists, fits the size limit, and looks like a
    /// single-frame raster the decoder can handle.
    pub fn validate(&self, path: &Path) -> Result<(), PipelineError> {
        if !path.is_file() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path).map_err(|e| PipelineError::Probe {
            path: path.to_path_buf(),
            message: format!("Cannot read metadata: {}", e),
        })?;

        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        self.check_magic_bytes(path)
    }

    fn check_magic_bytes(&self, path: &Path) -> Result<(), PipelineError> {
        let mut file = std::fs::File::open(path).map_err(|e| PipelineError::Probe {
            path: path.to_path_buf(),
            message: format!("Cannot open file: {}", e),
        })?;

        let mut header = [0u8; 12];
        let mut filled = 0;
        // A single read may return short on some filesystems
        while filled < header.len() {
            match file.read(&mut header[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(PipelineError::Probe {
                        path: path.to_path_buf(),
                        message: format!("Cannot read header: {}", e),
                    })
                }
            }
        }

        if filled < 4 {
            return Err(PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                message: "file too small to be an image".to_string(),
            });
        }

        match Self::sniff_format(&header[..filled]) {
            Some(format) => {
                tracing::trace!("  Sniffed {} header for {:?}", format, path);
                Ok(())
            }
            None => Err(PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                message: "unrecognized magic bytes".to_string(),
            }),
        }
    }

    /// Name the raster format whose signature starts `header`, if any.
    fn sniff_format(header: &[u8]) -> Option<&'static str> {
        match header {
            [0xFF, 0xD8, 0xFF, ..] => Some("jpeg"),
            [0x89, b'P', b'N', b'G', ..] => Some("png"),
            [b'G', b'I', b'F', b'8', ..] => Some("gif"),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("webp"),
            [b'B', b'M', ..] => Some("bmp"),
            [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some("tiff"),
            _ => None,
        }
    }
}
