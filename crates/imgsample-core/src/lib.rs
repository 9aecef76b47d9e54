//! imgsample core - downsample, orientation-correct and re-encode photos.
//!
//! Given the path of a freshly captured or picked photo, imgsample writes a
//! reduced, upright JPEG copy bounded by a requested dimension. The work runs
//! off the calling task and the result is handed to a detachable listener.
//!
//! # Architecture
//!
//! ```text
//! Validate → Probe bounds → Plan factor → Decode/downsample → Orient → Write JPEG
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use imgsample_core::{Config, ImageSampler, OutputFile};
//!
//! #[tokio::main]
//! async fn main() -> imgsample_core::Result<()> {
//!     let config = Config::load()?;
//!     let sampler = ImageSampler::new(&config);
//!     sampler.set_listener(Arc::new(|output: &OutputFile| {
//!         println!("Sampled: {}", output.path.display());
//!     }));
//!
//!     let handle = sampler.sample("./photo.jpg", config.output_dir(), 1024)?;
//!     handle.join().await;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod sampler;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, Result, SamplerError};
pub use pipeline::Processor;
pub use sampler::{ImageSampledListener, ImageSampler, SampleHandle};
pub use types::{ImageRequest, Orientation, OutputFile, ProbedBounds, SamplePlan};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
