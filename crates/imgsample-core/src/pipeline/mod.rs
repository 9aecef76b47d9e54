//! Image sampling pipeline components.
//!
//! Each stage is a synchronous step; [`processor::Processor`] runs them in order:
//! - **validate**: Existence, size, and magic-byte checks
//! - **probe**: Header-only dimension read
//! - **plan**: Integer sample-factor computation
//! - **decode**: Decode and area-average down to the planned scale
//! - **orientation**: EXIF orientation lookup and rotation
//! - **encode**: JPEG output under a unique file name
//! - **processor**: Orchestrates the full pipeline

pub mod decode;
pub mod encode;
pub mod orientation;
pub mod plan;
pub mod probe;
pub mod processor;
pub mod validate;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use encode::ImageWriter;
pub use orientation::OrientationCorrector;
pub use probe::BoundsProber;
pub use processor::Processor;
pub use validate::Validator;
