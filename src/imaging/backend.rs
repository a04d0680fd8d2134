//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the pipeline
//! needs: probe, render and rotate. Render and rotate return the encoded
//! bytes instead of writing them; publishing is the pipeline's job, so the
//! backend never touches a destination path.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{RenderParams, RotateParams};
use image::ImageFormat;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("No watermark font loaded")]
    FontUnavailable,
}

/// What probing a source file reveals, without decoding pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    /// Size of the file on disk.
    pub byte_size: u64,
    pub format: ImageFormat,
}

impl ImageMetadata {
    pub fn dimensions(&self) -> crate::types::Dimensions {
        crate::types::Dimensions::new(self.width, self.height)
    }
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Read dimensions, size and format. Fails on unreadable or unrecognized files.
    fn probe(&self, path: &Path) -> Result<ImageMetadata, BackendError>;

    /// Decode, resize, watermark and encode to JPEG.
    fn render(&self, params: &RenderParams) -> Result<Vec<u8>, BackendError>;

    /// Decode, rotate and re-encode in the source's format.
    fn rotate(&self, params: &RotateParams) -> Result<Vec<u8>, BackendError>;
}
