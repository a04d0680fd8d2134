//! Shared test utilities for the darkroom test suite.
//!
//! Synthetic images are generated on the fly with the `image` crate so tests
//! never depend on fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let originals = tmp.path().join("originals");
//! create_test_jpeg(&originals.join("nature/dawn.jpg"), 400, 300);
//! write_corrupt_file(&originals.join("nature/broken.jpg"));
//! ```

use image::{ImageFormat, Rgb, RgbImage};
use std::fs;
use std::path::Path;

/// A gradient so encoders have something other than flat color to chew on.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

fn write_image(path: &Path, width: u32, height: u32, format: ImageFormat) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    gradient(width, height)
        .save_with_format(path, format)
        .unwrap();
}

/// Write a real JPEG of the given size, creating parent directories.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    write_image(path, width, height, ImageFormat::Jpeg);
}

/// Write a real PNG of the given size, creating parent directories.
///
/// The extension of `path` is ignored, which lets tests mislabel files.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    write_image(path, width, height, ImageFormat::Png);
}

/// Write bytes that no decoder accepts.
pub fn write_corrupt_file(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"this is not an image, just some text bytes").unwrap();
}
