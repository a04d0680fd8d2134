//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Probe** | `image::ImageReader::into_dimensions` |
//! | **Resize → JPEG** | Lanczos3 + `JpegEncoder` |
//! | **Watermark** | `imageproc` text + rotation, `ab_glyph` font |
//! | **Rotate** | `DynamicImage::rotate90/180/270` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for orientation, aspect ratio and resize math
//! - **Watermark**: Pure construction of the overlay description
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;
mod watermark;

pub use backend::{BackendError, ImageBackend, ImageMetadata};
pub use calculations::{ResizePlan, aspect_ratio_string, classify_orientation, plan_resize};
pub use params::{Quality, RenderParams, RotateParams, Rotation};
pub use rust_backend::{
    RustBackend, find_system_font, is_supported_image, load_font, supported_input_extensions,
};
pub use watermark::{WatermarkSpec, compose_watermark};
