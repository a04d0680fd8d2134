//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary; the only runtime input
//! besides the photos is the watermark font file.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Probe | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Watermark text | `imageproc::drawing::draw_text_mut` over an `ab_glyph` font |
//! | Watermark rotation | `imageproc::geometric_transformations::rotate_about_center` |
//! | Composite | `image::imageops::overlay` at (0, 0) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |

use super::backend::{BackendError, ImageBackend, ImageMetadata};
use super::params::{RenderParams, RotateParams, Rotation};
use super::watermark::WatermarkSpec;
use ab_glyph::{FontVec, PxScale};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Extensions the batch driver picks up, with the decoder each needs.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
    ("tiff", ImageFormat::Tiff),
    ("tif", ImageFormat::Tiff),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// True if `path` has a supported image extension (case-insensitive).
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Bold sans-serif fonts tried, in order, when no font is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// First well-known system font that exists on this machine.
pub fn find_system_font() -> Option<PathBuf> {
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Read and parse a TrueType/OpenType font file.
pub fn load_font(path: &Path) -> Result<FontVec, BackendError> {
    let data = std::fs::read(path)?;
    FontVec::try_from_vec(data).map_err(|e| {
        BackendError::ProcessingFailed(format!("Invalid font {}: {}", path.display(), e))
    })
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping. A backend
/// without a font can still probe, resize and rotate; rendering with a
/// watermark fails with [`BackendError::FontUnavailable`].
#[derive(Default)]
pub struct RustBackend {
    font: Option<FontVec>,
}

impl RustBackend {
    pub fn new() -> Self {
        Self { font: None }
    }

    pub fn with_font(font: FontVec) -> Self {
        Self { font: Some(font) }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }
}

/// Load and decode an image from disk, sniffing the format from its contents.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode as baseline JPEG. Alpha is dropped; JPEG has no alpha channel.
fn encode_jpeg(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100) as u8);
    rgb.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

/// Fully transparent white. Starting layers from white keeps anti-aliased
/// glyph edges white instead of blending them toward black.
const CLEAR: Rgba<u8> = Rgba([255, 255, 255, 0]);

fn white(opacity: f32) -> Rgba<u8> {
    Rgba([255, 255, 255, (opacity.clamp(0.0, 1.0) * 255.0).round() as u8])
}

/// Scratch layer size for text of `text_w` × `text_h` rotated by
/// `angle_degrees` about its center: large enough for both the upright and
/// the rotated bounding box, plus a pixel of margin for interpolation.
fn brand_scratch_size(text_w: u32, text_h: u32, angle_degrees: f32) -> (u32, u32) {
    let (sin, cos) = (angle_degrees as f64).to_radians().sin_cos();
    let (w, h) = (text_w as f64, text_h as f64);
    let rotated_w = (w * cos.abs() + h * sin.abs()).ceil() as u32;
    let rotated_h = (w * sin.abs() + h * cos.abs()).ceil() as u32;
    (text_w.max(rotated_w) + 2, text_h.max(rotated_h) + 2)
}

/// Draw the rotated brand text on a canvas-sized layer.
///
/// Only the text's own bounding box is rasterized and rotated; the result
/// is placed so its center lands on the canvas center. Parts that fall
/// outside the canvas are clipped.
fn rasterize_brand(spec: &WatermarkSpec, font: &FontVec) -> RgbaImage {
    let (w, h) = (spec.canvas_width, spec.canvas_height);
    let mut layer = RgbaImage::from_pixel(w, h, CLEAR);

    let scale = PxScale::from(spec.brand_font_size as f32);
    let (text_w, text_h) = text_size(scale, font, &spec.brand_text);
    if text_w == 0 || text_h == 0 {
        return layer;
    }
    let (scratch_w, scratch_h) = brand_scratch_size(text_w, text_h, spec.angle_degrees);
    let mut scratch = RgbaImage::from_pixel(scratch_w, scratch_h, CLEAR);
    draw_text_mut(
        &mut scratch,
        white(spec.brand_opacity),
        (scratch_w - text_w) as i32 / 2,
        (scratch_h - text_h) as i32 / 2,
        scale,
        font,
        &spec.brand_text,
    );

    let rotated = rotate_about_center(
        &scratch,
        spec.angle_degrees.to_radians(),
        Interpolation::Bilinear,
        CLEAR,
    );
    let x = (w as i64 - scratch_w as i64) / 2;
    let y = (h as i64 - scratch_h as i64) / 2;
    image::imageops::overlay(&mut layer, &rotated, x, y);
    layer
}

/// Rasterize a [`WatermarkSpec`] into a transparent layer of exactly the
/// canvas size.
pub fn rasterize_watermark(spec: &WatermarkSpec, font: &FontVec) -> RgbaImage {
    let mut layer = if spec.brand_font_size > 0 && !spec.brand_text.is_empty() {
        rasterize_brand(spec, font)
    } else {
        RgbaImage::from_pixel(spec.canvas_width, spec.canvas_height, CLEAR)
    };

    if spec.handle_font_size > 0 && !spec.handle_text.is_empty() {
        let scale = PxScale::from(spec.handle_font_size as f32);
        let (text_w, text_h) = text_size(scale, font, &spec.handle_text);
        let (right, bottom) = spec.handle_anchor();
        draw_text_mut(
            &mut layer,
            white(spec.handle_opacity),
            right - text_w as i32,
            bottom - text_h as i32,
            scale,
            font,
            &spec.handle_text,
        );
    }

    layer
}

impl RustBackend {
    fn composite(
        &self,
        img: DynamicImage,
        spec: &WatermarkSpec,
    ) -> Result<DynamicImage, BackendError> {
        let font = self.font.as_ref().ok_or(BackendError::FontUnavailable)?;
        if (spec.canvas_width, spec.canvas_height) != (img.width(), img.height()) {
            return Err(BackendError::ProcessingFailed(format!(
                "Watermark canvas {}x{} does not match image {}x{}",
                spec.canvas_width,
                spec.canvas_height,
                img.width(),
                img.height()
            )));
        }
        let overlay = rasterize_watermark(spec, font);
        let mut base = img.to_rgba8();
        image::imageops::overlay(&mut base, &overlay, 0, 0);
        Ok(DynamicImage::ImageRgba8(base))
    }
}

impl ImageBackend for RustBackend {
    fn probe(&self, path: &Path) -> Result<ImageMetadata, BackendError> {
        let byte_size = std::fs::metadata(path)?.len();
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format().ok_or_else(|| {
            BackendError::ProcessingFailed(format!("Unrecognized image format: {}", path.display()))
        })?;
        let (width, height) = reader.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        if width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Image has no pixels: {}",
                path.display()
            )));
        }
        Ok(ImageMetadata {
            width,
            height,
            byte_size,
            format,
        })
    }

    fn render(&self, params: &RenderParams) -> Result<Vec<u8>, BackendError> {
        if params.watermark.is_some() && self.font.is_none() {
            return Err(BackendError::FontUnavailable);
        }

        let img = load_image(&params.source)?;
        let resized = if (img.width(), img.height()) == (params.width, params.height) {
            img
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };

        let finished = match &params.watermark {
            Some(spec) => self.composite(resized, spec)?,
            None => resized,
        };
        encode_jpeg(&finished, params.quality.value())
    }

    fn rotate(&self, params: &RotateParams) -> Result<Vec<u8>, BackendError> {
        let img = load_image(&params.source)?;
        let rotated = match params.rotation {
            Rotation::Cw90 => img.rotate90(),
            Rotation::Cw180 => img.rotate180(),
            Rotation::Cw270 => img.rotate270(),
        };

        let format = ImageFormat::from_path(&params.source).map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Cannot determine output format for {}: {}",
                params.source.display(),
                e
            ))
        })?;
        match format {
            ImageFormat::Jpeg => encode_jpeg(&rotated, params.quality.value()),
            other => {
                let mut buf = Vec::new();
                rotated
                    .write_to(&mut Cursor::new(&mut buf), other)
                    .map_err(|e| {
                        BackendError::ProcessingFailed(format!("Encode failed: {}", e))
                    })?;
                Ok(buf)
            }
        }
    }
}
