//! Watermark overlay description.
//!
//! [`compose_watermark`] is pure: it turns target dimensions plus the
//! configured text into a [`WatermarkSpec`]. The backend rasterizes the spec
//! into a transparent layer the size of the canvas and composites it at the
//! top-left corner.
//!
//! The overlay has two parts:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │                ___---        │   brand text, rotated about the
//! │       ___---BRAND            │   canvas center, low opacity
//! │  ---                         │
//! │                      @handle │   handle text, bottom-right,
//! └──────────────────────────────┘   inset from both edges
//! ```
//!
//! Font sizes are derived from the *output* width, so a spec must be built
//! per image, after the resize plan is known.

use crate::config::WatermarkConfig;

/// Everything needed to draw one watermark layer.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkSpec {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub brand_text: String,
    pub handle_text: String,
    /// Pixel height of the diagonal brand text; 0 means it is not drawn.
    pub brand_font_size: u32,
    /// Pixel height of the corner handle text; 0 means it is not drawn.
    pub handle_font_size: u32,
    pub brand_opacity: f32,
    pub handle_opacity: f32,
    /// Rotation of the brand text about the canvas center, in degrees.
    pub angle_degrees: f32,
    /// Offset of the handle text from the right and bottom edges.
    pub inset: u32,
}

impl WatermarkSpec {
    /// Bottom-right anchor point the handle text ends at.
    pub fn handle_anchor(&self) -> (i32, i32) {
        (
            self.canvas_width as i32 - self.inset as i32,
            self.canvas_height as i32 - self.inset as i32,
        )
    }

    /// Canvas center the brand text is rotated about.
    pub fn center(&self) -> (f32, f32) {
        (
            self.canvas_width as f32 / 2.0,
            self.canvas_height as f32 / 2.0,
        )
    }
}

/// Build the overlay for a `width x height` output image.
pub fn compose_watermark(width: u32, height: u32, config: &WatermarkConfig) -> WatermarkSpec {
    WatermarkSpec {
        canvas_width: width,
        canvas_height: height,
        brand_text: config.brand_text.clone(),
        handle_text: config.handle_text.clone(),
        brand_font_size: width / config.brand_divisor.max(1),
        handle_font_size: width / config.handle_divisor.max(1),
        brand_opacity: config.brand_opacity,
        handle_opacity: config.handle_opacity,
        angle_degrees: config.angle,
        inset: config.inset,
    }
}
