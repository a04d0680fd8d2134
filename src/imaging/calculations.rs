//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::config::OrientationThresholds;
use crate::types::{Dimensions, Orientation};

/// Classify an image by its height/width ratio.
///
/// A ratio inside `[square_min, square_max]` is square (both ends inclusive).
/// Anything else above `vertical` is vertical, the rest horizontal, so a
/// ratio of exactly `vertical` is horizontal.
///
/// `width` must be non-zero; probing guarantees it.
///
/// # Examples
/// ```
/// # use darkroom::config::OrientationThresholds;
/// # use darkroom::imaging::classify_orientation;
/// # use darkroom::types::Orientation;
/// let t = OrientationThresholds::default();
/// assert_eq!(classify_orientation(4000, 3000, &t), Orientation::Horizontal);
/// assert_eq!(classify_orientation(1200, 1200, &t), Orientation::Square);
/// assert_eq!(classify_orientation(3000, 3600, &t), Orientation::Vertical);
/// ```
pub fn classify_orientation(
    width: u32,
    height: u32,
    thresholds: &OrientationThresholds,
) -> Orientation {
    let ratio = height as f64 / width as f64;

    if ratio >= thresholds.square_min && ratio <= thresholds.square_max {
        Orientation::Square
    } else if ratio > thresholds.vertical {
        Orientation::Vertical
    } else {
        Orientation::Horizontal
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Reduce `width:height` to lowest terms, e.g. `4000x3000` → `"4:3"`.
///
/// # Examples
/// ```
/// # use darkroom::imaging::aspect_ratio_string;
/// assert_eq!(aspect_ratio_string(4000, 3000), "4:3");
/// assert_eq!(aspect_ratio_string(1200, 1200), "1:1");
/// ```
pub fn aspect_ratio_string(width: u32, height: u32) -> String {
    let divisor = gcd(width, height).max(1);
    format!("{}:{}", width / divisor, height / divisor)
}

/// Target dimensions for an image bounded by a maximum edge length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub width: u32,
    pub height: u32,
}

impl ResizePlan {
    /// True when the plan keeps the source dimensions.
    pub fn is_identity(&self, source: Dimensions) -> bool {
        self.width == source.width && self.height == source.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// Fit `width x height` inside a `max_dimension` square without upscaling.
///
/// The longer side becomes `max_dimension`; the shorter side scales by the
/// same factor, rounded to the nearest pixel and never below 1. Squares
/// clamp both sides.
///
/// # Examples
/// ```
/// # use darkroom::imaging::plan_resize;
/// let plan = plan_resize(3000, 3600, 2500);
/// assert_eq!((plan.width, plan.height), (2083, 2500));
/// ```
pub fn plan_resize(width: u32, height: u32, max_dimension: u32) -> ResizePlan {
    if width <= max_dimension && height <= max_dimension {
        return ResizePlan { width, height };
    }

    let scale = |short: u32, long: u32| -> u32 {
        ((short as f64 * max_dimension as f64) / long as f64).round() as u32
    };

    if width > height {
        ResizePlan {
            width: max_dimension,
            height: scale(height, width).max(1),
        }
    } else {
        ResizePlan {
            width: scale(width, height).max(1),
            height: max_dimension,
        }
    }
}
