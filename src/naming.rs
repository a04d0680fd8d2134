//! File naming conventions shared by the pipeline and the manifest output.
//!
//! ## Published Names
//!
//! Published files keep the original stem and always end in `.jpg`, whatever
//! the source format:
//! - `nature/IMG_2610.JPG` → `IMG_2610.jpg`
//! - `cars/R6__5123.tiff` → `R6__5123.jpg`
//!
//! ## Display Titles
//!
//! Draft manifest titles come from the stem with underscores and dashes
//! converted to spaces and runs of whitespace collapsed:
//! - `Golden_Gate-at-dusk.jpg` → "Golden Gate at dusk"
//! - `R6__5123.jpg` → "R6 5123"

use std::path::Path;

/// Extension every published file carries.
pub const PUBLISHED_EXTENSION: &str = "jpg";

/// File stem of `path`, or the empty string if it has none.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Name of the published file for a source image: `<stem>.jpg`.
pub fn published_file_name(source: &Path) -> String {
    format!("{}.{}", file_stem(source), PUBLISHED_EXTENSION)
}

/// Human-readable title derived from a file name.
pub fn display_title(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    stem.replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True if `path` is a JPEG by extension (case-insensitive).
pub fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}
