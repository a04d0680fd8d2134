//! Pipeline configuration.
//!
//! Every tunable the pipeline uses lives in [`PipelineConfig`] and is passed
//! explicitly to the batch driver and planners, so tests can vary any value
//! without touching process-wide state.
//!
//! ## Config File
//!
//! The CLI reads `darkroom.toml` from the working directory (or the path
//! given with `--config`). The file is optional and sparse: values it sets
//! are merged over the stock defaults, everything else keeps its default.
//!
//! ```toml
//! max_dimension = 2500      # Longest edge of published images, in pixels
//! quality = 85              # JPEG quality (1-100)
//! categories = ["nature", "cars"]
//!
//! [orientation]
//! vertical = 0.85           # height/width above this is vertical
//! square_min = 0.9          # height/width inside [square_min, square_max] is square
//! square_max = 1.1
//!
//! [watermark]
//! enabled = true
//! brand_text = "JEFFREY YANG PHOTOGRAPHY"
//! handle_text = "@shotswithjeff"
//! # font = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"
//! brand_opacity = 0.3
//! handle_opacity = 0.7
//! angle = -30.0
//! inset = 20
//! brand_divisor = 15        # brand font size = floor(width / brand_divisor)
//! handle_divisor = 50       # handle font size = floor(width / handle_divisor)
//!
//! [manifest]
//! image_prefix = "/photography"
//! samples_per_category = 2
//! # price = 150
//! # dimensions = "16x20\""
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Everything the pipeline needs to know, with the documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Longest edge of a published image. Smaller sources are never enlarged.
    pub max_dimension: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Category subdirectories of the source root, processed in this order.
    pub categories: Vec<String>,
    /// Ratio thresholds for orientation classification.
    pub orientation: OrientationThresholds,
    /// Watermark text and styling.
    pub watermark: WatermarkConfig,
    /// Draft gallery manifest entries printed after a run.
    pub manifest: ManifestConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_dimension: 2500,
            quality: 85,
            categories: vec!["nature".to_string(), "cars".to_string()],
            orientation: OrientationThresholds::default(),
            watermark: WatermarkConfig::default(),
            manifest: ManifestConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "max_dimension must be greater than 0".into(),
            ));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        if self.categories.is_empty() {
            return Err(ConfigError::Validation(
                "categories must not be empty".into(),
            ));
        }
        if self.categories.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "categories must not contain blank names".into(),
            ));
        }
        self.orientation.validate()?;
        self.watermark.validate()?;
        Ok(())
    }
}

/// Height/width ratio thresholds for orientation classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrientationThresholds {
    /// Ratios strictly above this (and outside the square band) are vertical.
    pub vertical: f64,
    /// Inclusive lower bound of the square band.
    pub square_min: f64,
    /// Inclusive upper bound of the square band.
    pub square_max: f64,
}

impl Default for OrientationThresholds {
    fn default() -> Self {
        Self {
            vertical: 0.85,
            square_min: 0.9,
            square_max: 1.1,
        }
    }
}

impl OrientationThresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        let all = [self.vertical, self.square_min, self.square_max];
        if all.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(ConfigError::Validation(
                "orientation thresholds must be positive numbers".into(),
            ));
        }
        if self.square_min > self.square_max {
            return Err(ConfigError::Validation(
                "orientation.square_min must not exceed orientation.square_max".into(),
            ));
        }
        Ok(())
    }
}

/// Watermark text, font and styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    /// Stamp a watermark in `process` runs. The `watermark` command always does.
    pub enabled: bool,
    /// Large diagonal text across the middle of the image.
    pub brand_text: String,
    /// Small text in the bottom-right corner.
    pub handle_text: String,
    /// TrueType/OpenType font file. When absent, well-known system fonts are tried.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<PathBuf>,
    /// Opacity of the diagonal brand text (0-1).
    pub brand_opacity: f32,
    /// Opacity of the corner handle text (0-1).
    pub handle_opacity: f32,
    /// Rotation of the brand text in degrees; negative tilts it upward to the right.
    pub angle: f32,
    /// Distance of the handle text from the right and bottom edges, in pixels.
    pub inset: u32,
    /// Brand font size is `floor(width / brand_divisor)`.
    pub brand_divisor: u32,
    /// Handle font size is `floor(width / handle_divisor)`.
    pub handle_divisor: u32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            brand_text: "JEFFREY YANG PHOTOGRAPHY".to_string(),
            handle_text: "@shotswithjeff".to_string(),
            font: None,
            brand_opacity: 0.3,
            handle_opacity: 0.7,
            angle: -30.0,
            inset: 20,
            brand_divisor: 15,
            handle_divisor: 50,
        }
    }
}

impl WatermarkConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.brand_divisor == 0 || self.handle_divisor == 0 {
            return Err(ConfigError::Validation(
                "watermark font divisors must be non-zero".into(),
            ));
        }
        for (name, value) in [
            ("brand_opacity", self.brand_opacity),
            ("handle_opacity", self.handle_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "watermark.{name} must be between 0 and 1"
                )));
            }
        }
        if !self.angle.is_finite() {
            return Err(ConfigError::Validation(
                "watermark.angle must be a finite number".into(),
            ));
        }
        Ok(())
    }
}

/// Settings for the printed draft manifest entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    /// Site path the published directory is served under.
    pub image_prefix: String,
    /// How many sample entries to print per category after a `process` run.
    pub samples_per_category: usize,
    /// Price printed in each entry, when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u32>,
    /// Print size printed in each entry, when set (e.g. `16x20"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            image_prefix: "/photography".to_string(),
            samples_per_category: 2,
            price: None,
            dimensions: None,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path`, falling back to stock defaults if it
/// does not exist.
///
/// Returns `Err` if the file exists but is invalid TOML, has unknown keys,
/// or fails validation.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let overlay = if path.exists() {
        let content = fs::read_to_string(path)?;
        Some(toml::from_str::<toml::Value>(&content)?)
    } else {
        None
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `darkroom.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# darkroom configuration
# =====================
# Every key is optional; omitted keys keep the defaults shown here.

# Longest edge of published images, in pixels. Smaller originals are never enlarged.
max_dimension = 2500

# JPEG quality for published images (1-100).
quality = 85

# Category subdirectories of the originals root, processed in this order.
# Missing directories are skipped.
categories = ["nature", "cars"]

[orientation]
# height/width ratio above this is "vertical" (unless it falls in the square band).
vertical = 0.85
# height/width inside [square_min, square_max] is "square".
square_min = 0.9
square_max = 1.1

[watermark]
# Stamp the watermark during `process` runs.
enabled = true
brand_text = "JEFFREY YANG PHOTOGRAPHY"
handle_text = "@shotswithjeff"
# Font file for the watermark text. Defaults to the first bold sans-serif
# system font found (DejaVu, Liberation, Arial).
# font = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"
brand_opacity = 0.3
handle_opacity = 0.7
# Rotation of the diagonal brand text, in degrees.
angle = -30.0
# Distance of the handle from the bottom-right corner, in pixels.
inset = 20
# Font sizes scale with the published width: floor(width / divisor).
brand_divisor = 15
handle_divisor = 50

[manifest]
# Site path the publish directory is served under.
image_prefix = "/photography"
# Sample gallery entries printed per category after `process`.
samples_per_category = 2
# Optional fields copied into every printed entry.
# price = 150
# dimensions = "16x20\""
"##
}
