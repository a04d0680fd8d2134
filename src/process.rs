//! Per-image transform pipeline.
//!
//! One call to [`process_image`] takes a single original from disk to a
//! published JPEG:
//!
//! ```text
//! probe ─► classify + aspect ─► plan resize ─► render ─► backup? ─► stage ─► commit
//!          (source dims)        (max edge)     resize
//!                                              watermark
//!                                              encode
//! ```
//!
//! Every run mode is the same pipeline with different [`PipelineOptions`]:
//!
//! | Mode | max edge | watermark | backup | destination |
//! |---|---|---|---|---|
//! | `process` | `max_dimension` | if enabled | no | publish dir |
//! | `watermark` | none | yes | yes | the file itself |
//!
//! ## Failure Semantics
//!
//! Any error is returned as a [`ProcessFailure`] carrying the file name; the
//! caller records it and moves on. The destination only ever changes through
//! an atomic rename of fully written bytes (see [`crate::publish`]), so a
//! failure at any step leaves it exactly as it was.

use crate::config::{OrientationThresholds, PipelineConfig, WatermarkConfig};
use crate::imaging::{
    BackendError, ImageBackend, Quality, RenderParams, ResizePlan, RotateParams, Rotation,
    aspect_ratio_string, classify_orientation, compose_watermark, plan_resize,
};
use crate::publish::{self, BackupStatus, PublishError};
use crate::types::{Dimensions, Orientation};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("could not read image: {0}")]
    Probe(#[source] BackendError),
    #[error("could not transform image: {0}")]
    Transform(#[source] BackendError),
    #[error("could not publish image: {0}")]
    Publish(#[from] PublishError),
}

/// A file the pipeline gave up on, with the reason.
#[derive(Debug)]
pub struct ProcessFailure {
    pub filename: String,
    pub error: ProcessError,
}

impl fmt::Display for ProcessFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.filename, self.error)
    }
}

impl std::error::Error for ProcessFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// How the pipeline treats each image.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Longest allowed edge; `None` keeps source dimensions.
    pub max_dimension: Option<u32>,
    pub quality: Quality,
    pub orientation: OrientationThresholds,
    /// Watermark styling; `None` publishes without a watermark.
    pub watermark: Option<WatermarkConfig>,
    /// Copy the source to `<source>.backup` before publishing.
    pub backup: bool,
}

impl PipelineOptions {
    /// Options for the `process` command: resize, watermark if enabled.
    pub fn resize_and_watermark(config: &PipelineConfig) -> Self {
        Self {
            max_dimension: Some(config.max_dimension),
            quality: Quality::new(config.quality),
            orientation: config.orientation.clone(),
            watermark: config
                .watermark
                .enabled
                .then(|| config.watermark.clone()),
            backup: false,
        }
    }

    /// Options for the `watermark` command: in-place, no resize, with backup.
    pub fn watermark_only(config: &PipelineConfig) -> Self {
        Self {
            max_dimension: None,
            quality: Quality::new(config.quality),
            orientation: config.orientation.clone(),
            watermark: Some(config.watermark.clone()),
            backup: true,
        }
    }

    pub fn without_watermark(mut self) -> Self {
        self.watermark = None;
        self
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }
}

/// Outcome of one successfully published image.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
    /// Published file name (always `.jpg`).
    pub filename: String,
    /// Original file name as found in the source directory.
    pub source_name: String,
    pub category: Option<String>,
    pub orientation: Orientation,
    /// Reduced `W:H` of the source.
    pub aspect_ratio: String,
    pub original_size: Dimensions,
    pub resized_size: Dimensions,
    pub original_bytes: u64,
    pub output_bytes: u64,
    pub watermarked: bool,
    /// Set when backup mode was active.
    pub backup: Option<BackupStatus>,
}

impl ProcessedImage {
    pub fn was_resized(&self) -> bool {
        self.original_size != self.resized_size
    }
}

/// File name of `path` for reports, falling back to the whole path.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Run the full pipeline for one image.
///
/// `destination` may equal `source` for in-place edits; the source is read
/// completely before the destination is replaced.
pub fn process_image(
    backend: &impl ImageBackend,
    source: &Path,
    destination: &Path,
    category: Option<&str>,
    options: &PipelineOptions,
) -> Result<ProcessedImage, ProcessFailure> {
    run_pipeline(backend, source, destination, category, options).map_err(|error| {
        ProcessFailure {
            filename: file_name(source),
            error,
        }
    })
}

fn run_pipeline(
    backend: &impl ImageBackend,
    source: &Path,
    destination: &Path,
    category: Option<&str>,
    options: &PipelineOptions,
) -> Result<ProcessedImage, ProcessError> {
    let meta = backend.probe(source).map_err(ProcessError::Probe)?;

    let orientation = classify_orientation(meta.width, meta.height, &options.orientation);
    let aspect_ratio = aspect_ratio_string(meta.width, meta.height);

    let plan = match options.max_dimension {
        Some(max) => plan_resize(meta.width, meta.height, max),
        None => ResizePlan {
            width: meta.width,
            height: meta.height,
        },
    };

    let watermark = options
        .watermark
        .as_ref()
        .map(|config| compose_watermark(plan.width, plan.height, config));
    let watermarked = watermark.is_some();

    let bytes = backend
        .render(&RenderParams {
            source: source.to_path_buf(),
            width: plan.width,
            height: plan.height,
            quality: options.quality,
            watermark,
        })
        .map_err(ProcessError::Transform)?;

    let backup = if options.backup {
        Some(publish::ensure_backup(source)?)
    } else {
        None
    };

    publish::stage(destination, &bytes)?.commit()?;

    Ok(ProcessedImage {
        filename: file_name(destination),
        source_name: file_name(source),
        category: category.map(str::to_string),
        orientation,
        aspect_ratio,
        original_size: meta.dimensions(),
        resized_size: plan.dimensions(),
        original_bytes: meta.byte_size,
        output_bytes: bytes.len() as u64,
        watermarked,
        backup,
    })
}

/// Result of rotating a single file in place.
#[derive(Debug, Clone, PartialEq)]
pub struct RotatedImage {
    pub path: PathBuf,
    pub rotation: Rotation,
    pub before: Dimensions,
    pub after: Dimensions,
}

/// Rotate `path` clockwise by `rotation` and atomically replace it.
pub fn rotate_file(
    backend: &impl ImageBackend,
    path: &Path,
    rotation: Rotation,
    quality: Quality,
) -> Result<RotatedImage, ProcessError> {
    let meta = backend.probe(path).map_err(ProcessError::Probe)?;
    let bytes = backend
        .rotate(&RotateParams {
            source: path.to_path_buf(),
            rotation,
            quality,
        })
        .map_err(ProcessError::Transform)?;
    publish::publish(path, &bytes)?;

    let before = meta.dimensions();
    let after = match rotation {
        Rotation::Cw180 => before,
        Rotation::Cw90 | Rotation::Cw270 => Dimensions::new(before.height, before.width),
    };
    Ok(RotatedImage {
        path: path.to_path_buf(),
        rotation,
        before,
        after,
    })
}
