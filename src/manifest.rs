//! Draft gallery records for the site's photo list.
//!
//! Nothing here writes files; records are rendered as text for the user to
//! paste into the gallery source:
//!
//! ```text
//!   {
//!     id: 'nature-1',
//!     title: 'IMG 2610',
//!     category: 'nature',
//!     imagePath: '/photography/IMG_2610.jpg',
//!     orientation: 'horizontal',
//!     available: true,
//!   },
//! ```
//!
//! Two sources feed records: the results of a `process` run
//! ([`sample_entries`]) and already-published JPEGs probed on disk
//! ([`published_entries`]).

use crate::batch::{self, BatchError, BatchReport};
use crate::config::{ManifestConfig, PipelineConfig};
use crate::imaging::{ImageBackend, classify_orientation};
use crate::naming;
use crate::process::ProcessError;
use crate::types::Orientation;
use std::fmt::Write as _;
use std::path::Path;

/// One gallery record.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub id: String,
    pub title: String,
    pub category: String,
    pub image_path: String,
    pub orientation: Orientation,
    pub price: Option<u32>,
    pub dimensions: Option<String>,
}

impl ManifestEntry {
    /// Build the record for the `index`th (1-based) file of `category`.
    pub fn new(
        category: &str,
        index: usize,
        filename: &str,
        orientation: Orientation,
        config: &ManifestConfig,
    ) -> Self {
        Self {
            id: format!("{category}-{index}"),
            title: naming::display_title(filename),
            category: category.to_string(),
            image_path: image_path(&config.image_prefix, filename),
            orientation,
            price: config.price,
            dimensions: config.dimensions.clone(),
        }
    }
}

fn image_path(prefix: &str, filename: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    format!("{prefix}/{filename}")
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Render one record as an object literal followed by a comma.
pub fn format_entry(entry: &ManifestEntry) -> String {
    let mut out = String::from("  {\n");
    let _ = writeln!(out, "    id: {},", quote(&entry.id));
    let _ = writeln!(out, "    title: {},", quote(&entry.title));
    let _ = writeln!(out, "    category: {},", quote(&entry.category));
    let _ = writeln!(out, "    imagePath: {},", quote(&entry.image_path));
    if let Some(price) = entry.price {
        let _ = writeln!(out, "    price: {price},");
    }
    if let Some(dimensions) = &entry.dimensions {
        let _ = writeln!(out, "    dimensions: {},", quote(dimensions));
    }
    let _ = writeln!(out, "    orientation: {},", quote(entry.orientation.as_str()));
    out.push_str("    available: true,\n  },");
    out
}

/// The first `samples_per_category` successes of each category, in
/// configured category order. Categories without successes are omitted.
pub fn sample_entries(
    report: &BatchReport,
    categories: &[String],
    config: &ManifestConfig,
) -> Vec<(String, Vec<ManifestEntry>)> {
    categories
        .iter()
        .filter_map(|category| {
            let entries: Vec<_> = report
                .successes()
                .filter(|image| image.category.as_deref() == Some(category.as_str()))
                .take(config.samples_per_category)
                .enumerate()
                .map(|(i, image)| {
                    ManifestEntry::new(category, i + 1, &image.filename, image.orientation, config)
                })
                .collect();
            (!entries.is_empty()).then(|| (category.clone(), entries))
        })
        .collect()
}

/// Render grouped samples with a `// CATEGORY` heading per group.
pub fn format_samples(samples: &[(String, Vec<ManifestEntry>)]) -> String {
    let mut out = String::new();
    for (category, entries) in samples {
        let _ = writeln!(out, "// {}", category.to_uppercase());
        for entry in entries {
            let _ = writeln!(out, "{}", format_entry(entry));
        }
        out.push('\n');
    }
    out
}

/// A published file that could not be probed.
#[derive(Debug)]
pub struct EntryFailure {
    pub filename: String,
    pub error: ProcessError,
}

/// Probe every published JPEG in `dir` matching `prefixes` and build a
/// record for each, numbered in file-name order.
///
/// Unreadable files are returned as failures and do not consume an id.
pub fn published_entries(
    backend: &impl ImageBackend,
    dir: &Path,
    category: &str,
    prefixes: &[String],
    config: &PipelineConfig,
) -> Result<(Vec<ManifestEntry>, Vec<EntryFailure>), BatchError> {
    let mut entries = Vec::new();
    let mut failures = Vec::new();

    for path in batch::published_images(dir, prefixes)? {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match backend.probe(&path) {
            Ok(meta) => {
                let orientation =
                    classify_orientation(meta.width, meta.height, &config.orientation);
                entries.push(ManifestEntry::new(
                    category,
                    entries.len() + 1,
                    &filename,
                    orientation,
                    &config.manifest,
                ));
            }
            Err(e) => failures.push(EntryFailure {
                filename,
                error: ProcessError::Probe(e),
            }),
        }
    }

    Ok((entries, failures))
}
