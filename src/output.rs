//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Each image leads with its positional index and file name; measurements
//! follow as indented context lines. Category headers carry the image count
//! so the output reads as an inventory of what was published.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! nature (2 images)
//!     001 IMG_2610.JPG → IMG_2610.jpg
//!         Original: 4000x3000 (4:3) 4.12 MB
//!         Orientation: horizontal
//!         Resized: 2500x1875 0.98 MB
//!         Watermark: added
//!         Saved: 3.14 MB (76.2%)
//!     002 broken.jpg
//!         Error: could not read image: ...
//! cars: skipped (no images)
//!
//! Summary
//! Processed: 1/2
//! Failed: 1
//! By orientation:
//!     Horizontal: 1
//!     Vertical: 0
//!     Square: 0
//! By category:
//!     nature: 1
//! ```
//!
//! ## Watermark
//!
//! ```text
//! public/photography (12 photos)
//!     001 IMG_2610.jpg
//!         ...
//!         Backup: created
//!
//! Watermarked 12/12 photos
//! Originals backed up as .backup
//!     To restore: find public/photography -name "*.backup" ...
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::batch::{BatchOutcome, BatchReport, BatchSummary, ProcessEvent, SkipReason};
use crate::manifest::{self, EntryFailure, ManifestEntry};
use crate::process::{ProcessedImage, RotatedImage};
use crate::publish::BackupStatus;
use crate::types::Orientation;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Byte count as megabytes with two decimals: `4.12 MB`.
pub fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Percentage of `original` saved by shrinking to `output`.
///
/// Negative when the output grew. Zero for an empty original.
pub fn saved_percent(original: u64, output: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - output as f64) / original as f64 * 100.0
}

fn format_saved(original: u64, output: u64) -> String {
    let saved = original as i64 - output as i64;
    let mb = saved as f64 / (1024.0 * 1024.0);
    format!("{:.2} MB ({:.1}%)", mb, saved_percent(original, output))
}

fn skip_reason(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::Missing => "directory not found",
        SkipReason::Empty => "no images",
        SkipReason::Unreadable => "directory unreadable",
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Progress events
// ============================================================================

/// Context lines for one published image.
fn image_detail_lines(image: &ProcessedImage) -> Vec<String> {
    let detail = indent(2);
    let mut lines = vec![
        format!(
            "{detail}Original: {} ({}) {}",
            image.original_size,
            image.aspect_ratio,
            format_mb(image.original_bytes)
        ),
        format!("{detail}Orientation: {}", image.orientation),
    ];
    if image.was_resized() {
        lines.push(format!(
            "{detail}Resized: {} {}",
            image.resized_size,
            format_mb(image.output_bytes)
        ));
    } else {
        lines.push(format!(
            "{detail}Kept: {} {}",
            image.resized_size,
            format_mb(image.output_bytes)
        ));
    }
    if image.watermarked {
        lines.push(format!("{detail}Watermark: added"));
    }
    lines.push(format!(
        "{detail}Saved: {}",
        format_saved(image.original_bytes, image.output_bytes)
    ));
    if let Some(status) = image.backup {
        let status = match status {
            BackupStatus::Created => "created",
            BackupStatus::AlreadyPresent => "kept existing",
        };
        lines.push(format!("{detail}Backup: {status}"));
    }
    lines
}

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::CategoryStarted {
            category,
            image_count,
        } => vec![format!(
            "{} ({})",
            category,
            plural(*image_count, "image", "images")
        )],
        ProcessEvent::CategorySkipped { category, reason } => {
            vec![format!("{}: skipped ({})", category, skip_reason(*reason))]
        }
        ProcessEvent::DirectoryStarted { path, image_count } => vec![format!(
            "{} ({})",
            path.display(),
            plural(*image_count, "photo", "photos")
        )],
        ProcessEvent::ImageProcessed { index, image, .. } => {
            let header = if image.filename == image.source_name {
                format!("{}{} {}", indent(1), format_index(*index), image.filename)
            } else {
                format!(
                    "{}{} {} \u{2192} {}",
                    indent(1),
                    format_index(*index),
                    image.source_name,
                    image.filename
                )
            };
            let mut lines = vec![header];
            lines.extend(image_detail_lines(image));
            lines
        }
        ProcessEvent::ImageFailed {
            index,
            filename,
            cause,
            ..
        } => vec![
            format!("{}{} {}", indent(1), format_index(*index), filename),
            format!("{}Error: {}", indent(2), cause),
        ],
    }
}

/// Print a progress event; failures go to stderr.
pub fn print_process_event(event: &ProcessEvent) {
    let lines = format_process_event(event);
    if matches!(event, ProcessEvent::ImageFailed { .. }) {
        for line in lines {
            eprintln!("{}", line);
        }
    } else {
        for line in lines {
            println!("{}", line);
        }
    }
}

// ============================================================================
// Batch results
// ============================================================================

/// Format the end-of-run summary: totals, orientation and category counts.
pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    let mut lines = vec![
        "Summary".to_string(),
        format!("Processed: {}/{}", summary.processed, summary.total),
    ];
    if summary.failed > 0 {
        lines.push(format!("Failed: {}", summary.failed));
    }
    lines.push("By orientation:".to_string());
    for orientation in Orientation::ALL {
        let label = match orientation {
            Orientation::Horizontal => "Horizontal",
            Orientation::Vertical => "Vertical",
            Orientation::Square => "Square",
        };
        lines.push(format!(
            "{}{}: {}",
            indent(1),
            label,
            summary.orientation_count(orientation)
        ));
    }
    if !summary.by_category.is_empty() {
        lines.push("By category:".to_string());
        for (category, count) in &summary.by_category {
            lines.push(format!("{}{}: {}", indent(1), category, count));
        }
    }
    lines
}

/// Format the "nothing to do" call-out, with a hint where originals go.
pub fn format_no_input(outcome: &BatchOutcome) -> Vec<String> {
    let BatchOutcome::NoInput {
        searched,
        created_source_root,
        ..
    } = outcome
    else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    if *created_source_root {
        if let Some(root) = searched.first() {
            lines.push(format!("Created source directory: {}", root.display()));
        }
    }
    lines.push("No images found.".to_string());
    let places: Vec<String> = searched
        .iter()
        .map(|p| format!("{}/", p.display()))
        .collect();
    if !places.is_empty() {
        lines.push(format!("{}Add images to: {}", indent(1), places.join(" or ")));
    }
    lines
}

/// Format the result of a `process` run: summary, then draft gallery records.
pub fn format_process_report(
    report: &BatchReport,
    samples: &[(String, Vec<ManifestEntry>)],
    publish_root: &Path,
) -> Vec<String> {
    let mut lines = vec![String::new()];
    lines.extend(format_batch_summary(&report.summary));
    lines.push(String::new());
    lines.push(format!("Published to {}/", publish_root.display()));

    if !samples.is_empty() {
        lines.push(String::new());
        lines.push("Sample gallery entries:".to_string());
        lines.push(String::new());
        lines.extend(
            manifest::format_samples(samples)
                .lines()
                .map(str::to_string),
        );
    }
    lines
}

pub fn print_process_report(
    report: &BatchReport,
    samples: &[(String, Vec<ManifestEntry>)],
    publish_root: &Path,
) {
    for line in format_process_report(report, samples, publish_root) {
        println!("{}", line);
    }
}

/// Format the result of a `watermark` run with a restore hint.
pub fn format_watermark_report(report: &BatchReport, dir: &Path) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "Watermarked {}/{} photos",
            report.summary.processed, report.summary.total
        ),
    ];
    if report.successes().any(|r| r.backup.is_some()) {
        lines.push("Originals backed up as .backup".to_string());
        lines.push(format!(
            "{}To restore: find {} -name \"*.backup\" -exec sh -c 'mv \"$0\" \"${{0%.backup}}\"' {{}} \\;",
            indent(1),
            dir.display()
        ));
    }
    lines
}

pub fn print_watermark_report(report: &BatchReport, dir: &Path) {
    for line in format_watermark_report(report, dir) {
        println!("{}", line);
    }
}

pub fn print_no_input(outcome: &BatchOutcome) {
    for line in format_no_input(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Rotate and entries
// ============================================================================

pub fn format_rotate_result(rotated: &RotatedImage) -> Vec<String> {
    let name = rotated
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| rotated.path.display().to_string());
    vec![format!(
        "{} rotated {} ({} \u{2192} {})",
        name, rotated.rotation, rotated.before, rotated.after
    )]
}

pub fn print_rotate_result(rotated: &RotatedImage) {
    for line in format_rotate_result(rotated) {
        println!("{}", line);
    }
}

/// Gallery records for published files, comma-separated and ready to paste.
/// Unreadable files are listed as comments so the output stays pasteable.
pub fn format_entries(entries: &[ManifestEntry], failures: &[EntryFailure]) -> Vec<String> {
    let mut lines: Vec<String> = entries
        .iter()
        .flat_map(|e| {
            manifest::format_entry(e)
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();
    for failure in failures {
        lines.push(format!("// skipped {}: {}", failure.filename, failure.error));
    }
    if entries.is_empty() && failures.is_empty() {
        lines.push("// no matching photos".to_string());
    }
    lines
}

pub fn print_entries(entries: &[ManifestEntry], failures: &[EntryFailure]) {
    for line in format_entries(entries, failures) {
        println!("{}", line);
    }
}
