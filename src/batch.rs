//! Batch driver: walks the source tree and runs the pipeline on every image.
//!
//! ## Source Layout
//!
//! ```text
//! originals/                 ← source root
//! ├── nature/                ← one directory per configured category
//! │   ├── IMG_2610.JPG
//! │   └── dunes.tiff
//! └── cars/
//!     └── R6__5123.jpg
//! ```
//!
//! Every supported image (see [`is_supported_image`]) in a category directory
//! is published to `publish_root/<stem>.jpg`. Categories are visited in
//! configured order; files inside a category in file-name order.
//!
//! ## Outcomes
//!
//! - Missing or image-less categories are skipped and reported, not errors.
//! - Per-file failures are collected next to the successes; the batch always
//!   finishes.
//! - No images at all is [`BatchOutcome::NoInput`], and the publish directory
//!   is not created.
//! - Only a missing directory in watermark-only mode aborts the run
//!   ([`BatchError::SourceRootMissing`]).
//!
//! Progress is reported as [`ProcessEvent`]s over an optional channel; the
//! driver never prints.

use crate::config::PipelineConfig;
use crate::imaging::{ImageBackend, is_supported_image};
use crate::naming;
use crate::process::{
    PipelineOptions, ProcessError, ProcessFailure, ProcessedImage, file_name, process_image,
};
use crate::publish::PublishError;
use crate::types::Orientation;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Source directory not found: {0}")]
    SourceRootMissing(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot list {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Why a category contributed no images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The category directory does not exist.
    Missing,
    /// The directory exists but holds no supported images.
    Empty,
    /// The directory exists but could not be listed.
    Unreadable,
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    CategoryStarted {
        category: String,
        image_count: usize,
    },
    CategorySkipped {
        category: String,
        reason: SkipReason,
    },
    DirectoryStarted {
        path: PathBuf,
        image_count: usize,
    },
    ImageProcessed {
        index: usize,
        total: usize,
        image: ProcessedImage,
    },
    ImageFailed {
        index: usize,
        total: usize,
        filename: String,
        category: Option<String>,
        cause: String,
    },
}

/// Counts derived from a finished batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Files the pipeline was run on.
    pub total: usize,
    /// Files published successfully.
    pub processed: usize,
    pub failed: usize,
    pub by_orientation: BTreeMap<Orientation, usize>,
    /// Successful files per category, in first-seen order.
    pub by_category: Vec<(String, usize)>,
}

impl BatchSummary {
    /// Group a finished result list. Only successes are counted per
    /// orientation and category.
    pub fn from_results(results: &[Result<ProcessedImage, ProcessFailure>]) -> Self {
        let mut by_orientation = BTreeMap::new();
        let mut by_category: Vec<(String, usize)> = Vec::new();
        let mut processed = 0;

        for image in results.iter().filter_map(|r| r.as_ref().ok()) {
            processed += 1;
            *by_orientation.entry(image.orientation).or_insert(0) += 1;
            if let Some(category) = &image.category {
                match by_category.iter_mut().find(|(c, _)| c == category) {
                    Some((_, count)) => *count += 1,
                    None => by_category.push((category.clone(), 1)),
                }
            }
        }

        Self {
            total: results.len(),
            processed,
            failed: results.len() - processed,
            by_orientation,
            by_category,
        }
    }

    pub fn orientation_count(&self, orientation: Orientation) -> usize {
        self.by_orientation.get(&orientation).copied().unwrap_or(0)
    }

    pub fn category_count(&self, category: &str) -> usize {
        self.by_category
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Everything a completed batch produced.
#[derive(Debug)]
pub struct BatchReport {
    /// One entry per input file, in processing order.
    pub results: Vec<Result<ProcessedImage, ProcessFailure>>,
    pub skipped: Vec<(String, SkipReason)>,
    pub summary: BatchSummary,
}

impl BatchReport {
    fn new(
        results: Vec<Result<ProcessedImage, ProcessFailure>>,
        skipped: Vec<(String, SkipReason)>,
    ) -> Self {
        let summary = BatchSummary::from_results(&results);
        Self {
            results,
            skipped,
            summary,
        }
    }

    pub fn successes(&self) -> impl Iterator<Item = &ProcessedImage> {
        self.results.iter().filter_map(|r| r.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProcessFailure> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }
}

/// How a batch ended.
#[derive(Debug)]
pub enum BatchOutcome {
    /// No input images were found anywhere.
    NoInput {
        /// Directories that were searched.
        searched: Vec<PathBuf>,
        skipped: Vec<(String, SkipReason)>,
        /// The source root did not exist and was created.
        created_source_root: bool,
    },
    Completed(BatchReport),
}

impl BatchOutcome {
    pub fn report(&self) -> Option<&BatchReport> {
        match self {
            BatchOutcome::Completed(report) => Some(report),
            BatchOutcome::NoInput { .. } => None,
        }
    }
}

fn emit(events: Option<&Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is watching.
        let _ = tx.send(event);
    }
}

/// Supported images directly inside `dir`, sorted by file name.
///
/// Symlinks are followed. An entry that cannot be inspected (a dangling
/// link, say) is still listed when its name matches, so the pipeline
/// reports it as a failed file. Only failing to list `dir` itself is an
/// error.
fn list_images(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && keep(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            Err(err) if err.path().is_some_and(|p| p != dir) => {
                if let Some(path) = err.path().filter(|p| keep(*p)) {
                    files.push(path.to_path_buf());
                }
            }
            Err(source) => {
                return Err(BatchError::Walk {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Per-file loop shared by both batch modes.
///
/// Collects results in order and remembers which source published each
/// destination, so a second source mapping to the same file fails instead
/// of overwriting the first.
struct FileRunner<'a, B> {
    backend: &'a B,
    options: &'a PipelineOptions,
    events: Option<&'a Sender<ProcessEvent>>,
    total: usize,
    results: Vec<Result<ProcessedImage, ProcessFailure>>,
    claimed: HashMap<PathBuf, PathBuf>,
}

impl<'a, B: ImageBackend> FileRunner<'a, B> {
    fn new(
        backend: &'a B,
        options: &'a PipelineOptions,
        events: Option<&'a Sender<ProcessEvent>>,
        total: usize,
    ) -> Self {
        Self {
            backend,
            options,
            events,
            total,
            results: Vec::with_capacity(total),
            claimed: HashMap::new(),
        }
    }

    fn run(&mut self, source: &Path, destination: &Path, category: Option<&str>) {
        let index = self.results.len() + 1;
        let result = match self.claimed.get(destination) {
            Some(first) => Err(ProcessFailure {
                filename: file_name(source),
                error: ProcessError::Publish(PublishError::Collision {
                    destination: destination.to_path_buf(),
                    first: first.clone(),
                }),
            }),
            None => {
                let result =
                    process_image(self.backend, source, destination, category, self.options);
                if result.is_ok() {
                    self.claimed
                        .insert(destination.to_path_buf(), source.to_path_buf());
                }
                result
            }
        };

        match &result {
            Ok(image) => emit(
                self.events,
                ProcessEvent::ImageProcessed {
                    index,
                    total: self.total,
                    image: image.clone(),
                },
            ),
            Err(failure) => emit(
                self.events,
                ProcessEvent::ImageFailed {
                    index,
                    total: self.total,
                    filename: failure.filename.clone(),
                    category: category.map(str::to_string),
                    cause: failure.error.to_string(),
                },
            ),
        }
        self.results.push(result);
    }
}

/// Resize and watermark every category under `source_root` into `publish_root`.
///
/// A missing source root is created (so the user has somewhere to put
/// originals) and reported as [`BatchOutcome::NoInput`].
pub fn run(
    backend: &impl ImageBackend,
    source_root: &Path,
    publish_root: &Path,
    config: &PipelineConfig,
    options: &PipelineOptions,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchOutcome, BatchError> {
    let events = events.as_ref();

    if !source_root.is_dir() {
        fs::create_dir_all(source_root)?;
        return Ok(BatchOutcome::NoInput {
            searched: vec![source_root.to_path_buf()],
            skipped: Vec::new(),
            created_source_root: true,
        });
    }

    // Discover everything first so totals are known before any work starts.
    let mut plan: Vec<(String, Vec<PathBuf>)> = Vec::new();
    let mut skipped = Vec::new();
    for category in &config.categories {
        let dir = source_root.join(category);
        if !dir.is_dir() {
            skipped.push((category.clone(), SkipReason::Missing));
            continue;
        }
        match list_images(&dir, is_supported_image) {
            Ok(files) if files.is_empty() => skipped.push((category.clone(), SkipReason::Empty)),
            Ok(files) => plan.push((category.clone(), files)),
            Err(_) => skipped.push((category.clone(), SkipReason::Unreadable)),
        }
    }

    for (category, reason) in &skipped {
        emit(
            events,
            ProcessEvent::CategorySkipped {
                category: category.clone(),
                reason: *reason,
            },
        );
    }

    let total: usize = plan.iter().map(|(_, files)| files.len()).sum();
    if total == 0 {
        return Ok(BatchOutcome::NoInput {
            searched: config
                .categories
                .iter()
                .map(|c| source_root.join(c))
                .collect(),
            skipped,
            created_source_root: false,
        });
    }

    fs::create_dir_all(publish_root)?;

    let mut runner = FileRunner::new(backend, options, events, total);
    for (category, files) in plan {
        emit(
            events,
            ProcessEvent::CategoryStarted {
                category: category.clone(),
                image_count: files.len(),
            },
        );
        for source in files {
            let destination = publish_root.join(naming::published_file_name(&source));
            runner.run(&source, &destination, Some(&category));
        }
    }

    Ok(BatchOutcome::Completed(BatchReport::new(
        runner.results,
        skipped,
    )))
}

/// Watermark every JPEG in `dir` in place, keeping `.backup` copies.
///
/// `.backup` files themselves are never picked up.
pub fn watermark_directory(
    backend: &impl ImageBackend,
    dir: &Path,
    options: &PipelineOptions,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchOutcome, BatchError> {
    let events = events.as_ref();

    if !dir.is_dir() {
        return Err(BatchError::SourceRootMissing(dir.to_path_buf()));
    }

    let files = list_images(dir, naming::is_jpeg)?;
    if files.is_empty() {
        return Ok(BatchOutcome::NoInput {
            searched: vec![dir.to_path_buf()],
            skipped: Vec::new(),
            created_source_root: false,
        });
    }

    emit(
        events,
        ProcessEvent::DirectoryStarted {
            path: dir.to_path_buf(),
            image_count: files.len(),
        },
    );

    let mut runner = FileRunner::new(backend, options, events, files.len());
    for path in &files {
        runner.run(path, path, None);
    }

    Ok(BatchOutcome::Completed(BatchReport::new(
        runner.results,
        Vec::new(),
    )))
}

/// Published JPEGs in `dir` whose names start with any of `prefixes`
/// (all of them when `prefixes` is empty), sorted by name.
pub fn published_images(dir: &Path, prefixes: &[String]) -> Result<Vec<PathBuf>, BatchError> {
    if !dir.is_dir() {
        return Err(BatchError::SourceRootMissing(dir.to_path_buf()));
    }
    list_images(dir, |path| {
        naming::is_jpeg(path)
            && (prefixes.is_empty()
                || path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| prefixes.iter().any(|p| name.starts_with(p.as_str()))))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MOCK_JPEG, MockBackend};
    use crate::imaging::backend::tests::RecordedOp;
    use crate::publish::{BackupStatus, backup_path};
    use crate::types::Dimensions;
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"original").unwrap();
    }

    fn config(categories: &[&str]) -> PipelineConfig {
        PipelineConfig {
            categories: categories.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    fn run_mock(
        backend: &MockBackend,
        tmp: &TempDir,
        config: &PipelineConfig,
    ) -> (BatchOutcome, Vec<ProcessEvent>) {
        let (tx, rx) = mpsc::channel();
        let outcome = run(
            backend,
            &tmp.path().join("originals"),
            &tmp.path().join("publish"),
            config,
            &PipelineOptions::resize_and_watermark(config),
            Some(tx),
        )
        .unwrap();
        (outcome, rx.try_iter().collect())
    }

    fn completed(outcome: BatchOutcome) -> BatchReport {
        match outcome {
            BatchOutcome::Completed(report) => report,
            other => panic!("expected completed batch, got {other:?}"),
        }
    }

    #[test]
    fn end_to_end_dimensions_and_classification() {
        let tmp = TempDir::new().unwrap();
        let originals = tmp.path().join("originals");
        touch(&originals.join("nature/big.jpg"));
        touch(&originals.join("nature/small.png"));
        touch(&originals.join("cars/tall.tiff"));
        let backend = MockBackend::with_images(&[
            ("big.jpg", 4000, 3000),
            ("small.png", 1200, 1200),
            ("tall.tiff", 3000, 3600),
        ]);

        let (outcome, _) = run_mock(&backend, &tmp, &config(&["nature", "cars"]));
        let report = completed(outcome);

        let by_name = |name: &str| {
            report
                .successes()
                .find(|r| r.filename == name)
                .unwrap_or_else(|| panic!("{name} not published"))
                .clone()
        };

        let big = by_name("big.jpg");
        assert_eq!(big.resized_size, Dimensions::new(2500, 1875));
        assert_eq!(big.orientation, Orientation::Horizontal);
        assert_eq!(big.aspect_ratio, "4:3");
        assert_eq!(big.category.as_deref(), Some("nature"));

        let small = by_name("small.jpg");
        assert_eq!(small.resized_size, Dimensions::new(1200, 1200));
        assert_eq!(small.orientation, Orientation::Square);
        assert_eq!(small.aspect_ratio, "1:1");

        let tall = by_name("tall.jpg");
        assert_eq!(tall.resized_size, Dimensions::new(2083, 2500));
        assert_eq!(tall.orientation, Orientation::Vertical);

        let publish = tmp.path().join("publish");
        for name in ["big.jpg", "small.jpg", "tall.jpg"] {
            assert_eq!(fs::read(publish.join(name)).unwrap(), MOCK_JPEG);
        }
    }

    #[test]
    fn empty_category_is_skipped_and_totals_stay_correct() {
        let tmp = TempDir::new().unwrap();
        let originals = tmp.path().join("originals");
        fs::create_dir_all(originals.join("nature")).unwrap();
        touch(&originals.join("cars/a.jpg"));
        touch(&originals.join("cars/b.jpg"));
        let backend = MockBackend::with_images(&[("a.jpg", 3000, 2000), ("b.jpg", 2000, 3000)]);

        let (outcome, events) = run_mock(&backend, &tmp, &config(&["nature", "cars"]));
        let report = completed(outcome);

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.processed, 2);
        assert_eq!(report.summary.category_count("cars"), 2);
        assert_eq!(report.summary.category_count("nature"), 0);
        assert_eq!(
            report.skipped,
            vec![("nature".to_string(), SkipReason::Empty)]
        );
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::CategorySkipped { category, reason: SkipReason::Empty } if category == "nature"
        )));
    }

    #[test]
    fn missing_category_is_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("originals/nature/a.jpg"));
        let backend = MockBackend::with_images(&[("a.jpg", 100, 100)]);

        let (outcome, _) = run_mock(&backend, &tmp, &config(&["nature", "cars"]));
        let report = completed(outcome);

        assert_eq!(report.summary.processed, 1);
        assert_eq!(report.skipped, vec![("cars".to_string(), SkipReason::Missing)]);
    }

    #[test]
    fn corrupt_file_among_five_is_isolated() {
        let tmp = TempDir::new().unwrap();
        let originals = tmp.path().join("originals");
        for name in ["1.jpg", "2.jpg", "3.jpg", "4.jpg", "5.jpg"] {
            touch(&originals.join("nature").join(name));
        }
        // 3.jpg has no probe entry: it fails like an undecodable file.
        let backend = MockBackend::with_images(&[
            ("1.jpg", 4000, 3000),
            ("2.jpg", 3000, 4000),
            ("4.jpg", 1000, 1000),
            ("5.jpg", 6000, 4000),
        ]);

        let (outcome, events) = run_mock(&backend, &tmp, &config(&["nature"]));
        let report = completed(outcome);

        assert_eq!(report.summary.total, 5);
        assert_eq!(report.summary.processed, 4);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.category_count("nature"), 4);

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].filename, "3.jpg");
        assert!(matches!(failures[0].error, ProcessError::Probe(_)));

        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::ImageFailed { filename, index: 3, total: 5, .. } if filename == "3.jpg"
        )));
        assert!(!tmp.path().join("publish/3.jpg").exists());
    }

    #[test]
    fn unsupported_extensions_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let originals = tmp.path().join("originals");
        touch(&originals.join("nature/keep.JPG"));
        touch(&originals.join("nature/notes.txt"));
        touch(&originals.join("nature/raw.cr2"));
        touch(&originals.join("nature/old.jpg.backup"));
        fs::create_dir_all(originals.join("nature/nested.jpg")).unwrap();
        let backend = MockBackend::with_images(&[("keep.JPG", 800, 600)]);

        let (outcome, _) = run_mock(&backend, &tmp, &config(&["nature"]));
        let report = completed(outcome);

        assert_eq!(report.summary.total, 1);
        assert_eq!(report.results[0].as_ref().unwrap().filename, "keep.jpg");
    }

    #[test]
    fn files_processed_in_name_order_across_categories() {
        let tmp = TempDir::new().unwrap();
        let originals = tmp.path().join("originals");
        for p in ["nature/c.jpg", "nature/a.jpg", "cars/b.jpg"] {
            touch(&originals.join(p));
        }
        let backend =
            MockBackend::with_images(&[("a.jpg", 10, 10), ("b.jpg", 10, 10), ("c.jpg", 10, 10)]);

        let (outcome, events) = run_mock(&backend, &tmp, &config(&["nature", "cars"]));
        let report = completed(outcome);

        let order: Vec<_> = report
            .successes()
            .map(|r| r.source_name.as_str())
            .collect();
        assert_eq!(order, vec!["a.jpg", "c.jpg", "b.jpg"]);

        let indices: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ProcessEvent::ImageProcessed { index, total, .. } => Some((*index, *total)),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn no_input_does_not_create_publish_dir() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("originals/nature")).unwrap();
        let backend = MockBackend::new();

        let (outcome, _) = run_mock(&backend, &tmp, &config(&["nature", "cars"]));

        match outcome {
            BatchOutcome::NoInput {
                searched,
                skipped,
                created_source_root,
            } => {
                assert_eq!(searched.len(), 2);
                assert_eq!(skipped.len(), 2);
                assert!(!created_source_root);
            }
            other => panic!("expected no input, got {other:?}"),
        }
        assert!(!tmp.path().join("publish").exists());
    }

    #[test]
    fn missing_source_root_is_created() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();

        let (outcome, _) = run_mock(&backend, &tmp, &config(&["nature"]));

        assert!(matches!(
            outcome,
            BatchOutcome::NoInput {
                created_source_root: true,
                ..
            }
        ));
        assert!(tmp.path().join("originals").is_dir());
        assert!(!tmp.path().join("publish").exists());
    }

    #[test]
    fn summary_counts_only_successes() {
        let tmp = TempDir::new().unwrap();
        let originals = tmp.path().join("originals");
        touch(&originals.join("nature/wide.jpg"));
        touch(&originals.join("nature/broken.jpg"));
        touch(&originals.join("cars/tall.jpg"));
        touch(&originals.join("cars/square.jpg"));
        let backend = MockBackend::with_images(&[
            ("wide.jpg", 3000, 2000),
            ("tall.jpg", 2000, 3000),
            ("square.jpg", 2000, 2000),
        ]);

        let (outcome, _) = run_mock(&backend, &tmp, &config(&["nature", "cars"]));
        let summary = completed(outcome).summary;

        assert_eq!(summary.total, 4);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.orientation_count(Orientation::Horizontal), 1);
        assert_eq!(summary.orientation_count(Orientation::Vertical), 1);
        assert_eq!(summary.orientation_count(Orientation::Square), 1);
        assert_eq!(
            summary.by_category,
            vec![("nature".to_string(), 1), ("cars".to_string(), 2)]
        );
    }

    #[test]
    fn same_stem_in_two_categories_fails_the_second() {
        let tmp = TempDir::new().unwrap();
        let originals = tmp.path().join("originals");
        touch(&originals.join("nature/IMG_1.jpg"));
        touch(&originals.join("cars/IMG_1.png"));
        let backend = MockBackend::with_images(&[("IMG_1.jpg", 4000, 3000), ("IMG_1.png", 3000, 4000)]);

        let (outcome, events) = run_mock(&backend, &tmp, &config(&["nature", "cars"]));
        let report = completed(outcome);

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.processed, 1);
        assert_eq!(report.summary.failed, 1);

        let published = report.successes().next().unwrap();
        assert_eq!(published.source_name, "IMG_1.jpg");
        assert_eq!(published.category.as_deref(), Some("nature"));

        let failure = report.failures().next().unwrap();
        assert_eq!(failure.filename, "IMG_1.png");
        match &failure.error {
            ProcessError::Publish(PublishError::Collision { destination, first }) => {
                assert_eq!(destination, &tmp.path().join("publish/IMG_1.jpg"));
                assert_eq!(first, &originals.join("nature/IMG_1.jpg"));
            }
            other => panic!("expected a collision, got {other:?}"),
        }
        let message = failure.to_string();
        assert!(message.contains("IMG_1.png"), "{message}");
        assert!(message.contains("nature/IMG_1.jpg"), "{message}");

        // The second source was never rendered, so the first one's output stands.
        let renders = backend.renders();
        assert_eq!(renders.len(), 1);
        assert!(matches!(&renders[0], RecordedOp::Render { width: 2500, height: 1875, .. }));
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::ImageFailed { filename, category: Some(c), index: 2, .. }
                if filename == "IMG_1.png" && c == "cars"
        )));
    }

    #[test]
    fn failed_first_claimant_leaves_name_free() {
        let tmp = TempDir::new().unwrap();
        let originals = tmp.path().join("originals");
        touch(&originals.join("nature/IMG_1.jpg"));
        touch(&originals.join("cars/IMG_1.png"));
        // Only the png decodes.
        let backend = MockBackend::with_images(&[("IMG_1.png", 3000, 4000)]);

        let (outcome, _) = run_mock(&backend, &tmp, &config(&["nature", "cars"]));
        let report = completed(outcome);

        assert_eq!(report.summary.processed, 1);
        assert_eq!(report.successes().next().unwrap().source_name, "IMG_1.png");
        assert!(matches!(
            report.failures().next().unwrap().error,
            ProcessError::Probe(_)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_photo_is_processed() {
        let tmp = TempDir::new().unwrap();
        let library = tmp.path().join("library/dunes.jpg");
        touch(&library);
        let nature = tmp.path().join("originals/nature");
        fs::create_dir_all(&nature).unwrap();
        std::os::unix::fs::symlink(&library, nature.join("dunes.jpg")).unwrap();
        let backend = MockBackend::with_images(&[("dunes.jpg", 3000, 2000)]);

        let (outcome, _) = run_mock(&backend, &tmp, &config(&["nature"]));
        let report = completed(outcome);

        assert_eq!(report.summary.processed, 1);
        assert!(tmp.path().join("publish/dunes.jpg").exists());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_a_per_file_failure() {
        let tmp = TempDir::new().unwrap();
        let nature = tmp.path().join("originals/nature");
        touch(&nature.join("a.jpg"));
        std::os::unix::fs::symlink(tmp.path().join("gone.jpg"), nature.join("b.jpg")).unwrap();
        let backend = MockBackend::with_images(&[("a.jpg", 100, 100)]);

        let (outcome, _) = run_mock(&backend, &tmp, &config(&["nature"]));
        let report = completed(outcome);

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.processed, 1);
        assert_eq!(report.failures().next().unwrap().filename, "b.jpg");
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_category_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let originals = tmp.path().join("originals");
        touch(&originals.join("nature/a.jpg"));
        touch(&originals.join("cars/b.jpg"));
        let cars = originals.join("cars");
        fs::set_permissions(&cars, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&cars).is_ok() {
            // Running with privileges that ignore directory modes.
            fs::set_permissions(&cars, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }
        let backend = MockBackend::with_images(&[("a.jpg", 100, 100), ("b.jpg", 100, 100)]);

        let (outcome, events) = run_mock(&backend, &tmp, &config(&["nature", "cars"]));
        fs::set_permissions(&cars, fs::Permissions::from_mode(0o755)).unwrap();
        let report = completed(outcome);

        assert_eq!(report.summary.processed, 1);
        assert_eq!(
            report.skipped,
            vec![("cars".to_string(), SkipReason::Unreadable)]
        );
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::CategorySkipped { reason: SkipReason::Unreadable, .. }
        )));
    }

    // =========================================================================
    // watermark_directory
    // =========================================================================

    #[test]
    fn watermark_directory_twice_keeps_first_backup() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("photography");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.jpg"), b"original a").unwrap();
        fs::write(dir.join("b.JPG"), b"original b").unwrap();
        fs::write(dir.join("c.png"), b"not a jpeg").unwrap();
        let backend = MockBackend::with_images(&[("a.jpg", 2500, 1875), ("b.JPG", 1875, 2500)]);
        let options = PipelineOptions::watermark_only(&PipelineConfig::default());

        let first = completed(watermark_directory(&backend, &dir, &options, None).unwrap());
        assert_eq!(first.summary.processed, 2);
        assert!(
            first
                .successes()
                .all(|r| r.backup == Some(BackupStatus::Created))
        );

        // Backups now sit in the directory; they must not be picked up.
        let second = completed(watermark_directory(&backend, &dir, &options, None).unwrap());
        assert_eq!(second.summary.total, 2);
        assert!(
            second
                .successes()
                .all(|r| r.backup == Some(BackupStatus::AlreadyPresent))
        );

        assert_eq!(fs::read(backup_path(&dir.join("a.jpg"))).unwrap(), b"original a");
        assert_eq!(fs::read(backup_path(&dir.join("b.JPG"))).unwrap(), b"original b");
        assert_eq!(fs::read(dir.join("a.jpg")).unwrap(), MOCK_JPEG);
        assert_eq!(fs::read(dir.join("c.png")).unwrap(), b"not a jpeg");
    }

    #[test]
    fn watermark_directory_keeps_dimensions() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("huge.jpg"), b"x").unwrap();
        let backend = MockBackend::with_images(&[("huge.jpg", 6000, 4000)]);
        let options = PipelineOptions::watermark_only(&PipelineConfig::default());

        let report = completed(watermark_directory(&backend, tmp.path(), &options, None).unwrap());
        let image = report.successes().next().unwrap();
        assert_eq!(image.resized_size, Dimensions::new(6000, 4000));
        assert_eq!(image.category, None);
        assert!(report.summary.by_category.is_empty());
    }

    #[test]
    fn watermark_missing_directory_is_structural_error() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let options = PipelineOptions::watermark_only(&PipelineConfig::default());

        let result = watermark_directory(&backend, &tmp.path().join("gone"), &options, None);
        assert!(matches!(result, Err(BatchError::SourceRootMissing(_))));
    }

    #[test]
    fn watermark_empty_directory_is_no_input() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let options = PipelineOptions::watermark_only(&PipelineConfig::default());

        let outcome = watermark_directory(&backend, tmp.path(), &options, None).unwrap();
        assert!(matches!(outcome, BatchOutcome::NoInput { .. }));
    }

    // =========================================================================
    // published_images
    // =========================================================================

    #[test]
    fn published_images_filters_by_prefix() {
        let tmp = TempDir::new().unwrap();
        for name in ["2L9A0001.jpg", "IMG_1001.jpg", "DSC_0001.jpg", "IMG_1001.jpg.backup"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }

        let all = published_images(tmp.path(), &[]).unwrap();
        assert_eq!(all.len(), 3);

        let cars = published_images(tmp.path(), &["2L9A".into(), "IMG_1".into()]).unwrap();
        let names: Vec<_> = cars
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["2L9A0001.jpg", "IMG_1001.jpg"]);
    }
}
