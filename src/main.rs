use clap::{Parser, Subcommand};
use darkroom::batch::{self, BatchOutcome, ProcessEvent};
use darkroom::config::{self, PipelineConfig};
use darkroom::imaging::{Quality, Rotation, RustBackend, find_system_font, load_font};
use darkroom::process::{self, PipelineOptions};
use darkroom::{manifest, output};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

#[derive(Parser)]
#[command(name = "darkroom")]
#[command(about = "Resize and watermark photographs for a portfolio site")]
#[command(long_about = "\
Resize and watermark photographs for a portfolio site

Originals are sorted into one directory per category. Each one is resized so
its longest edge fits max_dimension, watermarked, and published as a JPEG:

  public/photography/
  ├── originals/                   # --source
  │   ├── nature/
  │   │   ├── IMG_2610.JPG
  │   │   └── dunes.tiff
  │   └── cars/
  │       └── R6__5123.jpg
  ├── IMG_2610.jpg                 # published (--output)
  ├── dunes.jpg
  └── R6__5123.jpg

Supported inputs: jpg, jpeg, png, webp, tif, tiff (any case).
Files that fail are reported and skipped; the rest of the batch continues.

Run 'darkroom gen-config' to generate a documented darkroom.toml.")]
#[command(version)]
struct Cli {
    /// Originals directory, one subdirectory per category
    #[arg(long, default_value = "public/photography/originals", global = true)]
    source: PathBuf,

    /// Publish directory
    #[arg(long, default_value = "public/photography", global = true)]
    output: PathBuf,

    /// Config file (stock defaults apply if it does not exist)
    #[arg(long, default_value = "darkroom.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize, watermark and publish every category
    Process {
        /// Publish without a watermark
        #[arg(long)]
        no_watermark: bool,
    },
    /// Watermark published JPEGs in place, keeping .backup copies
    Watermark {
        /// Directory to watermark (defaults to --output)
        dir: Option<PathBuf>,
    },
    /// Rotate one image clockwise in place
    Rotate {
        file: PathBuf,
        /// 90, 180, 270 or -90
        #[arg(long, default_value = "90", allow_negative_numbers = true)]
        degrees: Rotation,
    },
    /// Print gallery records for already published photos
    Entries {
        /// Category the records belong to
        #[arg(long)]
        category: String,
        /// Only include files whose names start with one of these prefixes
        #[arg(long = "prefix")]
        prefixes: Vec<String>,
    },
    /// Print a stock darkroom.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Process { no_watermark } => {
            let config = config::load_config(&cli.config)?;
            let mut options = PipelineOptions::resize_and_watermark(&config);
            if no_watermark {
                options = options.without_watermark();
            }
            let backend = backend_for(&config, options.watermark.is_some())?;

            let (tx, printer) = spawn_printer();
            let outcome = batch::run(
                &backend,
                &cli.source,
                &cli.output,
                &config,
                &options,
                Some(tx),
            )?;
            printer.join().ok();

            match &outcome {
                BatchOutcome::NoInput { .. } => output::print_no_input(&outcome),
                BatchOutcome::Completed(report) => {
                    let samples =
                        manifest::sample_entries(report, &config.categories, &config.manifest);
                    output::print_process_report(report, &samples, &cli.output);
                }
            }
        }
        Command::Watermark { dir } => {
            let config = config::load_config(&cli.config)?;
            let dir = dir.unwrap_or(cli.output);
            let options = PipelineOptions::watermark_only(&config);
            let backend = backend_for(&config, true)?;

            let (tx, printer) = spawn_printer();
            let outcome = batch::watermark_directory(&backend, &dir, &options, Some(tx));
            printer.join().ok();

            match outcome? {
                outcome @ BatchOutcome::NoInput { .. } => output::print_no_input(&outcome),
                BatchOutcome::Completed(report) => output::print_watermark_report(&report, &dir),
            }
        }
        Command::Rotate { file, degrees } => {
            let config = config::load_config(&cli.config)?;
            let rotated = process::rotate_file(
                &RustBackend::new(),
                &file,
                degrees,
                Quality::new(config.quality),
            )?;
            output::print_rotate_result(&rotated);
        }
        Command::Entries {
            category,
            prefixes,
        } => {
            let config = config::load_config(&cli.config)?;
            let (entries, failures) = manifest::published_entries(
                &RustBackend::new(),
                &cli.output,
                &category,
                &prefixes,
                &config,
            )?;
            output::print_entries(&entries, &failures);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Build the backend, loading a font when watermarks will be drawn.
///
/// Fails before any file is touched if a watermark is wanted and no font
/// can be found.
fn backend_for(
    config: &PipelineConfig,
    watermark: bool,
) -> Result<RustBackend, Box<dyn std::error::Error>> {
    if !watermark {
        return Ok(RustBackend::new());
    }
    let path = match &config.watermark.font {
        Some(path) => path.clone(),
        None => find_system_font().ok_or(
            "no watermark font found: set watermark.font in the config \
             or run with --no-watermark",
        )?,
    };
    Ok(RustBackend::with_font(load_font(&path)?))
}

/// Print progress events on a separate thread as they arrive.
fn spawn_printer() -> (Sender<ProcessEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel();
    let printer = thread::spawn(move || {
        for event in rx {
            output::print_process_event(&event);
        }
    });
    (tx, printer)
}
