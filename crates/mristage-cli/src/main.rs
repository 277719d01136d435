//! mristage: stage brain MRI images from the command line.
//!
//! Reads image files, runs the staging classifier, and prints verdicts,
//! diagnostics and batch summaries. Optionally writes the annotated
//! image and the intermediate edge map as PNG.
//!
//! # Usage
//!
//! ```text
//! mristage analyze scan.png --render annotated.png --diagnostics
//! mristage render scan.png --output annotated.png
//! mristage batch scans/*.png --json
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{ArgAction, Args, Parser, Subcommand};
use mristage_pipeline::diagnostics::{self, AnalysisDiagnostics, Clock};
use mristage_pipeline::{BatchSummary, DynamicImage, StagingConfig, StagingError, StagingVerdict};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Deterministic tumor staging for brain MRI images.
#[derive(Parser)]
#[command(name = "mristage", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    config: ConfigArgs,

    /// Raise log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Stage one image and print the verdict.
    Analyze {
        /// Path to the input image (PNG, JPEG, BMP, WebP).
        image: PathBuf,

        /// Print the verdict as JSON.
        #[arg(long)]
        json: bool,

        /// Write the annotated image to this path.
        #[arg(long, value_name = "PNG")]
        render: Option<PathBuf>,

        /// Write the binary edge map to this path.
        #[arg(long, value_name = "PNG")]
        edges: Option<PathBuf>,

        /// Print per-step timing and counts.
        #[arg(long)]
        diagnostics: bool,
    },

    /// Outline detected regions and write the annotated image.
    Render {
        /// Path to the input image.
        image: PathBuf,

        /// Output image path (PNG recommended).
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Stage several images and print a summary.
    Batch {
        /// Paths to the input images.
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Print results and summary as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Staging parameters shared by every subcommand.
///
/// A `--config` file or `--config-json` string provides the base config;
/// the individual flags override its fields.
#[derive(Args)]
struct ConfigArgs {
    /// Gaussian sigma for the 5×5 smoothing kernel [default: binomial taps].
    #[arg(long, global = true)]
    blur_sigma: Option<f32>,

    /// Canny low threshold.
    #[arg(long, global = true)]
    canny_low: Option<f32>,

    /// Canny high threshold.
    #[arg(long, global = true)]
    canny_high: Option<f32>,

    /// Path to a JSON `StagingConfig`.
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "config_json")]
    config: Option<PathBuf>,

    /// Full `StagingConfig` as a JSON string.
    #[arg(long, global = true, value_name = "JSON")]
    config_json: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing config from {origin}: {source}")]
    ConfigParse {
        origin: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    InvalidConfig(StagingError),

    #[error("{}: {source}", path.display())]
    Staging {
        path: PathBuf,
        source: StagingError,
    },

    #[error("writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("serializing output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{failed} of {total} images could not be staged")]
    BatchFailures { failed: usize, total: usize },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Install a stderr `fmt` subscriber. `RUST_LOG`, when set, wins over
/// the verbosity flag.
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

const fn default_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = config_from_args(&cli.config)?;
    tracing::info!(?config, "using staging config");

    match &cli.command {
        Command::Analyze {
            image,
            json,
            render,
            edges,
            diagnostics,
        } => analyze(
            image,
            &config,
            &AnalyzeOptions {
                json: *json,
                render: render.as_deref(),
                edges: edges.as_deref(),
                diagnostics: *diagnostics,
            },
        ),
        Command::Render { image, output } => render(image, output, &config),
        Command::Batch { images, json } => batch(images, &config, *json),
    }
}

/// Build a [`StagingConfig`] from the shared arguments and validate it.
fn config_from_args(args: &ConfigArgs) -> Result<StagingConfig, CliError> {
    let mut config = if let Some(ref path) = args.config {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::ConfigParse {
            origin: path.display().to_string(),
            source,
        })?
    } else if let Some(ref json) = args.config_json {
        serde_json::from_str(json).map_err(|source| CliError::ConfigParse {
            origin: "--config-json".to_string(),
            source,
        })?
    } else {
        StagingConfig::default()
    };

    if let Some(sigma) = args.blur_sigma {
        config.blur_sigma = Some(sigma);
    }
    if let Some(low) = args.canny_low {
        config.canny_low = low;
    }
    if let Some(high) = args.canny_high {
        config.canny_high = high;
    }

    config.validate().map_err(CliError::InvalidConfig)?;
    Ok(config)
}

/// Read and decode an image file.
fn load_image(path: &Path) -> Result<DynamicImage, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "read image");
    mristage_pipeline::grayscale::decode(&bytes).map_err(|source| CliError::Staging {
        path: path.to_path_buf(),
        source,
    })
}

struct AnalyzeOptions<'a> {
    json: bool,
    render: Option<&'a Path>,
    edges: Option<&'a Path>,
    diagnostics: bool,
}

/// JSON shape of `analyze --json`.
#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    image: String,
    verdict: &'a StagingVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<&'a AnalysisDiagnostics>,
}

fn analyze(path: &Path, config: &StagingConfig, opts: &AnalyzeOptions<'_>) -> Result<(), CliError> {
    let image = load_image(path)?;
    let (staged, diag) = diagnostics::analyze_with_diagnostics(&image, config, &StdClock)
        .map_err(|source| CliError::Staging {
            path: path.to_path_buf(),
            source,
        })?;

    if opts.json {
        let output = AnalyzeOutput {
            image: path.display().to_string(),
            verdict: &staged.verdict,
            diagnostics: opts.diagnostics.then_some(&diag),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", verdict_report(&staged.verdict));
        if opts.diagnostics {
            println!();
            println!("{}", diag.report());
        }
    }

    if let Some(edges_path) = opts.edges {
        save(&staged.edges, edges_path)?;
    }
    if let Some(render_path) = opts.render {
        let annotated = mristage_pipeline::render::annotate(image.to_rgb8(), &staged.contours);
        save(&annotated, render_path)?;
    }

    Ok(())
}

fn render(path: &Path, output: &Path, config: &StagingConfig) -> Result<(), CliError> {
    let image = load_image(path)?;
    let annotated =
        mristage_pipeline::render(&image, config).map_err(|source| CliError::Staging {
            path: path.to_path_buf(),
            source,
        })?;
    save(&annotated, output)
}

/// One row of `batch --json`.
#[derive(Serialize)]
struct BatchEntry {
    image: String,
    #[serde(flatten)]
    outcome: BatchOutcome,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum BatchOutcome {
    Verdict(StagingVerdict),
    Error(String),
}

#[derive(Serialize)]
struct BatchOutput {
    results: Vec<BatchEntry>,
    summary: BatchSummary,
}

fn batch(paths: &[PathBuf], config: &StagingConfig, json: bool) -> Result<(), CliError> {
    let mut entries = Vec::with_capacity(paths.len());
    let mut verdicts = Vec::with_capacity(paths.len());

    for path in paths {
        let result = load_image(path).and_then(|image| {
            mristage_pipeline::analyze(&image, config).map_err(|source| CliError::Staging {
                path: path.clone(),
                source,
            })
        });
        let image = path.display().to_string();
        match result {
            Ok(verdict) => {
                if !json {
                    println!("{image}: {verdict}");
                }
                verdicts.push(verdict.clone());
                entries.push(BatchEntry {
                    image,
                    outcome: BatchOutcome::Verdict(verdict),
                });
            }
            Err(e) => {
                tracing::warn!(path = %image, error = %e, "skipping image");
                eprintln!("skipped {e}");
                entries.push(BatchEntry {
                    image,
                    outcome: BatchOutcome::Error(e.to_string()),
                });
            }
        }
    }

    let summary = BatchSummary::from_verdicts(&verdicts);
    if json {
        let output = BatchOutput {
            results: entries,
            summary,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
        println!("{}", summary.report());
    }

    let failed = paths.len() - verdicts.len();
    if failed > 0 {
        return Err(CliError::BatchFailures {
            failed,
            total: paths.len(),
        });
    }
    Ok(())
}

/// Encode an image to `path`, format chosen by extension.
fn save<P, C>(image: &image::ImageBuffer<P, C>, path: &Path) -> Result<(), CliError>
where
    P: image::Pixel + image::PixelWithColorType,
    [P::Subpixel]: image::EncodableLayout,
    C: std::ops::Deref<Target = [P::Subpixel]>,
{
    image.save(path).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    eprintln!(
        "Wrote {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(())
}

/// Human-readable verdict block.
fn verdict_report(verdict: &StagingVerdict) -> String {
    let mut lines = vec![
        format!("Stage:       {}", verdict.stage()),
        format!("Confidence:  {:.0}%", verdict.confidence() * 100.0),
        format!("Malignancy:  {}", verdict.malignancy()),
        format!("Tumor count: {}", verdict.tumor_count()),
        format!("Largest:     {}", verdict.largest_size()),
    ];
    if let Some(location) = verdict.location() {
        lines.push(format!("Location:    {location}"));
    }
    lines.join("\n")
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
