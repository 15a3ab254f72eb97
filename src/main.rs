// Command-line front end: reads inference responses saved as JSON, prints a
// heatmap report per file and optionally renders the overlay as a PNG.

use anyhow::{Context, Result, bail};
use clap::Parser;
use debris_heatmap::core_modules::overlay;
use debris_heatmap::{
    DensityGridEstimator, DetectionCounts, EstimatorConfig, HeatmapSummary, InferenceResponse,
    OverlayStyle,
};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "debris_heatmap")]
#[command(about = "Build detection-density heatmaps from saved inference responses")]
#[command(version)]
struct Cli {
    /// Image width in pixels (used with --height when no --image is given).
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Image height in pixels.
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// The analysed photo; its size is used for the grid and the overlay is drawn over it.
    #[arg(long, conflicts_with_all = ["width", "height"])]
    image: Option<PathBuf>,

    /// Heatmap cell size in pixels (overrides DEBRIS_CELL_SIZE).
    #[arg(long)]
    cell_size: Option<u32>,

    /// Path to write the rendered overlay (PNG). Single input only.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Gaussian blur sigma for the overlay; 0 disables smoothing.
    #[arg(long)]
    blur: Option<f32>,

    /// Inference response files (JSON).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

/// Everything a worker needs to analyse one response file.
#[derive(Debug, Clone)]
struct Job {
    config: EstimatorConfig,
    image: Option<PathBuf>,
    overlay: Option<PathBuf>,
    style: OverlayStyle,
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    image_width: u32,
    image_height: u32,
    cell_size: u32,
    grid_rows: usize,
    grid_cols: usize,
    summary: HeatmapSummary,
    class_counts: DetectionCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    overlay: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    if args.overlay.is_some() && args.inputs.len() > 1 {
        bail!("--overlay can only be used with a single response file");
    }

    let (image_width, image_height) = match (&args.image, args.width, args.height) {
        (Some(path), _, _) => image::image_dimensions(path)
            .with_context(|| format!("reading dimensions of {}", path.display()))?,
        (None, Some(width), Some(height)) => (width, height),
        _ => bail!("image size unknown: pass --image or both --width and --height"),
    };

    let mut config = EstimatorConfig::new(image_width, image_height).apply_env();
    if let Some(cell_size) = args.cell_size {
        config.cell_size = cell_size;
    }
    let mut style = OverlayStyle::default();
    if let Some(blur) = args.blur {
        style.blur_sigma = blur;
    }
    let job = Job {
        config,
        image: args.image.clone(),
        overlay: args.overlay.clone(),
        style,
    };

    let concurrency = num_cpus::get().max(1);
    log::info!(
        "analysing {} response file(s) on {} worker(s), {}x{} px image, {} px cells",
        args.inputs.len(),
        concurrency,
        image_width,
        image_height,
        config.cell_size
    );

    let results: Vec<_> = stream::iter(args.inputs.clone())
        .map(|path| {
            let job = job.clone();
            tokio::task::spawn_blocking(move || analyze_file(&path, &job))
        })
        .buffered(concurrency)
        .collect()
        .await;

    let mut failed = 0usize;
    for (path, joined) in args.inputs.iter().zip(results) {
        match joined.context("analysis worker panicked").and_then(|r| r) {
            Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
            Err(err) => {
                failed += 1;
                log::error!("{}: {err:#}", path.display());
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} response file(s) failed", args.inputs.len());
    }
    Ok(())
}

fn analyze_file(path: &Path, job: &Job) -> Result<FileReport> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let response = InferenceResponse::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;

    let mut estimator = DensityGridEstimator::new(job.config)?;
    estimator.set_detections(response.detections);
    let summary = estimator.summary();
    log::debug!(
        "{}: {} detections, {} hotspot(s)",
        path.display(),
        summary.total_detections,
        summary.hotspot_count
    );

    let overlay_path = match (&job.overlay, estimator.grid()) {
        (Some(out), Some(grid)) => {
            let rendered = match &job.image {
                Some(photo) => {
                    let photo = image::open(photo)
                        .with_context(|| format!("opening {}", photo.display()))?;
                    overlay::render_onto(&photo, grid, &job.style)?
                }
                None => overlay::render_overlay(
                    grid,
                    job.config.image_width,
                    job.config.image_height,
                    &job.style,
                )?,
            };
            overlay::save_png(&rendered, out)
                .with_context(|| format!("writing {}", out.display()))?;
            Some(out.display().to_string())
        }
        (Some(out), None) => {
            log::warn!("{}: no detections, skipping overlay {}", path.display(), out.display());
            None
        }
        (None, _) => None,
    };

    let geometry = estimator.geometry();
    Ok(FileReport {
        file: path.display().to_string(),
        image_width: geometry.image_width(),
        image_height: geometry.image_height(),
        cell_size: geometry.cell_size(),
        grid_rows: geometry.rows(),
        grid_cols: geometry.cols(),
        summary,
        class_counts: estimator.class_counts(),
        overlay: overlay_path,
    })
}
