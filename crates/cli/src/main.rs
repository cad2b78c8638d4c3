//! SuitGis CLI - Raster suitability modelling

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use suitgis_algorithms::overlay::{CriterionLayer, SuitabilityModel};
use suitgis_algorithms::statistics::{histogram, Histogram, LayerStatistics};
use suitgis_core::io::{read_geotiff, write_geotiff};
use suitgis_core::Raster;

use crate::config::{parse_spec, ModelConfig};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "suitgis")]
#[command(author, version, about = "Raster suitability modelling", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Print a histogram of a raster's valid cells
    Histogram {
        /// Input raster file
        input: PathBuf,
        /// Number of equal-width bins
        #[arg(short, long, default_value = "20")]
        bins: usize,
    },
    /// Transform one layer onto a suitability scale
    Transform {
        /// Input raster file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Transformation spec: inline JSON or a path to a JSON file
        #[arg(short, long)]
        spec: String,
        /// Also print a histogram of the scores with this many bins
        #[arg(long)]
        bins: Option<usize>,
    },
    /// Run a full weighted-overlay model
    Overlay {
        /// Model description (JSON)
        model: PathBuf,
        /// Output file
        output: PathBuf,
        /// Also print a histogram of the composite with this many bins
        #[arg(long)]
        bins: Option<usize>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_layer(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> = read_geotiff(path)
        .with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn write_result(raster: &Raster<f64>, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn print_statistics(stats: &LayerStatistics) {
    println!("  Min: {:.4}", stats.min);
    println!("  Max: {:.4}", stats.max);
    println!("  Mean: {:.4}", stats.mean);
    println!("  Std dev: {:.4}", stats.std_dev);
}

fn print_histogram(hist: &Histogram) {
    let widest = hist.counts.iter().copied().max().unwrap_or(0).max(1);
    for (lo, hi, count) in hist.bins() {
        let bar = "#".repeat(count * 40 / widest);
        println!("  [{:>12.4}, {:>12.4}) {:>8} {}", lo, hi, count, bar);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_layer(&input)?;
            let (rows, cols) = raster.shape();
            let stats = raster.statistics();
            let gt = raster.transform();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {} x {}", gt.pixel_width, gt.pixel_height.abs());
            println!("Origin: ({:.6}, {:.6})", gt.origin_x, gt.origin_y);
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Ok(stats) = LayerStatistics::from_raster(&raster) {
                print_statistics(&stats);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
            );
            println!("  NoData cells: {}", stats.nodata_count);
        }

        // ── Histogram ────────────────────────────────────────────────
        Commands::Histogram { input, bins } => {
            let raster = read_layer(&input)?;
            let hist = histogram(&raster.finite_values(), bins)
                .context("Failed to compute histogram")?;
            println!("Histogram of {} ({} values):", input.display(), hist.total());
            print_histogram(&hist);
        }

        // ── Transform ────────────────────────────────────────────────
        Commands::Transform {
            input,
            output,
            spec,
            bins,
        } => {
            let spec = parse_spec(&spec)?;
            let raster = read_layer(&input)?;
            let name = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "layer".to_string());

            let start = Instant::now();
            let mut criterion =
                CriterionLayer::new(name, raster).context("Failed to sample input layer")?;
            let scored = criterion
                .transform(&spec)
                .context("Failed to transform layer")?;
            let elapsed = start.elapsed();

            write_result(scored.raster(), &output)?;
            done("Transformed layer", &output, elapsed);

            if let Some(resolved) = criterion.resolved_spec() {
                println!("\nResolved transformation:");
                println!("{}", serde_json::to_string_pretty(&resolved)?);
            }
            if let Some(n) = bins {
                let hist = criterion
                    .transformed_histogram(n)
                    .context("Failed to compute histogram")?;
                println!("\nScores:");
                print_histogram(&hist);
            }
        }

        // ── Overlay ──────────────────────────────────────────────────
        Commands::Overlay {
            model,
            output,
            bins,
        } => {
            let config = ModelConfig::load(&model)?;
            let mut suitability = SuitabilityModel::new(config.overlay);
            let mut specs = Vec::with_capacity(config.criteria.len());
            for criterion in &config.criteria {
                let raster = read_layer(&criterion.path)?;
                let layer = CriterionLayer::new(criterion.name.clone(), raster)
                    .with_context(|| format!("Failed to sample criterion '{}'", criterion.name))?;
                suitability.add_criterion(layer, criterion.weight);
                specs.push(criterion.transform.clone());
            }

            let start = Instant::now();
            let pb = spinner("Transforming criteria...");
            suitability
                .transform_criteria(&specs)
                .context("Failed to transform criteria")?;
            pb.set_message("Weighted overlay...");
            let surface = suitability
                .calculate()
                .context("Failed to compute weighted overlay")?;
            pb.finish_and_clear();
            let elapsed = start.elapsed();

            write_result(surface.raster(), &output)?;
            done("Suitability surface", &output, elapsed);

            println!("\nStatistics:");
            match surface.statistics() {
                Ok(stats) => print_statistics(&stats),
                Err(e) => println!("  {}", e),
            }
            if let Some(n) = bins {
                let hist = surface.histogram(n).context("Failed to compute histogram")?;
                println!("\nHistogram:");
                print_histogram(&hist);
            }
        }
    }

    Ok(())
}
