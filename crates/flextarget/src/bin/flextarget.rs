use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use serde::Serialize;

use flextarget::adapt;
use flextarget::core::init_with_level;
use flextarget::dispatch::Compute;
use flextarget::{
    centers_and_radius_of_contours, detect_black_frame, draw_circles_on_contours,
    rectify_within_markers, ContourMeasure, FrameParams, MarkerParams,
};

#[derive(Parser)]
#[command(
    name = "flextarget",
    about = "Flextarget optical measurement pipeline",
    version
)]
struct Cli {
    /// Log level: error, warn, info, debug or trace.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Threshold a capture and report contour centers/radii as JSON.
    Contours {
        image: PathBuf,
        /// Treat the input as an already-binarized mask.
        #[arg(long)]
        binary: bool,
        /// Write a circle-overlay image here.
        #[arg(long)]
        overlay: Option<PathBuf>,
    },
    /// Detect the black reference frame and write its rectified interior.
    Frame {
        image: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Rectify the area bounded by the four corner markers.
    Rectify {
        image: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Also write the source→output homography as JSON.
        #[arg(long)]
        matrix: Option<PathBuf>,
    },
    /// Binary red/background threshold against the baseline white.
    Threshold {
        image: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Force the reference path even when a compute backend exists.
        #[arg(long)]
        no_gpu: bool,
    },
    /// Mean absolute difference between two aligned images.
    Diff { first: PathBuf, second: PathBuf },
}

#[derive(Serialize)]
struct ContourReport {
    image: String,
    count: usize,
    measures: Vec<MeasureEntry>,
}

#[derive(Serialize)]
struct MeasureEntry {
    x: f32,
    y: f32,
    radius: f32,
}

impl From<&ContourMeasure> for MeasureEntry {
    fn from(m: &ContourMeasure) -> Self {
        Self {
            x: m.center.x,
            y: m.center.y,
            radius: m.radius,
        }
    }
}

#[derive(Serialize)]
struct DiffReport {
    first: String,
    second: String,
    mean_abs_diff: f64,
    accelerated: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let level = LevelFilter::from_str(&cli.log_level).unwrap_or(LevelFilter::Info);
    init_with_level(level)?;

    match cli.command {
        Command::Contours {
            image,
            binary,
            overlay,
        } => run_contours(&image, binary, overlay.as_deref()),
        Command::Frame { image, output } => run_frame(&image, &output),
        Command::Rectify {
            image,
            output,
            matrix,
        } => run_rectify(&image, &output, matrix.as_deref()),
        Command::Threshold {
            image,
            output,
            no_gpu,
        } => run_threshold(&image, &output, no_gpu),
        Command::Diff { first, second } => run_diff(&first, &second),
    }
}

fn run_contours(
    image: &std::path::Path,
    binary: bool,
    overlay: Option<&std::path::Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mask = if binary {
        adapt::load_gray(image)?
    } else {
        let capture = adapt::load_rgba(image)?;
        Compute::new().binary_red_hsv_default(&capture)?
    };

    let measures = centers_and_radius_of_contours(&mask)?;
    info!("{} contour(s) in {}", measures.len(), image.display());

    if let Some(path) = overlay {
        let drawn = draw_circles_on_contours(&mask)?;
        adapt::save(&drawn, path)?;
    }

    let report = ContourReport {
        image: image.display().to_string(),
        count: measures.len(),
        measures: measures.iter().map(MeasureEntry::from).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_frame(
    image: &std::path::Path,
    output: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let capture = adapt::load_rgba(image)?;
    let interior = detect_black_frame(&capture, &FrameParams::default())?;
    info!(
        "frame interior {}x{} -> {}",
        interior.width(),
        interior.height(),
        output.display()
    );
    adapt::save(&interior, output)?;
    Ok(())
}

fn run_rectify(
    image: &std::path::Path,
    output: &std::path::Path,
    matrix: Option<&std::path::Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let capture = adapt::load_rgba(image)?;
    let res = rectify_within_markers(&capture, &MarkerParams::default())?;
    info!(
        "rectified {}x{} -> {}",
        res.image.width(),
        res.image.height(),
        output.display()
    );
    adapt::save(&res.image, output)?;

    if let Some(path) = matrix {
        let json = serde_json::to_string_pretty(&res.homography.to_array())?;
        std::fs::write(path, json)?;
    }
    Ok(())
}

fn run_threshold(
    image: &std::path::Path,
    output: &std::path::Path,
    no_gpu: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let capture = adapt::load_rgba(image)?;
    let compute = if no_gpu {
        Compute::reference_only()
    } else {
        Compute::new()
    };
    let mask = compute.binary_red_hsv_default(&capture)?;
    adapt::save(&mask, output)?;
    Ok(())
}

fn run_diff(
    first: &std::path::Path,
    second: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let a = adapt::load_rgba(first)?;
    let b = adapt::load_rgba(second)?;
    let compute = Compute::new();
    let score = compute.mean_abs_diff(&a, &b)?;

    let report = DiffReport {
        first: first.display().to_string(),
        second: second.display().to_string(),
        mean_abs_diff: score,
        accelerated: compute.is_accelerated(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
