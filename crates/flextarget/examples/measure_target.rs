//! End-to-end measurement of one capture: four-marker rectification, red
//! threshold, contour centers. Drives the same chain the capture app runs
//! per frame.
//!
//! Usage: `cargo run --example measure_target -- config.json`

use std::str::FromStr;
use std::{env, fs, path::PathBuf};

use log::{info, LevelFilter};
use serde::{Deserialize, Serialize};

use flextarget::adapt;
use flextarget::core::init_with_level;
use flextarget::dispatch::Compute;
use flextarget::{
    centers_and_radius_of_contours, rectify_within_markers, ContourMeasure, MarkerParams,
};

#[derive(Debug, Deserialize)]
struct ExampleConfig {
    image_path: String,
    #[serde(default)]
    rectified_path: Option<String>,
    #[serde(default)]
    mask_path: Option<String>,
    #[serde(default)]
    marker: Option<MarkerParams>,
}

#[derive(Debug, Serialize)]
struct ExampleReport {
    image_path: String,
    accelerated: bool,
    num_contours: usize,
    measures: Vec<ContourMeasure>,
    error: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_level = LevelFilter::from_str("info").unwrap_or(LevelFilter::Info);
    init_with_level(log_level)?;

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("measure_target.json"));
    let cfg: ExampleConfig = serde_json::from_str(&fs::read_to_string(&config_path)?)?;

    let capture = adapt::load_rgba(&cfg.image_path)?;
    info!(
        "loaded {} ({}x{})",
        cfg.image_path,
        capture.width(),
        capture.height()
    );

    let compute = Compute::new();
    let mut report = ExampleReport {
        image_path: cfg.image_path.clone(),
        accelerated: compute.is_accelerated(),
        num_contours: 0,
        measures: Vec::new(),
        error: None,
    };

    let marker_params = cfg.marker.unwrap_or_default();
    match rectify_within_markers(&capture, &marker_params) {
        Ok(res) => {
            if let Some(path) = &cfg.rectified_path {
                adapt::save(&res.image, path)?;
            }

            let mask = compute.binary_red_hsv_default(&res.image)?;
            if let Some(path) = &cfg.mask_path {
                adapt::save(&mask, path)?;
            }

            let measures = centers_and_radius_of_contours(&mask)?;
            info!("{} contour(s)", measures.len());
            report.num_contours = measures.len();
            report.measures = measures;
        }
        Err(err) => {
            report.error = Some(err.to_string());
        }
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
