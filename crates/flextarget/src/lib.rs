//! High-level facade crate for the `flextarget-*` workspace.
//!
//! The flextarget optical measurement core: given camera captures of a
//! physical or projected target, locate geometric features (blob contours,
//! a black reference frame, four corner markers), rectify the perspective,
//! reduce color to a binary mask against a baseline white, and score the
//! difference between aligned frames.
//!
//! Stages are independent pure functions composable by the caller; the
//! typical chain is frame/marker rectification → color threshold → contour
//! measurement, with frame differencing running separately on rectified
//! pairs.
//!
//! ## Quickstart
//!
//! ```no_run
//! use flextarget::adapt;
//! use flextarget::{centers_of_contours, rectify_within_markers, MarkerParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let capture = adapt::load_rgba("capture.png")?;
//! let rectified = rectify_within_markers(&capture, &MarkerParams::default())?;
//! let mask = flextarget::binary_red_hsv_default(&rectified.image)?;
//! let centers = centers_of_contours(&mask)?;
//! println!("{} hit(s)", centers.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `flextarget::core`: image buffer, homography estimation, warping.
//! - `flextarget::contour`: blob contours, centers, radii, circle overlays.
//! - `flextarget::frame`: black reference-frame detection.
//! - `flextarget::marker`: four-marker rectification.
//! - `flextarget::color`: HSV threshold and frame diff (reference).
//! - `flextarget::gpu`: accelerated threshold and diff, probed at runtime.
//! - `flextarget::dispatch`: capability-flag routing between the two.
//! - `flextarget::adapt` (feature `image`): `image` crate conversions.

pub use flextarget_color as color;
pub use flextarget_contour as contour;
pub use flextarget_core as core;
pub use flextarget_frame as frame;
pub use flextarget_gpu as gpu;
pub use flextarget_marker as marker;

pub use flextarget_color::{
    binary_red_hsv, binary_red_hsv_default, estimate_baseline_white, mean_abs_diff, Hsv,
    BASELINE_WHITE,
};
pub use flextarget_contour::{
    centers_and_radius_of_contours, centers_of_contours, draw_circles_on_contours, find_contours,
    Contour, ContourMeasure,
};
pub use flextarget_core::{
    rectify_image, rectify_image_and_matrix, warp_image, Homography, ImageBuffer, PixelFormat,
};
pub use flextarget_frame::{detect_black_frame, FrameError, FrameParams};
pub use flextarget_marker::{
    rectify_within_markers, MarkerError, MarkerParams, MarkerRectification,
};

pub mod dispatch;

#[cfg(feature = "image")]
pub mod adapt;
