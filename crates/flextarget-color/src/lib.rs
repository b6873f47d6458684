//! Color reduction and frame differencing for the flextarget pipeline
//! (reference implementations).
//!
//! The two operations here — [`binary_red_hsv`] and [`mean_abs_diff`] — also
//! exist as GPU-resident variants in `flextarget-gpu`. The reference path is
//! the contract: the accelerated path must classify every pixel identically
//! (up to the documented epsilon band at the threshold boundary) and is
//! substitutable by any caller.

mod diff;
mod hsv;
mod threshold;

pub use diff::{mean_abs_diff, DiffError};
pub use hsv::{rgb_to_hsv, Hsv};
pub use threshold::{
    binary_red_hsv, binary_red_hsv_default, estimate_baseline_white, is_red, BASELINE_WHITE,
    RED_HUE_HIGH_MIN, RED_HUE_LOW_MAX, SATURATION_MARGIN, VALUE_FLOOR,
};
