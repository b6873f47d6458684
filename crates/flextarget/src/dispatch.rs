//! Capability-flag routing between the GPU and reference implementations.
//!
//! The conditional-compilation switch of the original capture app becomes a
//! runtime probe: [`Compute::new`] asks for a GPU adapter once at startup
//! and remembers the answer. Callers get one surface with the reference
//! contract; only the execution strategy differs.

use flextarget_color::{DiffError, Hsv};
use flextarget_core::{ImageBuffer, ImageError};
use flextarget_gpu::{GpuContext, GpuError};

/// Errors surfaced by the dispatch layer.
#[derive(thiserror::Error, Debug)]
pub enum ComputeError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Diff(#[from] DiffError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
}

/// Threshold/diff dispatcher with an optional accelerated backend.
pub struct Compute {
    gpu: Option<GpuContext>,
}

impl Compute {
    /// Probe for a compute backend; fall back to the reference path when
    /// none is available. Probing failure is a configuration outcome, not
    /// an error.
    pub fn new() -> Self {
        match GpuContext::new() {
            Ok(ctx) => {
                log::info!("accelerated color path enabled");
                Self { gpu: Some(ctx) }
            }
            Err(err) => {
                log::info!("accelerated color path unavailable ({err}), using reference");
                Self { gpu: None }
            }
        }
    }

    /// Reference-only dispatcher, regardless of available hardware.
    pub fn reference_only() -> Self {
        Self { gpu: None }
    }

    pub fn is_accelerated(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn binary_red_hsv(
        &self,
        img: &ImageBuffer,
        baseline: Hsv,
    ) -> Result<ImageBuffer, ComputeError> {
        match &self.gpu {
            Some(ctx) => Ok(ctx.binary_red_hsv(img, baseline)?),
            None => Ok(flextarget_color::binary_red_hsv(img, baseline)?),
        }
    }

    pub fn binary_red_hsv_default(&self, img: &ImageBuffer) -> Result<ImageBuffer, ComputeError> {
        self.binary_red_hsv(img, flextarget_color::BASELINE_WHITE)
    }

    pub fn mean_abs_diff(&self, a: &ImageBuffer, b: &ImageBuffer) -> Result<f64, ComputeError> {
        match &self.gpu {
            Some(ctx) => Ok(ctx.mean_abs_diff(a, b)?),
            None => Ok(flextarget_color::mean_abs_diff(a, b)?),
        }
    }
}

impl Default for Compute {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flextarget_core::PixelFormat;

    #[test]
    fn reference_only_dispatch_thresholds() {
        let compute = Compute::reference_only();
        assert!(!compute.is_accelerated());

        let img = ImageBuffer::filled(4, 4, PixelFormat::Rgba8, 255).unwrap();
        let mask = compute.binary_red_hsv_default(&img).unwrap();
        assert!(mask.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn reference_only_dispatch_scores_diff() {
        let compute = Compute::reference_only();
        let a = ImageBuffer::filled(4, 4, PixelFormat::Gray8, 10).unwrap();
        let b = ImageBuffer::filled(4, 4, PixelFormat::Gray8, 30).unwrap();
        assert_eq!(compute.mean_abs_diff(&a, &b).unwrap(), 20.0);
    }
}
