//! GPU-resident variants of the flextarget color threshold and frame diff.
//!
//! Both operations are contract-equivalent to their reference renditions in
//! `flextarget-color` and substitutable by any caller: same inputs, same
//! classification, synchronous from the caller's point of view. The
//! difference is execution strategy only — work is dispatched to a compute
//! device and the call blocks until results are copied back.
//!
//! Availability is a *configuration* condition, not a failure mode of the
//! operations: probe once with [`GpuContext::new`] at startup and route to
//! the reference path when it reports [`GpuError::NoAdapter`].

mod device;
mod diff;
mod threshold;

pub use device::GpuContext;

use flextarget_color::{DiffError, Hsv, BASELINE_WHITE};
use flextarget_core::{ImageBuffer, ImageError};

/// Errors from the GPU compute path.
#[derive(thiserror::Error, Debug)]
pub enum GpuError {
    #[error("no usable GPU compute adapter")]
    NoAdapter,
    #[error(transparent)]
    Device(#[from] wgpu::RequestDeviceError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Diff(#[from] DiffError),
    #[error("GPU buffer readback failed")]
    Readback,
}

impl GpuContext {
    /// GPU variant of [`flextarget_color::binary_red_hsv`].
    pub fn binary_red_hsv(
        &self,
        img: &ImageBuffer,
        baseline: Hsv,
    ) -> Result<ImageBuffer, GpuError> {
        threshold::run(self, img, baseline)
    }

    /// GPU variant of [`flextarget_color::binary_red_hsv_default`].
    pub fn binary_red_hsv_default(&self, img: &ImageBuffer) -> Result<ImageBuffer, GpuError> {
        threshold::run(self, img, BASELINE_WHITE)
    }

    /// GPU variant of [`flextarget_color::mean_abs_diff`].
    pub fn mean_abs_diff(&self, a: &ImageBuffer, b: &ImageBuffer) -> Result<f64, GpuError> {
        diff::run(self, a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flextarget_core::PixelFormat;

    /// Synthetic sweep covering the HSV space: hue left to right, value top
    /// to bottom, alternating saturation per row.
    fn hsv_sweep(w: usize, h: usize) -> ImageBuffer {
        let mut data = Vec::with_capacity(w * h * 4);
        for y in 0..h {
            for x in 0..w {
                let hue = 360.0 * x as f32 / w as f32;
                let sat = if y % 2 == 0 { 0.9 } else { 0.3 };
                let val = 0.1 + 0.9 * y as f32 / h as f32;
                let (r, g, b) = hsv_to_rgb(hue, sat, val);
                data.extend_from_slice(&[r, g, b, 255]);
            }
        }
        ImageBuffer::new(w, h, PixelFormat::Rgba8, data).unwrap()
    }

    fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
        let c = v * s;
        let hp = h / 60.0;
        let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
        let (r, g, b) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = v - c;
        (
            ((r + m) * 255.0).round() as u8,
            ((g + m) * 255.0).round() as u8,
            ((b + m) * 255.0).round() as u8,
        )
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn threshold_matches_reference_on_hsv_sweep() {
        let ctx = GpuContext::new().expect("GPU adapter");
        let img = hsv_sweep(128, 64);

        let gpu = ctx.binary_red_hsv_default(&img).expect("gpu threshold");
        let cpu = flextarget_color::binary_red_hsv_default(&img).expect("cpu threshold");

        // WGSL permits a couple of ULP on division, so a pixel sitting
        // exactly on a threshold may legitimately flip. Everything off the
        // boundary must agree.
        let eps_hsv = 1e-3f32;
        let sat_cut = flextarget_color::BASELINE_WHITE.s + flextarget_color::SATURATION_MARGIN;
        for (i, (g, c)) in gpu.data().iter().zip(cpu.data().iter()).enumerate() {
            if g == c {
                continue;
            }
            let px = &img.data()[i * 4..i * 4 + 4];
            let hsv = flextarget_color::rgb_to_hsv(px[0], px[1], px[2]);
            let near_boundary = (hsv.v - flextarget_color::VALUE_FLOOR).abs() < eps_hsv
                || (hsv.s - sat_cut).abs() < eps_hsv
                || (hsv.h - flextarget_color::RED_HUE_LOW_MAX).abs() < 0.5
                || (hsv.h - flextarget_color::RED_HUE_HIGH_MIN).abs() < 0.5;
            assert!(
                near_boundary,
                "pixel {i} diverged away from any threshold boundary: {hsv:?}"
            );
        }
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn diff_matches_reference_exactly() {
        let ctx = GpuContext::new().expect("GPU adapter");
        let a = hsv_sweep(64, 48);
        let b = hsv_sweep(64, 48);
        let mut altered = b.data().to_vec();
        for (i, v) in altered.iter_mut().enumerate() {
            if i % 7 == 0 {
                *v = v.wrapping_add(13);
            }
        }
        let b = ImageBuffer::new(64, 48, PixelFormat::Rgba8, altered).unwrap();

        let gpu = ctx.mean_abs_diff(&a, &b).expect("gpu diff");
        let cpu = flextarget_color::mean_abs_diff(&a, &b).expect("cpu diff");
        assert_eq!(gpu, cpu);
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn diff_of_identical_images_is_zero() {
        let ctx = GpuContext::new().expect("GPU adapter");
        let img = hsv_sweep(32, 32);
        assert_eq!(ctx.mean_abs_diff(&img, &img).expect("gpu diff"), 0.0);
    }

    #[test]
    fn dimension_mismatch_fails_before_dispatch() {
        // The validation path runs without a device; only exercise it when
        // an adapter happens to be present.
        if let Ok(ctx) = GpuContext::new() {
            let a = ImageBuffer::filled(8, 8, PixelFormat::Gray8, 0).unwrap();
            let b = ImageBuffer::filled(8, 9, PixelFormat::Gray8, 0).unwrap();
            assert!(matches!(
                ctx.mean_abs_diff(&a, &b),
                Err(GpuError::Diff(DiffError::DimensionMismatch(..)))
            ));
        }
    }
}
