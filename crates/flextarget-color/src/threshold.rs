//! Binary "red vs. background" classification against a baseline white.
//!
//! The classification contract is shared verbatim with the GPU path in
//! `flextarget-gpu`; any change here must be mirrored in
//! `shaders/binary_red_hsv.wgsl` and is bound by the equivalence tests
//! there.

use flextarget_core::{ImageBuffer, ImageError, PixelFormat};

use crate::hsv::{rgb_to_hsv, Hsv};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Upper end of the low red hue band, degrees.
pub const RED_HUE_LOW_MAX: f32 = 20.0;
/// Lower end of the wrapped high red hue band, degrees.
pub const RED_HUE_HIGH_MIN: f32 = 340.0;
/// A pixel must exceed the baseline saturation by this margin.
pub const SATURATION_MARGIN: f32 = 0.2;
/// Pixels darker than this value are never classified red.
pub const VALUE_FLOOR: f32 = 0.2;

/// Default baseline for targets calibrated against plain white paper.
///
/// At this baseline the classification reduces to the fixed thresholds
/// `s > 0.4 && v > 0.2` used by the original capture pipeline.
pub const BASELINE_WHITE: Hsv = Hsv::new(0.0, 0.2, 1.0);

/// The shared pixel classifier: red hue band, saturated clearly beyond the
/// baseline white, and bright enough to not be shadow.
#[inline]
pub fn is_red(hsv: Hsv, baseline: Hsv) -> bool {
    (hsv.h <= RED_HUE_LOW_MAX || hsv.h >= RED_HUE_HIGH_MIN)
        && hsv.s > baseline.s + SATURATION_MARGIN
        && hsv.v > VALUE_FLOOR
}

/// Classify every pixel of an RGBA image against `baseline`, producing a
/// `Gray8` mask: 255 where red, 0 elsewhere.
///
/// Requires `Rgba8` input; the alpha channel is ignored.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img), fields(width = img.width(), height = img.height()))
)]
pub fn binary_red_hsv(img: &ImageBuffer, baseline: Hsv) -> Result<ImageBuffer, ImageError> {
    img.expect_format(PixelFormat::Rgba8)?;

    let mut out = Vec::with_capacity(img.width() * img.height());
    for px in img.data().chunks_exact(4) {
        let hsv = rgb_to_hsv(px[0], px[1], px[2]);
        out.push(if is_red(hsv, baseline) { 255u8 } else { 0u8 });
    }

    ImageBuffer::new(img.width(), img.height(), PixelFormat::Gray8, out)
}

/// [`binary_red_hsv`] against the fixed [`BASELINE_WHITE`].
pub fn binary_red_hsv_default(img: &ImageBuffer) -> Result<ImageBuffer, ImageError> {
    binary_red_hsv(img, BASELINE_WHITE)
}

/// Mean HSV over the near-white pixels of an image (`s < 0.2 && v > 0.8`),
/// for calibrating the baseline from a captured blank target.
///
/// `None` when no pixel qualifies — e.g. the target is not in frame yet.
pub fn estimate_baseline_white(img: &ImageBuffer) -> Result<Option<Hsv>, ImageError> {
    img.expect_format(PixelFormat::Rgba8)?;

    let mut sum = (0.0f64, 0.0f64, 0.0f64);
    let mut count = 0usize;
    for px in img.data().chunks_exact(4) {
        let hsv = rgb_to_hsv(px[0], px[1], px[2]);
        if hsv.s < 0.2 && hsv.v > 0.8 {
            sum.0 += hsv.h as f64;
            sum.1 += hsv.s as f64;
            sum.2 += hsv.v as f64;
            count += 1;
        }
    }

    if count == 0 {
        return Ok(None);
    }
    let n = count as f64;
    Ok(Some(Hsv {
        h: (sum.0 / n) as f32,
        s: (sum.1 / n) as f32,
        v: (sum.2 / n) as f32,
    }))
}
