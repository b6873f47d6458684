//! Mean absolute difference between two aligned frames.

use flextarget_core::{ImageBuffer, PixelFormat};

/// Errors for frame comparison.
#[derive(thiserror::Error, Debug)]
pub enum DiffError {
    #[error("image dimensions differ ({0}x{1} vs {2}x{3})")]
    DimensionMismatch(usize, usize, usize, usize),

    #[error("pixel formats differ ({0:?} vs {1:?})")]
    FormatMismatch(PixelFormat, PixelFormat),
}

/// Mean of per-byte absolute differences across all pixels and channels.
///
/// Zero means byte-identical; the result is symmetric in its arguments.
/// Both images must share dimensions and pixel format — a mismatch is a
/// typed error, never a guess.
pub fn mean_abs_diff(a: &ImageBuffer, b: &ImageBuffer) -> Result<f64, DiffError> {
    if a.width() != b.width() || a.height() != b.height() {
        return Err(DiffError::DimensionMismatch(
            a.width(),
            a.height(),
            b.width(),
            b.height(),
        ));
    }
    if a.format() != b.format() {
        return Err(DiffError::FormatMismatch(a.format(), b.format()));
    }

    let mut sum = 0u64;
    for (&x, &y) in a.data().iter().zip(b.data().iter()) {
        sum += x.abs_diff(y) as u64;
    }

    Ok(sum as f64 / a.data().len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_images_diff_to_zero() {
        let img = ImageBuffer::filled(16, 16, PixelFormat::Rgba8, 90).unwrap();
        assert_eq!(mean_abs_diff(&img, &img).unwrap(), 0.0);
    }

    #[test]
    fn diff_is_symmetric() {
        let a = ImageBuffer::filled(8, 8, PixelFormat::Gray8, 10).unwrap();
        let b = ImageBuffer::filled(8, 8, PixelFormat::Gray8, 250).unwrap();
        let ab = mean_abs_diff(&a, &b).unwrap();
        let ba = mean_abs_diff(&b, &a).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab, 240.0);
    }

    #[test]
    fn partial_difference_averages_over_all_bytes() {
        let mut data = vec![0u8; 16];
        data[0] = 64; // one byte of sixteen differs
        let a = ImageBuffer::new(4, 4, PixelFormat::Gray8, data).unwrap();
        let b = ImageBuffer::filled(4, 4, PixelFormat::Gray8, 0).unwrap();
        assert_eq!(mean_abs_diff(&a, &b).unwrap(), 4.0);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let a = ImageBuffer::filled(8, 8, PixelFormat::Gray8, 0).unwrap();
        let b = ImageBuffer::filled(8, 9, PixelFormat::Gray8, 0).unwrap();
        assert!(matches!(
            mean_abs_diff(&a, &b),
            Err(DiffError::DimensionMismatch(..))
        ));
    }

    #[test]
    fn format_mismatch_is_an_error() {
        let a = ImageBuffer::filled(8, 8, PixelFormat::Gray8, 0).unwrap();
        let b = ImageBuffer::filled(8, 8, PixelFormat::Rgba8, 0).unwrap();
        assert!(matches!(
            mean_abs_diff(&a, &b),
            Err(DiffError::FormatMismatch(..))
        ));
    }
}
