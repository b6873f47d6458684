//! Conversions between the neutral [`ImageBuffer`] and the `image` crate.
//!
//! This is the external adapter the core deliberately does not contain:
//! everything inside the pipeline speaks `ImageBuffer`; decoding, encoding
//! and platform image types stop here.

use std::path::Path;

use flextarget_core::{ImageBuffer, ImageError, PixelFormat};

/// Errors from loading, saving or converting host images.
#[derive(thiserror::Error, Debug)]
pub enum AdaptError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Codec(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Wrap an `image::RgbaImage` into an [`ImageBuffer`].
pub fn from_rgba(img: &image::RgbaImage) -> Result<ImageBuffer, ImageError> {
    ImageBuffer::new(
        img.width() as usize,
        img.height() as usize,
        PixelFormat::Rgba8,
        img.as_raw().clone(),
    )
}

/// Wrap an `image::GrayImage` into an [`ImageBuffer`].
pub fn from_gray(img: &image::GrayImage) -> Result<ImageBuffer, ImageError> {
    ImageBuffer::new(
        img.width() as usize,
        img.height() as usize,
        PixelFormat::Gray8,
        img.as_raw().clone(),
    )
}

/// Convert any decoded image to an RGBA [`ImageBuffer`].
pub fn from_dynamic(img: &image::DynamicImage) -> Result<ImageBuffer, ImageError> {
    from_rgba(&img.to_rgba8())
}

/// Render an [`ImageBuffer`] back into an `image::DynamicImage`.
pub fn to_dynamic(buf: &ImageBuffer) -> Result<image::DynamicImage, AdaptError> {
    let w = buf.width() as u32;
    let h = buf.height() as u32;
    match buf.format() {
        PixelFormat::Gray8 => image::GrayImage::from_raw(w, h, buf.data().to_vec())
            .map(image::DynamicImage::ImageLuma8)
            .ok_or_else(|| {
                AdaptError::Image(ImageError::InvalidDimensions {
                    width: buf.width(),
                    height: buf.height(),
                })
            }),
        PixelFormat::Rgba8 => image::RgbaImage::from_raw(w, h, buf.data().to_vec())
            .map(image::DynamicImage::ImageRgba8)
            .ok_or_else(|| {
                AdaptError::Image(ImageError::InvalidDimensions {
                    width: buf.width(),
                    height: buf.height(),
                })
            }),
    }
}

/// Decode a file into an RGBA [`ImageBuffer`].
pub fn load_rgba(path: impl AsRef<Path>) -> Result<ImageBuffer, AdaptError> {
    let img = image::ImageReader::open(path)?.decode()?;
    Ok(from_dynamic(&img)?)
}

/// Decode a file into a grayscale [`ImageBuffer`].
pub fn load_gray(path: impl AsRef<Path>) -> Result<ImageBuffer, AdaptError> {
    let img = image::ImageReader::open(path)?.decode()?.to_luma8();
    Ok(from_gray(&img)?)
}

/// Encode an [`ImageBuffer`] to a file; the format follows the extension.
pub fn save(buf: &ImageBuffer, path: impl AsRef<Path>) -> Result<(), AdaptError> {
    to_dynamic(buf)?.save(path)?;
    Ok(())
}
