use serde::{Deserialize, Serialize};

/// Channel layout of an [`ImageBuffer`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Single 8-bit channel. Binary masks use 0/255.
    Gray8,
    /// Packed 8-bit R, G, B, A.
    Rgba8,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Errors for malformed or mismatched image inputs.
#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },

    #[error("image buffer length mismatch (expected {expected} bytes, got {got})")]
    BufferLengthMismatch { expected: usize, got: usize },

    #[error("unexpected pixel format (expected {expected:?}, got {got:?})")]
    FormatMismatch {
        expected: PixelFormat,
        got: PixelFormat,
    },
}

/// Owned, row-major raster image.
///
/// Every pipeline stage treats its input as immutable and returns a freshly
/// allocated buffer; the type has no interior mutability and no shared state.
#[derive(Clone, Debug)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Wrap raw pixel data, validating dimensions against the buffer length.
    pub fn new(
        width: usize,
        height: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidDimensions { width, height });
        }
        let expected = width * height * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(ImageError::BufferLengthMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Allocate a constant-valued image.
    pub fn filled(
        width: usize,
        height: usize,
        format: PixelFormat,
        value: u8,
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidDimensions { width, height });
        }
        let data = vec![value; width * height * format.bytes_per_pixel()];
        Self::new(width, height, format, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Error unless the image carries the expected pixel format.
    pub fn expect_format(&self, expected: PixelFormat) -> Result<(), ImageError> {
        if self.format == expected {
            Ok(())
        } else {
            Err(ImageError::FormatMismatch {
                expected,
                got: self.format,
            })
        }
    }

    pub fn gray_view(&self) -> Result<GrayView<'_>, ImageError> {
        self.expect_format(PixelFormat::Gray8)?;
        Ok(GrayView {
            width: self.width,
            height: self.height,
            data: &self.data,
        })
    }

    pub fn rgba_view(&self) -> Result<RgbaView<'_>, ImageError> {
        self.expect_format(PixelFormat::Rgba8)?;
        Ok(RgbaView {
            width: self.width,
            height: self.height,
            data: &self.data,
        })
    }

    /// Luminance rendition of the image (Rec.601 integer weights).
    ///
    /// A `Gray8` input comes back as a plain copy.
    pub fn to_luma(&self) -> ImageBuffer {
        match self.format {
            PixelFormat::Gray8 => self.clone(),
            PixelFormat::Rgba8 => {
                let mut out = Vec::with_capacity(self.width * self.height);
                for px in self.data.chunks_exact(4) {
                    let r = px[0] as u32;
                    let g = px[1] as u32;
                    let b = px[2] as u32;
                    out.push(((77 * r + 150 * g + 29 * b) >> 8) as u8);
                }
                ImageBuffer {
                    width: self.width,
                    height: self.height,
                    format: PixelFormat::Gray8,
                    data: out,
                }
            }
        }
    }
}

/// Borrowed view of a single-channel image.
#[derive(Clone, Copy, Debug)]
pub struct GrayView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

/// Borrowed view of a packed RGBA image.
#[derive(Clone, Copy, Debug)]
pub struct RgbaView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h*4
}

#[inline]
fn get_gray(src: &GrayView<'_>, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return 0;
    }
    src.data[y as usize * src.width + x as usize]
}

#[inline]
fn get_rgba(src: &RgbaView<'_>, x: i32, y: i32) -> [u8; 4] {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return [0; 4];
    }
    let off = (y as usize * src.width + x as usize) * 4;
    [
        src.data[off],
        src.data[off + 1],
        src.data[off + 2],
        src.data[off + 3],
    ]
}

/// Bilinear sample at `(x, y)`; out-of-bounds taps read 0.
#[inline]
pub fn sample_bilinear_gray(src: &GrayView<'_>, x: f32, y: f32) -> u8 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_gray(src, x0, y0) as f32;
    let p10 = get_gray(src, x0 + 1, y0) as f32;
    let p01 = get_gray(src, x0, y0 + 1) as f32;
    let p11 = get_gray(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    (a + fy * (b - a)).round().clamp(0.0, 255.0) as u8
}

/// Bilinear sample of all four channels; out-of-bounds taps read 0
/// (transparent black).
#[inline]
pub fn sample_bilinear_rgba(src: &RgbaView<'_>, x: f32, y: f32) -> [u8; 4] {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_rgba(src, x0, y0);
    let p10 = get_rgba(src, x0 + 1, y0);
    let p01 = get_rgba(src, x0, y0 + 1);
    let p11 = get_rgba(src, x0 + 1, y0 + 1);

    let mut out = [0u8; 4];
    for c in 0..4 {
        let a = p00[c] as f32 + fx * (p10[c] as f32 - p00[c] as f32);
        let b = p01[c] as f32 + fx * (p11[c] as f32 - p01[c] as f32);
        out[c] = (a + fy * (b - a)).round().clamp(0.0, 255.0) as u8;
    }
    out
}
