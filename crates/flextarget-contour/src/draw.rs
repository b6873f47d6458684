//! Circle overlay rendering for contour visualization.

use flextarget_core::{ImageBuffer, PixelFormat};

use crate::trace::ContourMeasure;

/// Overlay color for RGBA images; gray images use its red channel.
const OVERLAY_RGBA: [u8; 4] = [255, 0, 0, 255];

#[inline]
fn plot(data: &mut [u8], width: usize, height: usize, format: PixelFormat, x: i32, y: i32) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return;
    }
    let idx = y as usize * width + x as usize;
    match format {
        PixelFormat::Gray8 => data[idx] = OVERLAY_RGBA[0],
        PixelFormat::Rgba8 => data[idx * 4..idx * 4 + 4].copy_from_slice(&OVERLAY_RGBA),
    }
}

/// Midpoint-circle outline, one pixel wide, clipped to the image.
fn draw_circle(
    data: &mut [u8],
    width: usize,
    height: usize,
    format: PixelFormat,
    cx: i32,
    cy: i32,
    radius: i32,
) {
    if radius <= 0 {
        plot(data, width, height, format, cx, cy);
        return;
    }

    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;

    while x >= y {
        for (px, py) in [
            (cx + x, cy + y),
            (cx + y, cy + x),
            (cx - y, cy + x),
            (cx - x, cy + y),
            (cx - x, cy - y),
            (cx - y, cy - x),
            (cx + y, cy - x),
            (cx + x, cy - y),
        ] {
            plot(data, width, height, format, px, py);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// Copy `img` and stroke one circle per measure. Pixels not on an outline
/// are untouched.
pub fn overlay_circles(
    img: &ImageBuffer,
    measures: &[ContourMeasure],
) -> Result<ImageBuffer, flextarget_core::ImageError> {
    let mut data = img.data().to_vec();
    for m in measures {
        draw_circle(
            &mut data,
            img.width(),
            img.height(),
            img.format(),
            m.center.x.round() as i32,
            m.center.y.round() as i32,
            m.radius.round() as i32,
        );
    }
    ImageBuffer::new(img.width(), img.height(), img.format(), data)
}
