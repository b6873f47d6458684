//! Black reference-frame detection.
//!
//! A flextarget screen is marked by a thick dark rectangle drawn around it.
//! [`detect_black_frame`] finds that ring in a captured image and returns
//! the enclosed screen area as an upright, perspective-corrected image.
//!
//! Detection works on the ring's *interior hole* rather than the ring
//! itself: dark pixels are labeled into components, enclosed background
//! regions are collected per component, and each hole is tested for
//! rectangularity against its minimum-area enclosing rectangle. Working
//! with the hole directly gives the screen boundary without having to peel
//! the ring thickness off an outer contour.

use flextarget_contour::{
    convex_hull, label_mask, min_area_rect, order_corners_canonical, quad_output_size, BlobLabels,
    Connectivity, MinAreaRect,
};
use flextarget_core::{rectify_image, ImageBuffer, WarpError};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors returned by the frame locator.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error(transparent)]
    Warp(#[from] WarpError),
    #[error("no qualifying black rectangular frame found")]
    FrameNotFound,
}

fn default_dark_max() -> u8 {
    80
}

fn default_min_area_frac() -> f32 {
    0.01
}

fn default_min_hole_area() -> usize {
    64
}

fn default_min_rectangularity() -> f32 {
    0.85
}

/// Tuning for [`detect_black_frame`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameParams {
    /// Luma at or below which a pixel counts as frame ink.
    #[serde(default = "default_dark_max")]
    pub dark_max: u8,
    /// Minimum dark-component area as a fraction of the image.
    #[serde(default = "default_min_area_frac")]
    pub min_area_frac: f32,
    /// Minimum interior hole area in pixels.
    #[serde(default = "default_min_hole_area")]
    pub min_hole_area: usize,
    /// Minimum `hole area / min-area-rect area` for a hole to count as
    /// rectangular.
    #[serde(default = "default_min_rectangularity")]
    pub min_rectangularity: f32,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            dark_max: default_dark_max(),
            min_area_frac: default_min_area_frac(),
            min_hole_area: default_min_hole_area(),
            min_rectangularity: default_min_rectangularity(),
        }
    }
}

struct HoleCandidate {
    area: usize,
    rect: MinAreaRect,
}

/// Locate the largest dark rectangular frame and return its rectified
/// interior.
///
/// The output image keeps the input's pixel format and is sized to the mean
/// opposite side lengths of the detected interior, so a rotated frame comes
/// back upright rather than merely cropped. Ambiguity between equally
/// plausible frames resolves deterministically: largest interior area wins,
/// ties go to the top-most then left-most rectangle center.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn detect_black_frame(img: &ImageBuffer, params: &FrameParams) -> Result<ImageBuffer, FrameError> {
    let luma = img.to_luma();
    let w = luma.width();
    let h = luma.height();

    let dark: Vec<bool> = luma.data().iter().map(|&v| v <= params.dark_max).collect();
    let dark_labels = label_mask(&dark, w, h, Connectivity::Eight);

    let background: Vec<bool> = dark.iter().map(|&d| !d).collect();
    let bg_labels = label_mask(&background, w, h, Connectivity::Four);

    let min_frame_area = ((w * h) as f32 * params.min_area_frac) as usize;

    let mut best: Option<HoleCandidate> = None;
    for (i, hole) in bg_labels.blobs.iter().enumerate() {
        if hole.touches_border(w, h) || hole.area < params.min_hole_area {
            continue;
        }

        let Some(owner) = enclosing_dark_area(&dark_labels, &bg_labels, i) else {
            continue;
        };
        if owner < min_frame_area {
            continue;
        }

        let pts: Vec<Point2<f32>> = hole
            .pixels
            .iter()
            .map(|&(x, y)| Point2::new(x as f32, y as f32))
            .collect();
        let hull = convex_hull(&pts);
        let Some(rect) = min_area_rect(&hull) else {
            continue;
        };
        if rect.area() <= f32::EPSILON {
            continue;
        }
        let rectangularity = hole.area as f32 / rect.area();
        if rectangularity < params.min_rectangularity {
            log::debug!(
                "hole at {:?} rejected: rectangularity {:.3}",
                hole.seed,
                rectangularity
            );
            continue;
        }

        let candidate = HoleCandidate {
            area: hole.area,
            rect,
        };
        if better_candidate(&candidate, best.as_ref()) {
            best = Some(candidate);
        }
    }

    let best = best.ok_or(FrameError::FrameNotFound)?;
    let corners = order_corners_canonical(&best.rect.corners);
    let (out_w, out_h) = quad_output_size(&corners);
    log::debug!(
        "frame interior area {} px, rectifying to {}x{}",
        best.area,
        out_w,
        out_h
    );

    Ok(rectify_image(img, &corners, out_w, out_h)?)
}

/// Area of the dark component that surrounds hole `hole_index`, if any.
///
/// Every non-border background component is enclosed by exactly one dark
/// component, reachable through any 4-neighbor of any hole pixel.
fn enclosing_dark_area(
    dark_labels: &BlobLabels,
    bg_labels: &BlobLabels,
    hole_index: usize,
) -> Option<usize> {
    let hole = &bg_labels.blobs[hole_index];
    for &(x, y) in &hole.pixels {
        for (nx, ny) in [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ] {
            if nx >= dark_labels.width || ny >= dark_labels.height {
                continue;
            }
            let label = dark_labels.label_at(nx, ny);
            if label != 0 {
                return Some(dark_labels.blobs[label as usize - 1].area);
            }
        }
    }
    None
}

fn better_candidate(candidate: &HoleCandidate, best: Option<&HoleCandidate>) -> bool {
    let Some(best) = best else {
        return true;
    };
    if candidate.area != best.area {
        return candidate.area > best.area;
    }
    // Tie-break: top-most, then left-most rectangle center.
    let center = |r: &MinAreaRect| {
        let mut cx = 0.0f32;
        let mut cy = 0.0f32;
        for c in &r.corners {
            cx += c.x;
            cy += c.y;
        }
        (cy / 4.0, cx / 4.0)
    };
    center(&candidate.rect) < center(&best.rect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flextarget_core::PixelFormat;

    /// White canvas with a dark rectangular ring, optionally rotated about
    /// the ring center.
    fn ring_image(
        w: usize,
        h: usize,
        center: (f32, f32),
        inner: (f32, f32),
        thickness: f32,
        angle_deg: f32,
    ) -> ImageBuffer {
        let (s, c) = (angle_deg.to_radians().sin(), angle_deg.to_radians().cos());
        let mut data = vec![255u8; w * h];
        for y in 0..h {
            for x in 0..w {
                // Rotate back into the ring's own frame.
                let dx = x as f32 - center.0;
                let dy = y as f32 - center.1;
                let u = (c * dx + s * dy).abs();
                let v = (-s * dx + c * dy).abs();
                let half_w = inner.0 / 2.0;
                let half_h = inner.1 / 2.0;
                let inside_outer = u <= half_w + thickness && v <= half_h + thickness;
                let inside_inner = u < half_w && v < half_h;
                if inside_outer && !inside_inner {
                    data[y * w + x] = 10;
                }
            }
        }
        ImageBuffer::new(w, h, PixelFormat::Gray8, data).unwrap()
    }

    #[test]
    fn detects_axis_aligned_frame_interior() {
        let img = ring_image(200, 150, (100.0, 75.0), (120.0, 70.0), 8.0, 0.0);
        let out = detect_black_frame(&img, &FrameParams::default()).expect("frame");
        assert!(
            (out.width() as i64 - 120).abs() <= 3,
            "width = {}",
            out.width()
        );
        assert!(
            (out.height() as i64 - 70).abs() <= 3,
            "height = {}",
            out.height()
        );
    }

    #[test]
    fn detects_rotated_frame_and_rectifies_upright() {
        let img = ring_image(240, 200, (120.0, 100.0), (110.0, 64.0), 9.0, 15.0);
        let out = detect_black_frame(&img, &FrameParams::default()).expect("frame");
        assert!(
            (out.width() as i64 - 110).abs() <= 5,
            "width = {}",
            out.width()
        );
        assert!(
            (out.height() as i64 - 64).abs() <= 5,
            "height = {}",
            out.height()
        );
    }

    #[test]
    fn interior_of_detected_frame_is_bright() {
        let img = ring_image(200, 150, (100.0, 75.0), (120.0, 70.0), 8.0, 10.0);
        let out = detect_black_frame(&img, &FrameParams::default()).expect("frame");
        // Sample the middle of the rectified interior: white screen area.
        let cx = out.width() / 2;
        let cy = out.height() / 2;
        assert!(out.data()[cy * out.width() + cx] > 200);
    }

    #[test]
    fn blank_image_reports_not_found() {
        let img = ImageBuffer::filled(64, 64, PixelFormat::Gray8, 255).unwrap();
        assert!(matches!(
            detect_black_frame(&img, &FrameParams::default()),
            Err(FrameError::FrameNotFound)
        ));
    }

    #[test]
    fn round_blob_is_not_a_frame() {
        // Dark disk with a round hole: rejected by the rectangularity gate.
        let mut data = vec![255u8; 200 * 200];
        for y in 0..200usize {
            for x in 0..200usize {
                let dx = x as f32 - 100.0;
                let dy = y as f32 - 100.0;
                let d = (dx * dx + dy * dy).sqrt();
                if d <= 80.0 && d >= 50.0 {
                    data[y * 200 + x] = 0;
                }
            }
        }
        let img = ImageBuffer::new(200, 200, PixelFormat::Gray8, data).unwrap();
        assert!(matches!(
            detect_black_frame(&img, &FrameParams::default()),
            Err(FrameError::FrameNotFound)
        ));
    }

    #[test]
    fn largest_of_two_frames_wins() {
        // Two rings; the right one has the larger interior.
        let mut img = ring_image(320, 160, (70.0, 80.0), (60.0, 40.0), 6.0, 0.0);
        let overlay = ring_image(320, 160, (220.0, 80.0), (120.0, 80.0), 6.0, 0.0);
        let mut data = img.data().to_vec();
        for (d, &o) in data.iter_mut().zip(overlay.data()) {
            *d = (*d).min(o);
        }
        img = ImageBuffer::new(320, 160, PixelFormat::Gray8, data).unwrap();

        let out = detect_black_frame(&img, &FrameParams::default()).expect("frame");
        assert!(
            (out.width() as i64 - 120).abs() <= 3,
            "width = {}",
            out.width()
        );
    }

    #[test]
    fn rgba_input_is_supported() {
        let gray = ring_image(200, 150, (100.0, 75.0), (100.0, 60.0), 8.0, 0.0);
        let mut rgba = Vec::with_capacity(200 * 150 * 4);
        for &v in gray.data() {
            rgba.extend_from_slice(&[v, v, v, 255]);
        }
        let img = ImageBuffer::new(200, 150, PixelFormat::Rgba8, rgba).unwrap();
        let out = detect_black_frame(&img, &FrameParams::default()).expect("frame");
        assert_eq!(out.format(), PixelFormat::Rgba8);
    }
}
