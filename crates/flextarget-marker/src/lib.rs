//! Four-marker rectification.
//!
//! A flextarget sheet carries four dark square markers, one near each
//! corner. [`rectify_within_markers`] locates them, orders their centers
//! into the canonical TL/TR/BR/BL sequence and rectifies the quadrilateral
//! they bound into an upright image.
//!
//! Marker *payloads* are deliberately not decoded here — the capture layer
//! owns code reading; this crate only needs the four center positions.

use flextarget_contour::{
    convex_hull, label_mask, min_area_rect, order_corners_canonical, otsu_threshold,
    quad_output_size, Blob, Connectivity,
};
use flextarget_core::{rectify_image_and_matrix, Homography, ImageBuffer, WarpError};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors returned by the marker rectifier.
#[derive(thiserror::Error, Debug)]
pub enum MarkerError {
    #[error(transparent)]
    Warp(#[from] WarpError),
    #[error("found {found} marker candidate(s), need 4")]
    NotEnoughMarkers { found: usize },
    #[error("marker centers are degenerate (near-collinear)")]
    DegenerateLayout,
}

fn default_min_area() -> usize {
    25
}

fn default_min_fill() -> f32 {
    0.75
}

fn default_min_aspect() -> f32 {
    0.7
}

/// Tuning for marker candidate selection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarkerParams {
    /// Minimum marker blob area in pixels.
    #[serde(default = "default_min_area")]
    pub min_area: usize,
    /// Minimum `blob area / min-area-rect area`: squares fill their
    /// enclosing rectangle, streaks and ring fragments do not.
    #[serde(default = "default_min_fill")]
    pub min_fill: f32,
    /// Minimum short/long side ratio of the enclosing rectangle.
    #[serde(default = "default_min_aspect")]
    pub min_aspect: f32,
}

impl Default for MarkerParams {
    fn default() -> Self {
        Self {
            min_area: default_min_area(),
            min_fill: default_min_fill(),
            min_aspect: default_min_aspect(),
        }
    }
}

/// Result of a successful four-marker rectification.
#[derive(Clone, Debug)]
pub struct MarkerRectification {
    /// Rectified quadrilateral interior, same pixel format as the input.
    pub image: ImageBuffer,
    /// Marker centers in canonical order (TL, TR, BR, BL), input pixel
    /// coordinates.
    pub centers: [Point2<f32>; 4],
    /// Source→output homography, reusable on later frames via
    /// [`flextarget_core::warp_image`].
    pub homography: Homography,
}

/// Locate the four corner markers and rectify the area they bound.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn rectify_within_markers(
    img: &ImageBuffer,
    params: &MarkerParams,
) -> Result<MarkerRectification, MarkerError> {
    let centers = locate_marker_centers(img, params)?;
    let ordered = order_corners_canonical(&centers);

    if quad_area(&ordered) < 1.0 {
        return Err(MarkerError::DegenerateLayout);
    }

    let (out_w, out_h) = quad_output_size(&ordered);
    let (image, homography) = rectify_image_and_matrix(img, &ordered, out_w, out_h)?;

    Ok(MarkerRectification {
        image,
        centers: ordered,
        homography,
    })
}

/// Centers of the four strongest marker candidates, unordered.
pub fn locate_marker_centers(
    img: &ImageBuffer,
    params: &MarkerParams,
) -> Result<[Point2<f32>; 4], MarkerError> {
    let luma = img.to_luma();
    let w = luma.width();
    let h = luma.height();

    let thr = otsu_threshold(luma.data());
    let dark: Vec<bool> = luma.data().iter().map(|&v| v <= thr).collect();
    let labeled = label_mask(&dark, w, h, Connectivity::Eight);

    let mut candidates: Vec<&Blob> = labeled
        .blobs
        .iter()
        .filter(|b| b.area >= params.min_area && is_square_blob(b, params))
        .collect();

    log::debug!(
        "{} of {} dark blobs qualify as markers",
        candidates.len(),
        labeled.blobs.len()
    );

    if candidates.len() < 4 {
        return Err(MarkerError::NotEnoughMarkers {
            found: candidates.len(),
        });
    }

    // Keep the four largest; stable sort preserves raster order on ties.
    candidates.sort_by(|a, b| b.area.cmp(&a.area));
    let centers = [
        candidates[0].centroid(),
        candidates[1].centroid(),
        candidates[2].centroid(),
        candidates[3].centroid(),
    ];
    Ok(centers)
}

fn is_square_blob(blob: &Blob, params: &MarkerParams) -> bool {
    let pts: Vec<Point2<f32>> = blob
        .pixels
        .iter()
        .map(|&(x, y)| Point2::new(x as f32, y as f32))
        .collect();
    let hull = convex_hull(&pts);
    let Some(rect) = min_area_rect(&hull) else {
        return false;
    };
    if rect.area() <= f32::EPSILON {
        return false;
    }
    // Pixel-center extents under-count the rasterized area by one pixel per
    // axis; allow fills slightly above 1.
    let fill = blob.area as f32 / rect.area();
    fill >= params.min_fill && rect.aspect() >= params.min_aspect
}

/// Shoelace area of an ordered quad.
fn quad_area(c: &[Point2<f32>; 4]) -> f32 {
    let mut acc = 0.0f64;
    for i in 0..4 {
        let p = c[i];
        let q = c[(i + 1) % 4];
        acc += (p.x as f64) * (q.y as f64) - (q.x as f64) * (p.y as f64);
    }
    (acc.abs() / 2.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use flextarget_core::PixelFormat;

    fn white_with_squares(w: usize, h: usize, squares: &[(usize, usize, usize)]) -> ImageBuffer {
        let mut data = vec![255u8; w * h];
        for &(x0, y0, side) in squares {
            for y in y0..(y0 + side).min(h) {
                for x in x0..(x0 + side).min(w) {
                    data[y * w + x] = 0;
                }
            }
        }
        ImageBuffer::new(w, h, PixelFormat::Gray8, data).unwrap()
    }

    #[test]
    fn four_corner_markers_rectify_the_bounded_quad() {
        // 20px squares centered at (30,30), (210,30), (210,150), (30,150).
        let img = white_with_squares(
            240,
            180,
            &[(20, 20, 21), (200, 20, 21), (200, 140, 21), (20, 140, 21)],
        );
        let res = rectify_within_markers(&img, &MarkerParams::default()).expect("markers");

        // Canonical order and ground-truth centers.
        let expected = [(30.0, 30.0), (210.0, 30.0), (210.0, 150.0), (30.0, 150.0)];
        for (c, &(ex, ey)) in res.centers.iter().zip(&expected) {
            assert!((c.x - ex).abs() < 1.0, "cx = {}", c.x);
            assert!((c.y - ey).abs() < 1.0, "cy = {}", c.y);
        }

        // Output size matches the marker spacing.
        assert!((res.image.width() as i64 - 180).abs() <= 2);
        assert!((res.image.height() as i64 - 120).abs() <= 2);
    }

    #[test]
    fn matrix_reapplies_to_a_second_frame() {
        let img = white_with_squares(
            240,
            180,
            &[(20, 20, 21), (200, 20, 21), (200, 140, 21), (20, 140, 21)],
        );
        let res = rectify_within_markers(&img, &MarkerParams::default()).expect("markers");
        let again = flextarget_core::warp_image(
            &img,
            &res.homography,
            res.image.width(),
            res.image.height(),
        )
        .expect("warp");
        assert_eq!(res.image.data(), again.data());
    }

    #[test]
    fn three_markers_is_an_error() {
        let img = white_with_squares(240, 180, &[(20, 20, 21), (200, 20, 21), (200, 140, 21)]);
        match rectify_within_markers(&img, &MarkerParams::default()) {
            Err(MarkerError::NotEnoughMarkers { found: 3 }) => {}
            other => panic!("expected NotEnoughMarkers, got {other:?}"),
        }
    }

    #[test]
    fn collinear_markers_are_degenerate() {
        let img = white_with_squares(
            400,
            100,
            &[(20, 40, 21), (120, 40, 21), (220, 40, 21), (320, 40, 21)],
        );
        assert!(matches!(
            rectify_within_markers(&img, &MarkerParams::default()),
            Err(MarkerError::DegenerateLayout)
        ));
    }

    #[test]
    fn thin_streaks_are_not_markers() {
        // Three squares and a 2px-wide streak: the streak fails the aspect
        // gate, leaving only three candidates.
        let mut img = white_with_squares(240, 180, &[(20, 20, 21), (200, 20, 21), (200, 140, 21)]);
        let mut data = img.data().to_vec();
        for x in 20..80 {
            data[160 * 240 + x] = 0;
            data[161 * 240 + x] = 0;
        }
        img = ImageBuffer::new(240, 180, PixelFormat::Gray8, data).unwrap();
        assert!(matches!(
            rectify_within_markers(&img, &MarkerParams::default()),
            Err(MarkerError::NotEnoughMarkers { found: 3 })
        ));
    }

    #[test]
    fn small_noise_blobs_are_ignored() {
        let mut squares = vec![(20, 20, 21), (200, 20, 21), (200, 140, 21), (20, 140, 21)];
        squares.push((100, 90, 3)); // 9 px speck, below min_area
        let img = white_with_squares(240, 180, &squares);
        let res = rectify_within_markers(&img, &MarkerParams::default()).expect("markers");
        assert_eq!(res.centers.len(), 4);
    }
}
