//! Blob contour extraction for the flextarget pipeline.
//!
//! Operates on binary single-channel images (0/255 masks as produced by the
//! color thresholder): finds connected foreground blobs, traces their
//! boundaries and reports per-blob center/radius measures. Results are
//! stable: blobs are listed in raster order of their first-scanned pixel,
//! so identical input always yields identical output order.

mod binarize;
mod draw;
mod filter;
mod geom;
mod label;
mod trace;

pub use binarize::{binarize_otsu, otsu_threshold};
pub use draw::overlay_circles;
pub use filter::{drop_boundary_measures, suppress_near_duplicates};
pub use geom::{
    convex_hull, min_area_rect, order_corners_canonical, quad_output_size, MinAreaRect,
};
pub use label::{label_mask, Blob, BlobLabels, Connectivity};
pub use trace::{Contour, ContourMeasure};

use flextarget_core::{ImageBuffer, ImageError, PixelFormat};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Foreground cut for binary inputs: 0/255 masks pass through, grayscale
/// renderings of masks still split sensibly.
const FOREGROUND_MIN: u8 = 128;

fn foreground_mask(binary: &ImageBuffer) -> Result<(Vec<bool>, usize, usize), ImageError> {
    binary.expect_format(PixelFormat::Gray8)?;
    let mask = binary.data().iter().map(|&v| v >= FOREGROUND_MIN).collect();
    Ok((mask, binary.width(), binary.height()))
}

/// Find every connected foreground blob and trace its closed outer
/// boundary. Blobs touching the image border are reported like any other.
///
/// An image with no foreground yields an empty vector; that is a valid
/// result, not an error.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(binary), fields(width = binary.width(), height = binary.height()))
)]
pub fn find_contours(binary: &ImageBuffer) -> Result<Vec<Contour>, ImageError> {
    let (mask, w, h) = foreground_mask(binary)?;
    let labeled = label_mask(&mask, w, h, Connectivity::Eight);

    let contours = (0..labeled.blobs.len())
        .map(|i| {
            let boundary = trace::trace_boundary(&labeled, i);
            Contour {
                points: boundary
                    .into_iter()
                    .map(|(x, y)| Point2::new(x as f32, y as f32))
                    .collect(),
                area: labeled.blobs[i].area as f32,
            }
        })
        .collect();

    log::debug!(
        "found {} contour(s) in {}x{} binary image",
        labeled.blobs.len(),
        w,
        h
    );

    Ok(contours)
}

/// Centroid of every connected foreground blob.
pub fn centers_of_contours(binary: &ImageBuffer) -> Result<Vec<Point2<f32>>, ImageError> {
    let (mask, w, h) = foreground_mask(binary)?;
    let labeled = label_mask(&mask, w, h, Connectivity::Eight);
    Ok(labeled.blobs.iter().map(|b| b.centroid()).collect())
}

/// Centroid plus enclosing radius of every connected foreground blob.
///
/// See [`ContourMeasure`] for the exact radius definition.
pub fn centers_and_radius_of_contours(
    binary: &ImageBuffer,
) -> Result<Vec<ContourMeasure>, ImageError> {
    let (mask, w, h) = foreground_mask(binary)?;
    let labeled = label_mask(&mask, w, h, Connectivity::Eight);
    Ok(labeled.blobs.iter().map(trace::measure_blob).collect())
}

/// Detect blobs and return a copy of `img` with a circle stroked around each
/// one.
///
/// Accepts both pixel formats; a non-binary input is reduced internally with
/// [`binarize_otsu`], taking the minority side of the split as foreground —
/// measured blobs are sparse marks on a large background, whichever polarity
/// they come in. The returned image differs from the input only on the
/// stroked outlines.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img), fields(width = img.width(), height = img.height()))
)]
pub fn draw_circles_on_contours(img: &ImageBuffer) -> Result<ImageBuffer, ImageError> {
    let binary = match img.format() {
        PixelFormat::Gray8 if is_two_level(img.data()) => img.clone(),
        _ => {
            let mut mask = binarize_otsu(img)?;
            let fg = mask.data().iter().filter(|&&v| v == 255).count();
            if fg * 2 > mask.data().len() {
                let inverted = mask.data().iter().map(|&v| 255 - v).collect();
                mask = ImageBuffer::new(mask.width(), mask.height(), PixelFormat::Gray8, inverted)?;
            }
            mask
        }
    };
    let measures = centers_and_radius_of_contours(&binary)?;
    overlay_circles(img, &measures)
}

fn is_two_level(data: &[u8]) -> bool {
    data.iter().all(|&v| v == 0 || v == 255)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Paint filled disks of the given centers/radii on a black canvas.
    fn disk_image(w: usize, h: usize, disks: &[(f32, f32, f32)]) -> ImageBuffer {
        let mut data = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                for &(cx, cy, r) in disks {
                    let dx = x as f32 - cx;
                    let dy = y as f32 - cy;
                    if dx * dx + dy * dy <= r * r {
                        data[y * w + x] = 255;
                    }
                }
            }
        }
        ImageBuffer::new(w, h, PixelFormat::Gray8, data).unwrap()
    }

    #[test]
    fn no_foreground_yields_empty_result_not_error() {
        let img = ImageBuffer::filled(32, 32, PixelFormat::Gray8, 0).unwrap();
        assert!(centers_of_contours(&img).unwrap().is_empty());
        assert!(find_contours(&img).unwrap().is_empty());
    }

    #[test]
    fn rgba_input_is_rejected() {
        let img = ImageBuffer::filled(4, 4, PixelFormat::Rgba8, 0).unwrap();
        assert!(matches!(
            centers_of_contours(&img),
            Err(ImageError::FormatMismatch { .. })
        ));
    }

    #[test]
    fn single_disk_center_and_radius_match_ground_truth() {
        let img = disk_image(64, 64, &[(31.0, 33.0, 10.0)]);
        let measures = centers_and_radius_of_contours(&img).unwrap();
        assert_eq!(measures.len(), 1);
        let m = measures[0];
        assert!((m.center.x - 31.0).abs() < 0.5, "cx = {}", m.center.x);
        assert!((m.center.y - 33.0).abs() < 0.5, "cy = {}", m.center.y);
        assert!((m.radius - 10.0).abs() < 1.0, "r = {}", m.radius);
    }

    #[test]
    fn five_disks_are_all_found_in_stable_order() {
        let disks = [
            (10.0, 10.0, 4.0),
            (50.0, 12.0, 5.0),
            (30.0, 40.0, 6.0),
            (70.0, 44.0, 4.0),
            (15.0, 70.0, 5.0),
        ];
        let img = disk_image(96, 96, &disks);
        let a = centers_and_radius_of_contours(&img).unwrap();
        let b = centers_and_radius_of_contours(&img).unwrap();
        assert_eq!(a.len(), 5);

        // Determinism: identical runs, identical order.
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.center, y.center);
            assert_eq!(x.radius, y.radius);
        }

        // Every ground-truth disk is matched by exactly one measure.
        for &(cx, cy, r) in &disks {
            let hits = a
                .iter()
                .filter(|m| (m.center.x - cx).abs() < 1.0 && (m.center.y - cy).abs() < 1.0)
                .count();
            assert_eq!(hits, 1, "disk at ({cx},{cy}) radius {r}");
        }
    }

    #[test]
    fn fifty_disks_on_a_grid_are_all_found() {
        // 50 well-separated disks on a 10x5 grid.
        let mut disks = Vec::new();
        for j in 0..5 {
            for i in 0..10 {
                disks.push((20.0 + i as f32 * 24.0, 20.0 + j as f32 * 24.0, 6.0));
            }
        }
        let img = disk_image(260, 140, &disks);
        let measures = centers_and_radius_of_contours(&img).unwrap();
        assert_eq!(measures.len(), 50);
        for m in &measures {
            assert!((m.radius - 6.0).abs() < 1.0);
        }
    }

    #[test]
    fn border_touching_blob_is_still_reported() {
        let img = disk_image(40, 40, &[(0.0, 20.0, 6.0)]);
        let measures = centers_and_radius_of_contours(&img).unwrap();
        assert_eq!(measures.len(), 1);
    }

    #[test]
    fn draw_circles_keeps_off_outline_pixels() {
        let img = disk_image(48, 48, &[(24.0, 24.0, 6.0)]);
        let out = draw_circles_on_contours(&img).unwrap();
        assert_eq!(out.width(), 48);
        // A pixel far from the disk and its outline is unchanged.
        assert_eq!(out.data()[2 * 48 + 2], img.data()[2 * 48 + 2]);
    }
}
