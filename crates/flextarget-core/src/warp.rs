use nalgebra::Point2;

use crate::homography::{homography_from_4pt, GeometryError, Homography};
use crate::image::{
    sample_bilinear_gray, sample_bilinear_rgba, ImageBuffer, ImageError, PixelFormat,
};

/// Errors from perspective rectification and warping.
#[derive(thiserror::Error, Debug)]
pub enum WarpError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// The four corners of a `w × h` output raster in canonical order:
/// top-left, top-right, bottom-right, bottom-left.
pub fn dst_corners(out_w: usize, out_h: usize) -> [Point2<f32>; 4] {
    let w = out_w as f32;
    let h = out_h as f32;
    [
        Point2::new(0.0, 0.0),
        Point2::new(w, 0.0),
        Point2::new(w, h),
        Point2::new(0.0, h),
    ]
}

/// Resample the quadrilateral bounded by `points` into an upright
/// `out_w × out_h` image.
///
/// `points` are the source corners in canonical order (TL, TR, BR, BL).
/// Output pixels that map outside the source read as 0 (black/transparent).
pub fn rectify_image(
    img: &ImageBuffer,
    points: &[Point2<f32>; 4],
    out_w: usize,
    out_h: usize,
) -> Result<ImageBuffer, WarpError> {
    rectify_image_and_matrix(img, points, out_w, out_h).map(|(out, _)| out)
}

/// Like [`rectify_image`], additionally returning the source→output
/// homography so the same transform can be re-applied to later frames via
/// [`warp_image`] without re-estimation.
pub fn rectify_image_and_matrix(
    img: &ImageBuffer,
    points: &[Point2<f32>; 4],
    out_w: usize,
    out_h: usize,
) -> Result<(ImageBuffer, Homography), WarpError> {
    let h = homography_from_4pt(points, &dst_corners(out_w, out_h))?;
    let out = warp_image(img, &h, out_w, out_h)?;
    Ok((out, h))
}

/// Apply a caller-supplied source→output homography.
///
/// This is the resampling primitive underneath [`rectify_image`]; applying a
/// matrix returned by [`rectify_image_and_matrix`] to the same input
/// reproduces the rectified image exactly (both paths invert the same
/// forward matrix and share the sampling loop).
pub fn warp_image(
    img: &ImageBuffer,
    h: &Homography,
    out_w: usize,
    out_h: usize,
) -> Result<ImageBuffer, WarpError> {
    if out_w == 0 || out_h == 0 {
        return Err(ImageError::InvalidDimensions {
            width: out_w,
            height: out_h,
        }
        .into());
    }
    let h_src_from_out = h.inverse().ok_or(GeometryError::SingularHomography)?;

    let out = match img.format() {
        PixelFormat::Gray8 => {
            let src = img.gray_view()?;
            let mut data = vec![0u8; out_w * out_h];
            for y in 0..out_h {
                for x in 0..out_w {
                    // Integer output coords map straight through the inverse
                    // matrix, so an identity homography is an exact copy.
                    let po = Point2::new(x as f32, y as f32);
                    let ps = h_src_from_out.apply(po);
                    data[y * out_w + x] = sample_bilinear_gray(&src, ps.x, ps.y);
                }
            }
            ImageBuffer::new(out_w, out_h, PixelFormat::Gray8, data)?
        }
        PixelFormat::Rgba8 => {
            let src = img.rgba_view()?;
            let mut data = vec![0u8; out_w * out_h * 4];
            for y in 0..out_h {
                for x in 0..out_w {
                    let po = Point2::new(x as f32, y as f32);
                    let ps = h_src_from_out.apply(po);
                    let px = sample_bilinear_rgba(&src, ps.x, ps.y);
                    let off = (y * out_w + x) * 4;
                    data[off..off + 4].copy_from_slice(&px);
                }
            }
            ImageBuffer::new(out_w, out_h, PixelFormat::Rgba8, data)?
        }
    };

    Ok(out)
}
