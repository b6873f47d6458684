//! Core types and utilities for the flextarget optical measurement pipeline.
//!
//! This crate is intentionally small and purely geometric: the neutral
//! [`ImageBuffer`] raster type, exact four-point homography estimation and
//! perspective resampling. It does *not* depend on any platform image type
//! or I/O crate; converting to and from host image representations is an
//! adapter's job (see the `flextarget` facade crate).

mod homography;
mod image;
mod logger;
mod warp;

pub use homography::{homography_from_4pt, GeometryError, Homography};
pub use image::{
    sample_bilinear_gray, sample_bilinear_rgba, GrayView, ImageBuffer, ImageError, PixelFormat,
    RgbaView,
};
pub use warp::{dst_corners, rectify_image, rectify_image_and_matrix, warp_image, WarpError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
