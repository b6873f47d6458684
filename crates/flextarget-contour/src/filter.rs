//! Post-filters for measured contour centers.
//!
//! Capture rigs report the occasional double detection (one shot split over
//! two adjacent blobs) and spurious blobs hugging the rectified edge where
//! the warp runs out of source pixels. These filters clean both up.

use crate::trace::ContourMeasure;

/// Drop measures closer than `min_dist` to an earlier kept measure.
///
/// Order-preserving greedy pass: the first of a close pair wins, so results
/// are deterministic for a fixed input order.
pub fn suppress_near_duplicates(
    measures: &[ContourMeasure],
    min_dist: f32,
) -> Vec<ContourMeasure> {
    let mut kept: Vec<ContourMeasure> = Vec::with_capacity(measures.len());
    for m in measures {
        let close = kept.iter().any(|k| {
            let dx = m.center.x - k.center.x;
            let dy = m.center.y - k.center.y;
            dx * dx + dy * dy < min_dist * min_dist
        });
        if !close {
            kept.push(*m);
        }
    }
    kept
}

/// Drop measures whose center lies within `margin` pixels of the image
/// edge.
pub fn drop_boundary_measures(
    measures: &[ContourMeasure],
    width: usize,
    height: usize,
    margin: f32,
) -> Vec<ContourMeasure> {
    measures
        .iter()
        .filter(|m| {
            let edge_dist = m
                .center
                .x
                .min(width as f32 - m.center.x)
                .min(m.center.y)
                .min(height as f32 - m.center.y);
            edge_dist >= margin
        })
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn m(x: f32, y: f32) -> ContourMeasure {
        ContourMeasure {
            center: Point2::new(x, y),
            radius: 3.0,
        }
    }

    #[test]
    fn near_duplicates_keep_the_first() {
        let filtered = suppress_near_duplicates(&[m(10.0, 10.0), m(12.0, 11.0), m(80.0, 80.0)], 5.0);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].center, Point2::new(10.0, 10.0));
        assert_eq!(filtered[1].center, Point2::new(80.0, 80.0));
    }

    #[test]
    fn boundary_measures_are_dropped() {
        let filtered = drop_boundary_measures(&[m(2.0, 50.0), m(50.0, 50.0)], 100, 100, 10.0);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].center, Point2::new(50.0, 50.0));
    }
}
