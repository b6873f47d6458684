use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::label::{Blob, BlobLabels};

/// Closed outer boundary of one connected foreground blob.
///
/// Points are boundary pixel coordinates in clockwise order (image
/// coordinates, y down), starting from the blob's top-most then left-most
/// pixel. `area` is the filled pixel count of the blob, not the polygon area
/// of the boundary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<Point2<f32>>,
    pub area: f32,
}

/// Center and effective radius of one blob.
///
/// `center` is the centroid of all filled pixels. `radius` is the radius of
/// the smallest circle centered at that centroid containing every filled
/// pixel center — an enclosing-circle definition, so a drawn circle of this
/// radius covers the blob.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ContourMeasure {
    pub center: Point2<f32>,
    pub radius: f32,
}

/// Clockwise 8-neighborhood in image coordinates (y down):
/// E, SE, S, SW, W, NW, N, NE.
const NEIGHBORS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Moore-neighbour boundary trace of one labeled blob.
///
/// Starts at the blob seed (top-most, left-most pixel) and walks clockwise;
/// terminates on Jacob's criterion (the first move repeats). One-pixel-wide
/// necks are traversed in both directions, so such pixels appear twice.
pub(crate) fn trace_boundary(labeled: &BlobLabels, blob_index: usize) -> Vec<(usize, usize)> {
    let target = blob_index as u32 + 1;
    let blob = &labeled.blobs[blob_index];
    let seed = blob.seed;

    let hit = |x: i32, y: i32| -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < labeled.width
            && (y as usize) < labeled.height
            && labeled.label_at(x as usize, y as usize) == target
    };

    // Scan the neighbors of `p` clockwise starting at direction `start`.
    let scan = |p: (usize, usize), start: usize| -> Option<(usize, (usize, usize))> {
        for k in 0..8 {
            let d = (start + k) % 8;
            let nx = p.0 as i32 + NEIGHBORS[d].0;
            let ny = p.1 as i32 + NEIGHBORS[d].1;
            if hit(nx, ny) {
                return Some((d, (nx as usize, ny as usize)));
            }
        }
        None
    };

    // The seed is the raster-first pixel, so W/NW/N/NE are background; start
    // scanning at NW.
    let Some((first_d, first_q)) = scan(seed, 5) else {
        return vec![seed]; // isolated pixel
    };

    let mut boundary = vec![seed];
    let mut d = first_d;
    let mut p = first_q;

    // Bounded defensively; the trace revisits its initial state after at
    // most one step per boundary-pixel/direction pair.
    let max_steps = 8 * blob.area + 8;
    for _ in 0..max_steps {
        if p == first_q && d == first_d && boundary.len() > 1 {
            break;
        }
        boundary.push(p);
        match scan(p, (d + 6) % 8) {
            Some((nd, np)) => {
                d = nd;
                p = np;
            }
            None => break,
        }
    }

    // The walk closes by re-entering the seed; drop the duplicate so the
    // sequence lists each closed-loop position once.
    if boundary.len() > 1 && boundary.last() == Some(&seed) {
        boundary.pop();
    }

    boundary
}

/// Measure one blob: centroid of the filled pixels plus the enclosing
/// radius.
pub(crate) fn measure_blob(blob: &Blob) -> ContourMeasure {
    let center = blob.centroid();
    let mut max_sq = 0.0f32;
    for &(x, y) in &blob.pixels {
        let dx = x as f32 - center.x;
        let dy = y as f32 - center.y;
        max_sq = max_sq.max(dx * dx + dy * dy);
    }
    ContourMeasure {
        center,
        radius: max_sq.sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{label_mask, Connectivity};

    fn labeled_from(rows: &[&str]) -> BlobLabels {
        let h = rows.len();
        let w = rows[0].len();
        let mut mask = Vec::with_capacity(w * h);
        for row in rows {
            for c in row.chars() {
                mask.push(c == '#');
            }
        }
        label_mask(&mask, w, h, Connectivity::Eight)
    }

    #[test]
    fn traces_square_boundary_clockwise() {
        let labeled = labeled_from(&[
            "....", //
            ".##.", //
            ".##.", //
            "....", //
        ]);
        let boundary = trace_boundary(&labeled, 0);
        assert_eq!(boundary, vec![(1, 1), (2, 1), (2, 2), (1, 2)]);
    }

    #[test]
    fn traces_single_pixel() {
        let labeled = labeled_from(&["#"]);
        assert_eq!(trace_boundary(&labeled, 0), vec![(0, 0)]);
    }

    #[test]
    fn boundary_of_larger_square_skips_interior() {
        let labeled = labeled_from(&[
            ".....", //
            ".###.", //
            ".###.", //
            ".###.", //
            ".....", //
        ]);
        let boundary = trace_boundary(&labeled, 0);
        // 3x3 square: 8 boundary pixels, interior (2,2) excluded.
        assert_eq!(boundary.len(), 8);
        assert!(!boundary.contains(&(2, 2)));
    }

    #[test]
    fn measure_of_square_blob() {
        let labeled = labeled_from(&[
            "###", //
            "###", //
            "###", //
        ]);
        let m = measure_blob(&labeled.blobs[0]);
        assert!((m.center.x - 1.0).abs() < 1e-6);
        assert!((m.center.y - 1.0).abs() < 1e-6);
        // Farthest pixel center is a corner at distance sqrt(2).
        assert!((m.radius - 2.0f32.sqrt()).abs() < 1e-5);
    }
}
