//! Blob geometry helpers: convex hull, minimum-area rectangle and corner
//! ordering shared by the frame and marker locators.

use nalgebra::Point2;

#[inline]
fn cross(o: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f64 {
    let oax = (a.x - o.x) as f64;
    let oay = (a.y - o.y) as f64;
    let obx = (b.x - o.x) as f64;
    let oby = (b.y - o.y) as f64;
    oax * oby - oay * obx
}

/// Convex hull via Andrew's monotone chain.
///
/// Returns the hull in counterclockwise order in mathematical coordinates
/// (clockwise on screen with y pointing down), without the closing point.
pub fn convex_hull(points: &[Point2<f32>]) -> Vec<Point2<f32>> {
    let mut pts: Vec<Point2<f32>> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();

    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Point2<f32>> = Vec::with_capacity(2 * pts.len());

    // lower chain
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }

    // upper chain
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }

    hull.pop(); // last point repeats the first
    hull
}

/// Minimum-area enclosing rectangle of a convex hull (rotating calipers:
/// the optimum is flush with some hull edge).
#[derive(Clone, Copy, Debug)]
pub struct MinAreaRect {
    pub corners: [Point2<f32>; 4],
    pub size: (f32, f32),
}

impl MinAreaRect {
    pub fn area(&self) -> f32 {
        self.size.0 * self.size.1
    }

    /// Short side over long side, in `[0, 1]`.
    pub fn aspect(&self) -> f32 {
        let (a, b) = self.size;
        if a.max(b) <= f32::EPSILON {
            return 0.0;
        }
        a.min(b) / a.max(b)
    }
}

pub fn min_area_rect(hull: &[Point2<f32>]) -> Option<MinAreaRect> {
    if hull.len() < 3 {
        return None;
    }

    let mut best: Option<MinAreaRect> = None;

    for i in 0..hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        let ex = (b.x - a.x) as f64;
        let ey = (b.y - a.y) as f64;
        let len = (ex * ex + ey * ey).sqrt();
        if len < 1e-9 {
            continue;
        }
        let ux = ex / len;
        let uy = ey / len;
        // left normal
        let vx = -uy;
        let vy = ux;

        let mut s_min = f64::MAX;
        let mut s_max = f64::MIN;
        let mut t_min = f64::MAX;
        let mut t_max = f64::MIN;
        for p in hull {
            let dx = (p.x - a.x) as f64;
            let dy = (p.y - a.y) as f64;
            let s = dx * ux + dy * uy;
            let t = dx * vx + dy * vy;
            s_min = s_min.min(s);
            s_max = s_max.max(s);
            t_min = t_min.min(t);
            t_max = t_max.max(t);
        }

        let w = (s_max - s_min) as f32;
        let h = (t_max - t_min) as f32;
        let area = w * h;
        if best.as_ref().map(|r| area < r.area()).unwrap_or(true) {
            let corner = |s: f64, t: f64| {
                Point2::new(
                    (a.x as f64 + s * ux + t * vx) as f32,
                    (a.y as f64 + s * uy + t * vy) as f32,
                )
            };
            best = Some(MinAreaRect {
                corners: [
                    corner(s_min, t_min),
                    corner(s_max, t_min),
                    corner(s_max, t_max),
                    corner(s_min, t_max),
                ],
                size: (w, h),
            });
        }
    }

    best
}

/// Order four points into the canonical corner order TL, TR, BR, BL.
///
/// TL minimizes `x + y`, BR maximizes it; TR maximizes `x - y`, BL
/// minimizes it. Valid for quads rotated less than 45° from upright, which
/// is the capture contract for marker and frame layouts.
pub fn order_corners_canonical(pts: &[Point2<f32>; 4]) -> [Point2<f32>; 4] {
    let by = |key: fn(&Point2<f32>) -> f32, max: bool| -> Point2<f32> {
        let mut best = pts[0];
        for p in &pts[1..] {
            let better = if max {
                key(p) > key(&best)
            } else {
                key(p) < key(&best)
            };
            if better {
                best = *p;
            }
        }
        best
    };

    [
        by(|p| p.x + p.y, false), // TL
        by(|p| p.x - p.y, true),  // TR
        by(|p| p.x + p.y, true),  // BR
        by(|p| p.x - p.y, false), // BL
    ]
}

/// Output raster size for rectifying a quad: mean of the opposite side
/// lengths, rounded, at least one pixel.
pub fn quad_output_size(c: &[Point2<f32>; 4]) -> (usize, usize) {
    let dist = |a: Point2<f32>, b: Point2<f32>| ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
    let w = 0.5 * (dist(c[0], c[1]) + dist(c[3], c[2]));
    let h = 0.5 * (dist(c[0], c[3]) + dist(c[1], c[2]));
    ((w.round() as usize).max(1), (h.round() as usize).max(1))
}
