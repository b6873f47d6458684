use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// Degenerate correspondence geometry.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("correspondence points contain duplicates")]
    DuplicatePoints,
    #[error("three or more correspondence points are collinear")]
    CollinearPoints,
    #[error("homography system is singular")]
    SingularSystem,
    #[error("homography matrix is not invertible")]
    SingularHomography,
}

/// 3×3 projective transform, normalized so the bottom-right entry is 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn normalize_points4(pts: &[Point2<f32>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let n = 4.0_f64;
    let mut cx = 0.0_f64;
    let mut cy = 0.0_f64;
    for p in pts {
        cx += p.x as f64;
        cy += p.y as f64;
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0_f64;
    for p in pts {
        let dx = p.x as f64 - cx;
        let dy = p.y as f64 - cy;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n;

    let t = hartley_normalization(cx, cy, mean_dist);

    let mut out = [Point2::new(0.0_f64, 0.0_f64); 4];
    for (i, p) in pts.iter().enumerate() {
        let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
        out[i] = Point2::new(v[0], v[1]);
    }

    (out, t)
}

fn normalize_homography(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    Some(h / s)
}

fn denormalize_homography(
    hn: Matrix3<f64>,
    t_src: Matrix3<f64>,
    t_dst: Matrix3<f64>,
) -> Option<Matrix3<f64>> {
    let t_dst_inv = t_dst.try_inverse()?;
    Some(t_dst_inv * hn * t_src)
}

/// Reject duplicate points and collinear triples before estimation.
///
/// Thresholds are relative to the point set's own scale so the check behaves
/// the same for subpixel quads and full-frame quads.
fn validate_quad(pts: &[Point2<f32>; 4]) -> Result<(), GeometryError> {
    let mut max_sq = 0.0_f64;
    for i in 0..4 {
        for j in (i + 1)..4 {
            let dx = (pts[i].x - pts[j].x) as f64;
            let dy = (pts[i].y - pts[j].y) as f64;
            max_sq = max_sq.max(dx * dx + dy * dy);
        }
    }

    let dup_sq = (max_sq * 1e-12).max(1e-12);
    for i in 0..4 {
        for j in (i + 1)..4 {
            let dx = (pts[i].x - pts[j].x) as f64;
            let dy = (pts[i].y - pts[j].y) as f64;
            if dx * dx + dy * dy <= dup_sq {
                return Err(GeometryError::DuplicatePoints);
            }
        }
    }

    // Triangle area threshold: 1e-6 of the squared span.
    let min_area2 = max_sq * 1e-6;
    for a in 0..4 {
        for b in (a + 1)..4 {
            for c in (b + 1)..4 {
                let abx = (pts[b].x - pts[a].x) as f64;
                let aby = (pts[b].y - pts[a].y) as f64;
                let acx = (pts[c].x - pts[a].x) as f64;
                let acy = (pts[c].y - pts[a].y) as f64;
                let cross = (abx * acy - aby * acx).abs();
                if cross <= min_area2 {
                    return Err(GeometryError::CollinearPoints);
                }
            }
        }
    }

    Ok(())
}

/// Compute H such that: dst ~ H * src (projective), from exactly four point
/// correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Four
/// correspondences determine the projective solution uniquely up to scale;
/// the result is normalized so `h[(2,2)] == 1`, which keeps matrices
/// comparable and serializable.
pub fn homography_from_4pt(
    src: &[Point2<f32>; 4],
    dst: &[Point2<f32>; 4],
) -> Result<Homography, GeometryError> {
    validate_quad(src)?;
    validate_quad(dst)?;

    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    // For each correspondence (x,y)->(u,v):
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let (src_n, t_src) = normalize_points4(src);
    let (dst_n, t_dst) = normalize_points4(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let x = src_n[k].x;
        let y = src_n[k].y;
        let u = dst_n[k].x;
        let v = dst_n[k].y;

        // row 2k
        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        // row 2k+1
        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b).ok_or(GeometryError::SingularSystem)?;

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    let h_den = denormalize_homography(hn, t_src, t_dst).ok_or(GeometryError::SingularSystem)?;
    let h_den = normalize_homography(h_den).ok_or(GeometryError::SingularSystem)?;

    Ok(Homography::new(h_den))
}
