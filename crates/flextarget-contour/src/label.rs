use nalgebra::Point2;

/// Pixel neighborhood used when growing blobs.
///
/// Foreground blobs use eight-connectivity; background regions (hole
/// analysis) use four-connectivity, the topological dual.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Connectivity {
    Four,
    Eight,
}

/// One connected region of a binary mask.
#[derive(Clone, Debug)]
pub struct Blob {
    /// First pixel of the blob in raster-scan order (top-most, then
    /// left-most). Blob ordering in [`BlobLabels::blobs`] follows the seeds'
    /// raster order, which makes results stable across runs.
    pub seed: (usize, usize),
    /// Filled pixel count.
    pub area: usize,
    /// Inclusive bounds: (min_x, min_y, max_x, max_y).
    pub bounds: (usize, usize, usize, usize),
    /// Every pixel of the blob, in discovery order.
    pub pixels: Vec<(usize, usize)>,
    sum_x: f64,
    sum_y: f64,
}

impl Blob {
    /// Centroid of the filled pixels.
    pub fn centroid(&self) -> Point2<f32> {
        let n = self.area as f64;
        Point2::new((self.sum_x / n) as f32, (self.sum_y / n) as f32)
    }

    pub fn bbox_width(&self) -> usize {
        self.bounds.2 - self.bounds.0 + 1
    }

    pub fn bbox_height(&self) -> usize {
        self.bounds.3 - self.bounds.1 + 1
    }

    /// True if any pixel lies on the image border.
    pub fn touches_border(&self, width: usize, height: usize) -> bool {
        self.bounds.0 == 0
            || self.bounds.1 == 0
            || self.bounds.2 + 1 == width
            || self.bounds.3 + 1 == height
    }
}

/// Label image produced by [`label_mask`].
///
/// `labels[y * width + x]` is 0 for unset pixels and `i + 1` for pixels of
/// `blobs[i]`.
pub struct BlobLabels {
    pub width: usize,
    pub height: usize,
    pub labels: Vec<u32>,
    pub blobs: Vec<Blob>,
}

impl BlobLabels {
    #[inline]
    pub fn label_at(&self, x: usize, y: usize) -> u32 {
        self.labels[y * self.width + x]
    }
}

/// Flood-fill labeling of all set pixels in `mask` (row-major, len `w*h`).
pub fn label_mask(mask: &[bool], width: usize, height: usize, conn: Connectivity) -> BlobLabels {
    debug_assert_eq!(mask.len(), width * height);

    let offsets: &[(i32, i32)] = match conn {
        Connectivity::Four => &[(1, 0), (0, 1), (-1, 0), (0, -1)],
        Connectivity::Eight => &[
            (1, 0),
            (1, 1),
            (0, 1),
            (-1, 1),
            (-1, 0),
            (-1, -1),
            (0, -1),
            (1, -1),
        ],
    };

    let mut labels = vec![0u32; width * height];
    let mut blobs = Vec::new();
    let mut queue = Vec::new();

    for sy in 0..height {
        for sx in 0..width {
            let si = sy * width + sx;
            if !mask[si] || labels[si] != 0 {
                continue;
            }

            let label = blobs.len() as u32 + 1;
            labels[si] = label;
            queue.clear();
            queue.push((sx, sy));

            let mut blob = Blob {
                seed: (sx, sy),
                area: 0,
                bounds: (sx, sy, sx, sy),
                pixels: Vec::new(),
                sum_x: 0.0,
                sum_y: 0.0,
            };

            while let Some((x, y)) = queue.pop() {
                blob.area += 1;
                blob.sum_x += x as f64;
                blob.sum_y += y as f64;
                blob.bounds.0 = blob.bounds.0.min(x);
                blob.bounds.1 = blob.bounds.1.min(y);
                blob.bounds.2 = blob.bounds.2.max(x);
                blob.bounds.3 = blob.bounds.3.max(y);
                blob.pixels.push((x, y));

                for &(dx, dy) in offsets {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                        continue;
                    }
                    let ni = ny as usize * width + nx as usize;
                    if mask[ni] && labels[ni] == 0 {
                        labels[ni] = label;
                        queue.push((nx as usize, ny as usize));
                    }
                }
            }

            blobs.push(blob);
        }
    }

    BlobLabels {
        width,
        height,
        labels,
        blobs,
    }
}
