use serde::{Deserialize, Serialize};

/// Hue/saturation/value triple.
///
/// Hue is in degrees `[0, 360)`; saturation and value are normalized to
/// `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Hsv {
    pub const fn new(h: f32, s: f32, v: f32) -> Self {
        Self { h, s, v }
    }
}

/// Convert one 8-bit RGB pixel to HSV.
///
/// The max/delta form: `v = max`, `s = delta / max` (0 for black), hue from
/// the dominant channel scaled by 60° and wrapped into `[0, 360)`.
#[inline]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max == 0.0 { 0.0 } else { delta / max };
    let v = max;

    let mut h = 0.0;
    if delta != 0.0 {
        if max == r {
            h = (g - b) / delta;
        } else if max == g {
            h = 2.0 + (b - r) / delta;
        } else {
            h = 4.0 + (r - g) / delta;
        }
        h *= 60.0;
        if h < 0.0 {
            h += 360.0;
        }
    }

    Hsv { h, s, v }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn primaries_map_to_their_hues() {
        assert_relative_eq!(rgb_to_hsv(255, 0, 0).h, 0.0);
        assert_relative_eq!(rgb_to_hsv(0, 255, 0).h, 120.0);
        assert_relative_eq!(rgb_to_hsv(0, 0, 255).h, 240.0);
    }

    #[test]
    fn white_has_zero_saturation_full_value() {
        let hsv = rgb_to_hsv(255, 255, 255);
        assert_relative_eq!(hsv.s, 0.0);
        assert_relative_eq!(hsv.v, 1.0);
    }

    #[test]
    fn black_is_zero_value_zero_saturation() {
        let hsv = rgb_to_hsv(0, 0, 0);
        assert_relative_eq!(hsv.s, 0.0);
        assert_relative_eq!(hsv.v, 0.0);
    }

    #[test]
    fn magenta_leaning_red_wraps_below_360() {
        // More red than blue: hue just below 360.
        let hsv = rgb_to_hsv(255, 0, 64);
        assert!(hsv.h > 340.0 && hsv.h < 360.0, "h = {}", hsv.h);
    }
}
