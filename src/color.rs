use nalgebra as na;

/// sRGB (D65) to CIE XYZ.
const RGB_TO_XYZ: [f64; 9] = [
    0.412453, 0.357580, 0.180423, //
    0.212671, 0.715160, 0.072169, //
    0.019334, 0.119193, 0.950227,
];

const WHITE_X: f64 = 0.950456;
const WHITE_Z: f64 = 1.088754;
const EPSILON: f64 = 0.008856;

/// CIE Lab stored in the 8-bit scale used by the reference table:
/// `L * 255 / 100`, `a + 128`, `b + 128`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    #[inline]
    pub fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    #[inline]
    pub fn chroma(&self) -> na::Vector2<f64> {
        na::Vector2::new(self.a, self.b)
    }

    #[inline]
    pub fn as_vector(&self) -> na::Vector3<f64> {
        na::Vector3::new(self.l, self.a, self.b)
    }

    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        let m = na::Matrix3::from_row_slice(&RGB_TO_XYZ);
        let linear = na::Vector3::new(
            srgb_to_linear(rgb[0]),
            srgb_to_linear(rgb[1]),
            srgb_to_linear(rgb[2]),
        );
        let xyz = m * linear;

        let x = xyz.x / WHITE_X;
        let y = xyz.y;
        let z = xyz.z / WHITE_Z;

        let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
        let l = if y > EPSILON {
            116.0 * y.cbrt() - 16.0
        } else {
            903.3 * y
        };

        Self {
            l: l * 255.0 / 100.0,
            a: 500.0 * (fx - fy) + 128.0,
            b: 200.0 * (fy - fz) + 128.0,
        }
    }
}

#[inline]
fn srgb_to_linear(c: u8) -> f64 {
    let c = c as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greys_have_neutral_chroma() {
        for v in [0u8, 40, 128, 200, 255] {
            let lab = Lab::from_rgb([v, v, v]);
            assert!((lab.a - 128.0).abs() < 0.5, "a = {}", lab.a);
            assert!((lab.b - 128.0).abs() < 0.5, "b = {}", lab.b);
        }
    }

    #[test]
    fn white_and_black_lightness() {
        assert!((Lab::from_rgb([255, 255, 255]).l - 255.0).abs() < 0.5);
        assert!(Lab::from_rgb([0, 0, 0]).l.abs() < 1e-9);
    }

    #[test]
    fn red_is_positive_a() {
        let lab = Lab::from_rgb([255, 0, 0]);
        assert!(lab.a > 200.0);
        assert!(lab.b > 180.0);
    }
}
