//! Color space helpers shared by the operators.
//!
//! Lab planes use the common 8-bit scaling: L is stretched from 0..100 to
//! 0..255 and a/b are offset by 128. The conversion assumes sRGB primaries
//! with a D65 white point.

use crate::video::types::Frame;

const WHITE_X: f32 = 0.950456;
const WHITE_Z: f32 = 1.088754;
const EPSILON: f32 = 0.008856;
const KAPPA: f32 = 903.3;

/// Planar 8-bit Lab image
#[derive(Debug, Clone)]
pub(crate) struct LabPlanes {
    pub width: u32,
    pub height: u32,
    pub l: Vec<u8>,
    pub a: Vec<u8>,
    pub b: Vec<u8>,
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn lab_f(t: f32) -> f32 {
    if t > EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab_f_inv(t: f32) -> f32 {
    if t > 6.0 / 29.0 {
        t * t * t
    } else {
        (t - 16.0 / 116.0) / 7.787
    }
}

pub(crate) fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Convert an RGB frame to planar 8-bit Lab
pub(crate) fn frame_to_lab(frame: &Frame) -> LabPlanes {
    let linear: Vec<f32> = (0..=255u8).map(|v| srgb_to_linear(v as f32 / 255.0)).collect();
    let pixels = (frame.width() * frame.height()) as usize;

    let mut planes = LabPlanes {
        width: frame.width(),
        height: frame.height(),
        l: Vec::with_capacity(pixels),
        a: Vec::with_capacity(pixels),
        b: Vec::with_capacity(pixels),
    };

    for rgb in frame.as_rgb_bytes().chunks_exact(3) {
        let r = linear[rgb[0] as usize];
        let g = linear[rgb[1] as usize];
        let b = linear[rgb[2] as usize];

        let x = (0.412453 * r + 0.357580 * g + 0.180423 * b) / WHITE_X;
        let y = 0.212671 * r + 0.715160 * g + 0.072169 * b;
        let z = (0.019334 * r + 0.119193 * g + 0.950227 * b) / WHITE_Z;

        let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
        let lightness = if y > EPSILON { 116.0 * fy - 16.0 } else { KAPPA * y };

        planes.l.push(to_u8(lightness * 255.0 / 100.0));
        planes.a.push(to_u8(500.0 * (fx - fy) + 128.0));
        planes.b.push(to_u8(200.0 * (fy - fz) + 128.0));
    }

    planes
}

/// Convert planar 8-bit Lab back to an RGB frame
pub(crate) fn lab_to_frame(planes: &LabPlanes) -> Frame {
    let mut data = Vec::with_capacity(planes.l.len() * 3);

    for ((&l8, &a8), &b8) in planes.l.iter().zip(&planes.a).zip(&planes.b) {
        let lightness = l8 as f32 * 100.0 / 255.0;
        let a = a8 as f32 - 128.0;
        let b = b8 as f32 - 128.0;

        let fy = (lightness + 16.0) / 116.0;
        let fx = fy + a / 500.0;
        let fz = fy - b / 200.0;

        let y = if lightness > KAPPA * EPSILON { fy * fy * fy } else { lightness / KAPPA };
        let x = lab_f_inv(fx) * WHITE_X;
        let z = lab_f_inv(fz) * WHITE_Z;

        let r = 3.240479 * x - 1.537150 * y - 0.498535 * z;
        let g = -0.969256 * x + 1.875991 * y + 0.041556 * z;
        let bl = 0.055648 * x - 0.204043 * y + 1.057311 * z;

        for c in [r, g, bl] {
            data.push(to_u8(linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0));
        }
    }

    // Lengths match by construction
    Frame::from_rgb_bytes(planes.width, planes.height, data)
        .unwrap_or_else(|| Frame::new_black(planes.width, planes.height))
}

/// RGB to HSV with hue in degrees (0..360) and saturation/value in 0..1
pub(crate) fn rgb_to_hsv(rgb: [u8; 3]) -> [f32; 3] {
    let r = rgb[0] as f32 / 255.0;
    let g = rgb[1] as f32 / 255.0;
    let b = rgb[2] as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    [hue, saturation, max]
}

pub(crate) fn hsv_to_rgb(hsv: [f32; 3]) -> [u8; 3] {
    let [hue, saturation, value] = hsv;
    let chroma = value * saturation;
    let sector = hue.rem_euclid(360.0) / 60.0;
    let x = chroma * (1.0 - (sector.rem_euclid(2.0) - 1.0).abs());
    let m = value - chroma;

    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    [to_u8((r + m) * 255.0), to_u8((g + m) * 255.0), to_u8((b + m) * 255.0)]
}

/// Mirror an out-of-range index back into `0..len` without repeating the edge
pub(crate) fn reflect_101(index: i64, len: i64) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let i = index.rem_euclid(period);
    (if i < len { i } else { period - i }) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lab_reference_points() {
        let frame = Frame::from_rgb_bytes(3, 1, vec![0, 0, 0, 255, 255, 255, 128, 128, 128]).unwrap();
        let lab = frame_to_lab(&frame);

        assert_eq!(lab.l[0], 0);
        assert_eq!(lab.l[1], 255);
        for i in 0..3 {
            assert!((lab.a[i] as i32 - 128).abs() <= 1);
            assert!((lab.b[i] as i32 - 128).abs() <= 1);
        }
    }

    #[test]
    fn test_lab_round_trip_is_close() {
        let mut frame = Frame::new_black(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                frame.set_pixel(x, y, [(x * 16) as u8, (y * 16) as u8, 200]);
            }
        }
        let back = lab_to_frame(&frame_to_lab(&frame));
        for (a, b) in frame.as_rgb_bytes().iter().zip(back.as_rgb_bytes()) {
            assert!((*a as i32 - *b as i32).abs() <= 8, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_hsv_round_trip() {
        for rgb in [[255, 0, 0], [12, 200, 90], [40, 40, 40], [250, 250, 10], [3, 7, 255]] {
            assert_eq!(hsv_to_rgb(rgb_to_hsv(rgb)), rgb);
        }
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-3, 1), 0);
    }
}
