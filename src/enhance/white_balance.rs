use std::borrow::Cow;

use crate::{
    enhance::color::{frame_to_lab, lab_to_frame, to_u8},
    enhance::traits::{ensure_not_empty, Operator},
    error::EnhanceError,
    presets::PresetParams,
    video::types::Frame,
};

/// Gain applied to the measured chroma cast
const CAST_GAIN: f32 = 1.2;

/// Gray-world white balance in Lab space
///
/// The mean of each chroma plane is pulled back towards neutral (128), with
/// the correction weighted by each pixel's lightness so shadows move less than
/// highlights.
pub struct WhiteBalance;

impl WhiteBalance {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WhiteBalance {
    fn default() -> Self {
        Self::new()
    }
}

fn plane_mean(plane: &[u8]) -> f32 {
    let sum: u64 = plane.iter().map(|&v| v as u64).sum();
    sum as f32 / plane.len() as f32
}

impl Operator for WhiteBalance {
    fn name(&self) -> &'static str {
        "white_balance"
    }

    fn description(&self) -> &'static str {
        "Gray-world color cast removal on the Lab chroma planes"
    }

    fn apply<'a>(
        &self,
        frame: &'a Frame,
        _params: &PresetParams,
    ) -> Result<Cow<'a, Frame>, EnhanceError> {
        ensure_not_empty(self.name(), frame)?;

        let mut lab = frame_to_lab(frame);
        let cast_a = plane_mean(&lab.a) - 128.0;
        let cast_b = plane_mean(&lab.b) - 128.0;

        for i in 0..lab.l.len() {
            let weight = lab.l[i] as f32 / 255.0 * CAST_GAIN;
            lab.a[i] = to_u8(lab.a[i] as f32 - cast_a * weight);
            lab.b[i] = to_u8(lab.b[i] as f32 - cast_b * weight);
        }

        Ok(Cow::Owned(lab_to_frame(&lab)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhance::color::frame_to_lab;

    #[test]
    fn test_removes_a_warm_cast() {
        let frame = Frame::new_filled(8, 8, [230, 180, 140]);
        let before = frame_to_lab(&frame);
        let out = WhiteBalance::new().apply(&frame, &PresetParams::default()).unwrap();
        let after = frame_to_lab(&out);

        let cast = |plane: &[u8]| (plane_mean(plane) - 128.0).abs();
        assert!(cast(&after.b) < cast(&before.b));
        assert!(cast(&after.a) <= cast(&before.a));
    }

    #[test]
    fn test_neutral_gray_barely_moves() {
        let frame = Frame::new_filled(4, 4, [128, 128, 128]);
        let out = WhiteBalance::new().apply(&frame, &PresetParams::default()).unwrap();
        for (a, b) in frame.as_rgb_bytes().iter().zip(out.as_rgb_bytes()) {
            assert!((*a as i32 - *b as i32).abs() <= 2);
        }
    }

    #[test]
    fn test_empty_frame_is_an_error() {
        let frame = Frame::new_black(0, 0);
        let err = WhiteBalance::new().apply(&frame, &PresetParams::default()).unwrap_err();
        assert!(matches!(err, EnhanceError::EmptyFrame { operator: "white_balance" }));
    }
}
