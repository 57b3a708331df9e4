use std::borrow::Cow;

use crate::{
    enhance::color::{hsv_to_rgb, rgb_to_hsv},
    enhance::traits::{ensure_finite, ensure_not_empty, Operator},
    error::EnhanceError,
    presets::PresetParams,
    video::types::Frame,
};

/// Scales HSV saturation, clamped to the valid range
pub struct Saturation;

impl Saturation {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Saturation {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for Saturation {
    fn name(&self) -> &'static str {
        "saturation"
    }

    fn description(&self) -> &'static str {
        "Saturation gain in HSV space"
    }

    fn apply<'a>(
        &self,
        frame: &'a Frame,
        params: &PresetParams,
    ) -> Result<Cow<'a, Frame>, EnhanceError> {
        if params.saturation == 1.0 {
            return Ok(Cow::Borrowed(frame));
        }
        ensure_not_empty(self.name(), frame)?;
        ensure_finite(self.name(), "saturation", params.saturation)?;

        let gain = params.saturation.max(0.0);
        let mut image = frame.as_image().clone();
        for pixel in image.pixels_mut() {
            let [hue, saturation, value] = rgb_to_hsv(pixel.0);
            pixel.0 = hsv_to_rgb([hue, (saturation * gain).min(1.0), value]);
        }
        Ok(Cow::Owned(Frame::new(image)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread(rgb: [u8; 3]) -> i32 {
        *rgb.iter().max().unwrap() as i32 - *rgb.iter().min().unwrap() as i32
    }

    #[test]
    fn test_unit_gain_borrows_the_input() {
        let frame = Frame::new_filled(4, 4, [200, 100, 50]);
        let params = PresetParams::new(25, 1.2, 1.5, 1.0);
        let out = Saturation::new().apply(&frame, &params).unwrap();
        assert!(matches!(out, Cow::Borrowed(f) if std::ptr::eq(f, &frame)));
    }

    #[test]
    fn test_gain_increases_chroma_and_keeps_value() {
        let frame = Frame::new_filled(2, 2, [200, 150, 120]);
        let params = PresetParams::new(0, 1.0, 1.0, 1.4);
        let out = Saturation::new().apply(&frame, &params).unwrap();

        let before = frame.get_pixel(0, 0);
        let after = out.get_pixel(0, 0);
        assert!(spread(after) > spread(before));
        assert_eq!(after[0], before[0]);
    }

    #[test]
    fn test_grays_stay_gray() {
        let frame = Frame::new_filled(2, 2, [90, 90, 90]);
        let params = PresetParams::new(0, 1.0, 1.0, 3.0);
        let out = Saturation::new().apply(&frame, &params).unwrap();
        assert_eq!(out.get_pixel(1, 1), [90, 90, 90]);
    }

    #[test]
    fn test_saturation_is_clamped() {
        let frame = Frame::new_filled(1, 1, [200, 20, 20]);
        let params = PresetParams::new(0, 1.0, 1.0, 10.0);
        let out = Saturation::new().apply(&frame, &params).unwrap();
        assert_eq!(out.get_pixel(0, 0), [200, 0, 0]);
    }
}
