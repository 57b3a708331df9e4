use std::borrow::Cow;

use crate::{
    enhance::color::to_u8,
    enhance::traits::{ensure_finite, ensure_not_empty, Operator},
    error::EnhanceError,
    presets::PresetParams,
    video::types::Frame,
};

/// Global linear tone adjustment: `out = in * contrast + brightness`
pub struct Tone;

impl Tone {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Tone {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for Tone {
    fn name(&self) -> &'static str {
        "tone"
    }

    fn description(&self) -> &'static str {
        "Global brightness offset and contrast gain"
    }

    fn apply<'a>(
        &self,
        frame: &'a Frame,
        params: &PresetParams,
    ) -> Result<Cow<'a, Frame>, EnhanceError> {
        if params.brightness == 0 && params.contrast == 1.0 {
            return Ok(Cow::Borrowed(frame));
        }
        ensure_not_empty(self.name(), frame)?;
        ensure_finite(self.name(), "contrast", params.contrast)?;

        let gain = params.contrast;
        let offset = params.brightness as f32;

        let mut lut = [0u8; 256];
        for (value, slot) in lut.iter_mut().enumerate() {
            *slot = to_u8(value as f32 * gain + offset);
        }

        let mut image = frame.as_image().clone();
        for channel in image.iter_mut() {
            *channel = lut[*channel as usize];
        }
        Ok(Cow::Owned(Frame::new(image)))
    }
}
