use std::borrow::Cow;

use crate::{
    enhance::color::{reflect_101, to_u8},
    enhance::traits::{ensure_finite, ensure_not_empty, Operator},
    error::EnhanceError,
    presets::PresetParams,
    video::types::Frame,
};

/// Center weight of the kernel per unit of strength
const CENTER_WEIGHT: f32 = 9.5;

/// Strengths at or below this leave the kernel with a non-positive sum
pub const MIN_STRENGTH: f32 = 8.0 / CENTER_WEIGHT;

/// 3x3 high-pass sharpening
///
/// Neighbors weigh -1 and the center `9.5 * strength`; the kernel is divided
/// by its own sum so flat regions keep their level.
pub struct Sharpen;

impl Sharpen {
    pub fn new() -> Self {
        Self
    }

    fn kernel(strength: f32) -> Result<[f32; 9], EnhanceError> {
        let center = CENTER_WEIGHT * strength;
        let sum = center - 8.0;
        if strength <= MIN_STRENGTH || sum <= f32::EPSILON {
            return Err(EnhanceError::Failed {
                operator: "sharpen",
                reason: format!("strength {} gives a kernel with non-positive sum", strength),
            });
        }

        let mut kernel = [-1.0 / sum; 9];
        kernel[4] = center / sum;
        Ok(kernel)
    }
}

impl Default for Sharpen {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for Sharpen {
    fn name(&self) -> &'static str {
        "sharpen"
    }

    fn description(&self) -> &'static str {
        "Normalized 3x3 high-pass sharpening"
    }

    fn apply<'a>(
        &self,
        frame: &'a Frame,
        params: &PresetParams,
    ) -> Result<Cow<'a, Frame>, EnhanceError> {
        if params.sharpness == 1.0 {
            return Ok(Cow::Borrowed(frame));
        }
        ensure_not_empty(self.name(), frame)?;
        ensure_finite(self.name(), "sharpness", params.sharpness)?;
        let kernel = Self::kernel(params.sharpness)?;

        let width = frame.width() as i64;
        let height = frame.height() as i64;
        let src = frame.as_rgb_bytes();
        let mut out = vec![0u8; src.len()];

        for y in 0..height {
            for x in 0..width {
                let mut acc = [0.0f32; 3];
                for ky in -1..=1 {
                    let sy = reflect_101(y + ky, height);
                    for kx in -1..=1 {
                        let sx = reflect_101(x + kx, width);
                        let weight = kernel[((ky + 1) * 3 + kx + 1) as usize];
                        let offset = (sy * width as usize + sx) * 3;
                        for c in 0..3 {
                            acc[c] += src[offset + c] as f32 * weight;
                        }
                    }
                }
                let offset = ((y * width + x) * 3) as usize;
                for c in 0..3 {
                    out[offset + c] = to_u8(acc[c]);
                }
            }
        }

        Frame::from_rgb_bytes(frame.width(), frame.height(), out)
            .map(Cow::Owned)
            .ok_or(EnhanceError::Failed {
                operator: "sharpen",
                reason: "output buffer size mismatch".to_string(),
            })
    }
}
