use std::borrow::Cow;

use crate::{
    enhance::color::{reflect_101, to_u8},
    enhance::traits::{ensure_not_empty, Operator},
    error::EnhanceError,
    presets::PresetParams,
    video::types::Frame,
};

/// Edge-preserving bilateral smoothing
///
/// Each output pixel is a weighted mean over a circular window. Weights fall
/// off with spatial distance and with the L1 color distance to the center
/// pixel, so flat areas are smoothed while strong edges survive.
pub struct Denoise {
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
}

impl Denoise {
    pub fn new() -> Self {
        Self { diameter: 11, sigma_color: 75.0, sigma_space: 75.0 }
    }

    pub fn with_settings(diameter: u32, sigma_color: f32, sigma_space: f32) -> Self {
        Self { diameter, sigma_color, sigma_space }
    }

    /// Window offsets inside the circle, paired with their spatial weight
    fn window(&self) -> Vec<(i64, i64, f32)> {
        let radius = (self.diameter / 2) as i64;
        let coeff = -0.5 / (self.sigma_space * self.sigma_space);
        let mut taps = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let distance_sq = (dx * dx + dy * dy) as f32;
                if distance_sq.sqrt() > radius as f32 {
                    continue;
                }
                taps.push((dx, dy, (distance_sq * coeff).exp()));
            }
        }
        taps
    }

    /// Color weight for every possible L1 distance between two RGB pixels
    fn color_weights(&self) -> Vec<f32> {
        let coeff = -0.5 / (self.sigma_color * self.sigma_color);
        (0..=255 * 3).map(|d| ((d * d) as f32 * coeff).exp()).collect()
    }
}

impl Default for Denoise {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for Denoise {
    fn name(&self) -> &'static str {
        "denoise"
    }

    fn description(&self) -> &'static str {
        "Bilateral filter (diameter 11, sigma color 75, sigma space 75)"
    }

    fn apply<'a>(
        &self,
        frame: &'a Frame,
        _params: &PresetParams,
    ) -> Result<Cow<'a, Frame>, EnhanceError> {
        ensure_not_empty(self.name(), frame)?;
        if self.sigma_color <= 0.0 || self.sigma_space <= 0.0 {
            return Err(EnhanceError::Failed {
                operator: self.name(),
                reason: "sigmas must be positive".to_string(),
            });
        }

        let taps = self.window();
        let color_weights = self.color_weights();

        let width = frame.width() as i64;
        let height = frame.height() as i64;
        let src = frame.as_rgb_bytes();
        let mut out = vec![0u8; src.len()];

        for y in 0..height {
            for x in 0..width {
                let center_offset = ((y * width + x) * 3) as usize;
                let center = &src[center_offset..center_offset + 3];

                let mut acc = [0.0f32; 3];
                let mut total = 0.0f32;
                for &(dx, dy, spatial) in &taps {
                    let sx = reflect_101(x + dx, width);
                    let sy = reflect_101(y + dy, height);
                    let offset = (sy * width as usize + sx) * 3;
                    let sample = &src[offset..offset + 3];

                    let distance: usize = (0..3)
                        .map(|c| (sample[c] as i32 - center[c] as i32).unsigned_abs() as usize)
                        .sum();
                    let weight = spatial * color_weights[distance];

                    for c in 0..3 {
                        acc[c] += sample[c] as f32 * weight;
                    }
                    total += weight;
                }

                for c in 0..3 {
                    out[center_offset + c] = to_u8(acc[c] / total);
                }
            }
        }

        Frame::from_rgb_bytes(frame.width(), frame.height(), out)
            .map(Cow::Owned)
            .ok_or(EnhanceError::Failed {
                operator: "denoise",
                reason: "output buffer size mismatch".to_string(),
            })
    }
}
