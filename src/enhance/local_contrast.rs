use std::borrow::Cow;

use crate::{
    enhance::color::{frame_to_lab, lab_to_frame, to_u8},
    enhance::traits::{ensure_not_empty, Operator},
    error::EnhanceError,
    presets::PresetParams,
    video::types::Frame,
};

const BINS: usize = 256;

/// Contrast-limited adaptive histogram equalization on the Lab lightness plane
///
/// The plane is split into a grid of tiles, each tile gets its own clipped
/// equalization curve, and every pixel blends the curves of the four nearest
/// tile centers. Chroma planes pass through untouched.
pub struct LocalContrast {
    clip_limit: f32,
    grid: u32,
}

impl LocalContrast {
    pub fn new() -> Self {
        Self { clip_limit: 2.0, grid: 8 }
    }

    pub fn with_settings(clip_limit: f32, grid: u32) -> Self {
        Self { clip_limit, grid: grid.max(1) }
    }

    /// Equalize one 8-bit plane in place
    fn equalize(&self, plane: &mut [u8], width: usize, height: usize) {
        let tiles_x = (self.grid as usize).min(width).max(1);
        let tiles_y = (self.grid as usize).min(height).max(1);
        let tile_w = width as f32 / tiles_x as f32;
        let tile_h = height as f32 / tiles_y as f32;

        let bounds = |i: usize, tiles: usize, size: f32, len: usize| {
            let start = (i as f32 * size).floor() as usize;
            let end = if i + 1 == tiles { len } else { ((i + 1) as f32 * size).floor() as usize };
            (start, end.max(start + 1).min(len))
        };

        let mut luts = vec![[0u8; BINS]; tiles_x * tiles_y];
        for ty in 0..tiles_y {
            let (y0, y1) = bounds(ty, tiles_y, tile_h, height);
            for tx in 0..tiles_x {
                let (x0, x1) = bounds(tx, tiles_x, tile_w, width);

                let mut histogram = [0u32; BINS];
                for y in y0..y1 {
                    for &v in &plane[y * width + x0..y * width + x1] {
                        histogram[v as usize] += 1;
                    }
                }
                let area = ((y1 - y0) * (x1 - x0)) as u32;
                luts[ty * tiles_x + tx] = self.tile_curve(&mut histogram, area);
            }
        }

        let source = plane.to_vec();
        for y in 0..height {
            let fy = (y as f32 + 0.5) / tile_h - 0.5;
            let (ty0, ty1, wy) = neighbours(fy, tiles_y);
            for x in 0..width {
                let fx = (x as f32 + 0.5) / tile_w - 0.5;
                let (tx0, tx1, wx) = neighbours(fx, tiles_x);

                let v = source[y * width + x] as usize;
                let top = luts[ty0 * tiles_x + tx0][v] as f32 * (1.0 - wx)
                    + luts[ty0 * tiles_x + tx1][v] as f32 * wx;
                let bottom = luts[ty1 * tiles_x + tx0][v] as f32 * (1.0 - wx)
                    + luts[ty1 * tiles_x + tx1][v] as f32 * wx;
                plane[y * width + x] = to_u8(top * (1.0 - wy) + bottom * wy);
            }
        }
    }

    /// Clip the histogram, redistribute the excess and build the mapping
    fn tile_curve(&self, histogram: &mut [u32; BINS], area: u32) -> [u8; BINS] {
        let limit = ((self.clip_limit * area as f32 / BINS as f32) as u32).max(1);

        let mut excess = 0u32;
        for count in histogram.iter_mut() {
            if *count > limit {
                excess += *count - limit;
                *count = limit;
            }
        }

        let batch = excess / BINS as u32;
        let residual = (excess % BINS as u32) as usize;
        for count in histogram.iter_mut() {
            *count += batch;
        }
        if residual > 0 {
            let step = (BINS / residual).max(1);
            for i in (0..BINS).step_by(step).take(residual) {
                histogram[i] += 1;
            }
        }

        let scale = 255.0 / area.max(1) as f32;
        let mut lut = [0u8; BINS];
        let mut cumulative = 0u32;
        for (i, count) in histogram.iter().enumerate() {
            cumulative += count;
            lut[i] = to_u8(cumulative as f32 * scale);
        }
        lut
    }
}

impl Default for LocalContrast {
    fn default() -> Self {
        Self::new()
    }
}

/// Indices of the two tile centers around `position` and the weight of the second
fn neighbours(position: f32, tiles: usize) -> (usize, usize, f32) {
    let lower = position.floor();
    let weight = position - lower;
    let last = tiles as i64 - 1;
    let first = (lower as i64).clamp(0, last) as usize;
    let second = (lower as i64 + 1).clamp(0, last) as usize;
    (first, second, weight)
}

impl Operator for LocalContrast {
    fn name(&self) -> &'static str {
        "local_contrast"
    }

    fn description(&self) -> &'static str {
        "Adaptive histogram equalization of lightness (CLAHE)"
    }

    fn apply<'a>(
        &self,
        frame: &'a Frame,
        _params: &PresetParams,
    ) -> Result<Cow<'a, Frame>, EnhanceError> {
        ensure_not_empty(self.name(), frame)?;
        if !self.clip_limit.is_finite() || self.clip_limit <= 0.0 {
            return Err(EnhanceError::Failed {
                operator: self.name(),
                reason: format!("clip limit must be positive, got {}", self.clip_limit),
            });
        }

        let mut lab = frame_to_lab(frame);
        let (width, height) = (lab.width as usize, lab.height as usize);
        self.equalize(&mut lab.l, width, height);

        Ok(Cow::Owned(lab_to_frame(&lab)))
    }
}
