//! # Enhancement Pipeline
//!
//! A fixed, ordered chain of image operators applied per frame during
//! reconstruction. Stages run in this order:
//!
//! 1. **white_balance**: gray-world cast removal in Lab
//! 2. **local_contrast**: CLAHE on lightness (clip 2.0, 8x8 tiles)
//! 3. **tone**: brightness offset and contrast gain
//! 4. **saturation**: HSV saturation gain
//! 5. **sharpen**: normalized 3x3 high-pass kernel
//! 6. **denoise**: bilateral smoothing, always applied last
//!
//! The identity preset bypasses the chain entirely. A stage that fails is
//! logged and skipped; the frame carries on through the remaining stages.
//!
//! ```rust
//! use ooo_codec::enhance::enhance;
//! use ooo_codec::presets::PresetRegistry;
//! use ooo_codec::video::Frame;
//!
//! let frame = Frame::new_filled(16, 16, [120, 90, 60]);
//! let vivid = PresetRegistry::new().resolve("vivid");
//! let enhanced = enhance(frame, &vivid);
//! assert_eq!(enhanced.width(), 16);
//! ```

mod color;

pub mod denoise;
pub mod local_contrast;
pub mod saturation;
pub mod sharpen;
pub mod tone;
pub mod traits;
pub mod white_balance;

use std::borrow::Cow;

use tracing::{debug, warn};

use crate::{presets::Preset, presets::PresetParams, video::types::Frame};

pub use denoise::Denoise;
pub use local_contrast::LocalContrast;
pub use saturation::Saturation;
pub use sharpen::Sharpen;
pub use tone::Tone;
pub use traits::Operator;
pub use white_balance::WhiteBalance;

/// An ordered list of operators
pub struct Pipeline {
    stages: Vec<Box<dyn Operator>>,
}

impl Pipeline {
    /// The standard six-stage chain
    pub fn standard() -> Self {
        Self {
            stages: vec![
                Box::new(WhiteBalance::new()),
                Box::new(LocalContrast::new()),
                Box::new(Tone::new()),
                Box::new(Saturation::new()),
                Box::new(Sharpen::new()),
                Box::new(Denoise::new()),
            ],
        }
    }

    /// A chain of caller-chosen operators
    pub fn with_stages(stages: Vec<Box<dyn Operator>>) -> Self {
        Self { stages }
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run every stage over `frame`, unless `preset` is the identity
    pub fn run(&self, frame: Frame, preset: &Preset) -> Frame {
        if preset.is_identity() {
            return frame;
        }
        self.stages
            .iter()
            .fold(frame, |current, stage| run_stage(stage.as_ref(), current, &preset.params))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// One stage; failures and no-ops hand back the input frame
fn run_stage(stage: &dyn Operator, frame: Frame, params: &PresetParams) -> Frame {
    let produced = match stage.apply(&frame, params) {
        Ok(Cow::Owned(out)) => Some(out),
        Ok(Cow::Borrowed(_)) => {
            debug!("{} skipped: parameters make it a no-op", stage.name());
            None
        }
        Err(e) => {
            warn!("Frame enhancement error in {}: {}", stage.name(), e);
            None
        }
    };
    produced.unwrap_or(frame)
}

/// Enhance one frame with the standard pipeline
pub fn enhance(frame: Frame, preset: &Preset) -> Frame {
    Pipeline::standard().run(frame, preset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnhanceError;
    use crate::presets::{PresetRegistry, IDENTITY};

    struct Failing;

    impl Operator for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn description(&self) -> &'static str {
            "always fails"
        }

        fn apply<'a>(
            &self,
            _frame: &'a Frame,
            _params: &PresetParams,
        ) -> Result<Cow<'a, Frame>, EnhanceError> {
            Err(EnhanceError::Failed { operator: "failing", reason: "boom".to_string() })
        }
    }

    fn textured(width: u32, height: u32) -> Frame {
        let mut frame = Frame::new_black(width, height);
        for y in 0..height {
            for x in 0..width {
                frame.set_pixel(x, y, [(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) * 3 % 256) as u8]);
            }
        }
        frame
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(
            Pipeline::standard().stage_names(),
            vec!["white_balance", "local_contrast", "tone", "saturation", "sharpen", "denoise"]
        );
    }

    #[test]
    fn test_identity_is_exact() {
        let frame = textured(20, 12);
        assert_eq!(enhance(frame.clone(), &IDENTITY), frame);
    }

    #[test]
    fn test_every_builtin_keeps_geometry() {
        let registry = PresetRegistry::new();
        let frame = textured(24, 16);
        for preset in registry.iter() {
            let out = enhance(frame.clone(), preset);
            assert_eq!(out.resolution(), frame.resolution(), "{}", preset.name);
        }
    }

    #[test]
    fn test_non_identity_changes_pixels() {
        let frame = textured(24, 16);
        let vivid = PresetRegistry::new().resolve("vivid");
        assert_ne!(enhance(frame.clone(), &vivid), frame);
    }

    #[test]
    fn test_failing_stage_is_contained() {
        let pipeline = Pipeline::with_stages(vec![Box::new(Failing), Box::new(Tone::new())]);
        let frame = Frame::new_filled(2, 2, [100, 100, 100]);
        let preset = Preset::new("brighter", PresetParams::new(10, 1.0, 1.0, 1.0));

        let out = pipeline.run(frame, &preset);
        assert_eq!(out.get_pixel(0, 0), [110, 110, 110]);
    }

    #[test]
    fn test_empty_frame_survives_the_pipeline() {
        let standard = PresetRegistry::new().resolve("standard");
        let out = enhance(Frame::new_black(0, 0), &standard);
        assert!(out.is_empty());
    }
}
