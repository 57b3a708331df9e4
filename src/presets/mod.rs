//! # Enhancement Presets
//!
//! A preset is a named, immutable set of parameters for the enhancement
//! pipeline. The built-in table is constant; [`PresetRegistry`] resolves names
//! against it and applies the optional `custom` override from configuration.
//!
//! ## Built-in Presets
//!
//! - **original**: identity, the pipeline is bypassed entirely
//! - **standard**: moderate brightness, contrast and sharpening
//! - **vivid**: strong colors and sharpening
//! - **cinematic**: contrast-led, restrained saturation
//! - **bright**: lifted exposure
//! - **crisp**: maximum sharpening, untouched saturation
//! - **custom**: same as standard unless overridden in the config file
//!
//! ```rust
//! use ooo_codec::presets::PresetRegistry;
//!
//! let registry = PresetRegistry::new();
//! let vivid = registry.resolve("vivid");
//! assert_eq!(vivid.params.brightness, 20);
//! assert!(registry.resolve("no-such-preset").is_identity());
//! ```

pub mod registry;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enhance::sharpen::MIN_STRENGTH;

pub use registry::PresetRegistry;

/// Name of the identity preset
pub const IDENTITY_PRESET: &str = "original";

/// Name of the only preset that configuration may override
pub const CUSTOM_PRESET: &str = "custom";

/// Tunable parameters consumed by the enhancement operators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetParams {
    /// Offset added to every channel, in pixel-value units
    pub brightness: i32,

    /// Multiplier applied to every channel before the offset
    pub contrast: f32,

    /// Strength of the sharpening kernel; 1.0 disables it, values at or
    /// below `8 / 9.5` are rejected
    pub sharpness: f32,

    /// Multiplier on HSV saturation; 1.0 disables it
    pub saturation: f32,
}

impl PresetParams {
    pub const fn new(brightness: i32, contrast: f32, sharpness: f32, saturation: f32) -> Self {
        Self { brightness, contrast, sharpness, saturation }
    }

    /// Reject parameters the operators cannot work with
    pub fn check(&self) -> std::result::Result<(), String> {
        if !(-255..=255).contains(&self.brightness) {
            return Err(format!("brightness {} is outside -255..=255", self.brightness));
        }
        for (name, value) in [
            ("contrast", self.contrast),
            ("sharpness", self.sharpness),
            ("saturation", self.saturation),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a finite, non-negative number (got {})", name, value));
            }
        }
        if self.sharpness <= MIN_STRENGTH {
            return Err(format!(
                "sharpness must be above {:.3} (got {})",
                MIN_STRENGTH, self.sharpness
            ));
        }
        Ok(())
    }
}

impl Default for PresetParams {
    fn default() -> Self {
        IDENTITY.params
    }
}

/// A named preset
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub params: PresetParams,
}

impl Preset {
    pub const fn new(name: &'static str, params: PresetParams) -> Self {
        Self { name, params }
    }

    /// Identity is decided by name, never by parameter values
    pub fn is_identity(&self) -> bool {
        self.name == IDENTITY_PRESET
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<10} brightness={:<3} contrast={:.1} sharpness={:.1} saturation={:.1}",
            self.name,
            self.params.brightness,
            self.params.contrast,
            self.params.sharpness,
            self.params.saturation
        )
    }
}

/// The identity preset
pub const IDENTITY: Preset = Preset::new(IDENTITY_PRESET, PresetParams::new(0, 1.0, 1.0, 1.0));

/// Every built-in preset, in listing order
pub const BUILTIN_PRESETS: [Preset; 7] = [
    IDENTITY,
    Preset::new("standard", PresetParams::new(15, 1.3, 1.8, 1.2)),
    Preset::new("vivid", PresetParams::new(20, 1.5, 2.2, 1.4)),
    Preset::new("cinematic", PresetParams::new(10, 1.4, 2.0, 1.1)),
    Preset::new("bright", PresetParams::new(25, 1.2, 1.5, 1.3)),
    Preset::new("crisp", PresetParams::new(12, 1.6, 2.5, 1.0)),
    Preset::new(CUSTOM_PRESET, PresetParams::new(15, 1.3, 1.8, 1.2)),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_first_and_neutral() {
        assert!(BUILTIN_PRESETS[0].is_identity());
        assert_eq!(PresetParams::default(), PresetParams::new(0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn test_identity_decided_by_name() {
        let lookalike = Preset::new("plain", IDENTITY.params);
        assert!(!lookalike.is_identity());
    }

    #[test]
    fn test_builtin_params_are_valid() {
        for preset in BUILTIN_PRESETS {
            assert!(preset.params.check().is_ok(), "{}", preset.name);
        }
    }

    #[test]
    fn test_check_rejects_bad_values() {
        assert!(PresetParams::new(300, 1.0, 1.0, 1.0).check().is_err());
        assert!(PresetParams::new(0, f32::NAN, 1.0, 1.0).check().is_err());
        assert!(PresetParams::new(0, 1.0, -2.0, 1.0).check().is_err());
    }
}
