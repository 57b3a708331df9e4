use tracing::warn;

use crate::presets::{Preset, PresetParams, BUILTIN_PRESETS, CUSTOM_PRESET, IDENTITY};

/// Registry of the presets available for decoding
///
/// Built once from the constant table, optionally with the `custom` preset
/// replaced, and read-only afterwards.
#[derive(Debug, Clone)]
pub struct PresetRegistry {
    presets: Vec<Preset>,
}

impl PresetRegistry {
    /// Create a registry holding exactly the built-in presets
    pub fn new() -> Self {
        Self { presets: BUILTIN_PRESETS.to_vec() }
    }

    /// Create a registry whose `custom` preset uses the given parameters
    pub fn with_custom(params: PresetParams) -> Self {
        let mut registry = Self::new();
        for preset in registry.presets.iter_mut() {
            if preset.name == CUSTOM_PRESET {
                preset.params = params;
            }
        }
        registry
    }

    /// Get a preset by name (ASCII case-insensitive)
    pub fn get(&self, name: &str) -> Option<&Preset> {
        let name = name.trim();
        self.presets.iter().find(|preset| preset.name.eq_ignore_ascii_case(name))
    }

    /// Get a preset by name, falling back to the identity preset
    pub fn resolve(&self, name: &str) -> Preset {
        match self.get(name) {
            Some(preset) => *preset,
            None => {
                warn!("Unknown preset '{}', using '{}'", name, IDENTITY.name);
                IDENTITY
            }
        }
    }

    /// Check if a preset is available
    pub fn has_preset(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Preset names in listing order
    pub fn names(&self) -> Vec<&'static str> {
        self.presets.iter().map(|preset| preset.name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::IDENTITY_PRESET;

    #[test]
    fn test_builtin_presets_available() {
        let registry = PresetRegistry::new();

        for name in ["original", "standard", "vivid", "cinematic", "bright", "crisp", "custom"] {
            assert!(registry.has_preset(name), "{}", name);
        }
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.names()[0], IDENTITY_PRESET);
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        let registry = PresetRegistry::new();

        let crisp = registry.resolve("crisp");
        assert_eq!(crisp.params, PresetParams::new(12, 1.6, 2.5, 1.0));

        let fallback = registry.resolve("sepia");
        assert!(fallback.is_identity());
    }

    #[test]
    fn test_lookup_ignores_case() {
        let registry = PresetRegistry::new();
        assert_eq!(registry.resolve("Vivid").name, "vivid");
    }

    #[test]
    fn test_custom_override_only_touches_custom() {
        let params = PresetParams::new(-5, 0.9, 1.2, 0.8);
        let registry = PresetRegistry::with_custom(params);

        assert_eq!(registry.resolve("custom").params, params);
        assert_eq!(registry.resolve("standard").params, PresetParams::new(15, 1.3, 1.8, 1.2));
        assert!(registry.resolve("original").is_identity());
        assert_eq!(registry.resolve("original").params, IDENTITY.params);
    }
}
