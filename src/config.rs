use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    presets::{PresetParams, PresetRegistry},
    progress::DEFAULT_INTERVAL,
    video::{CliTools, OutputFormat, VideoBackend},
};

/// Main configuration for the ooo codec
///
/// Every section is optional in the TOML file; missing keys take their
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Video backend and output settings
    pub video: VideoConfig,

    /// Container file settings
    pub container: ContainerConfig,

    /// Progress reporting settings
    pub progress: ProgressConfig,

    /// Preset overrides
    pub presets: PresetsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.video.validate()?;
        self.progress.validate()?;
        self.presets.validate()?;
        Ok(())
    }

    /// Preset registry with the `custom` override applied
    pub fn preset_registry(&self) -> PresetRegistry {
        match self.presets.custom {
            Some(params) => PresetRegistry::with_custom(params),
            None => PresetRegistry::new(),
        }
    }

    /// Locations of the ffmpeg executables for the CLI backend
    pub fn cli_tools(&self) -> CliTools {
        CliTools::new(self.video.ffmpeg_path.clone(), self.video.ffprobe_path.clone())
    }
}

/// Video backend and output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Which backend opens sources and sinks
    pub backend: VideoBackend,

    /// Container format of decoded videos
    pub output_format: OutputFormat,

    /// Where containers and decoded videos are written
    pub output_dir: PathBuf,

    /// `ffmpeg` executable used by the CLI backend
    pub ffmpeg_path: PathBuf,

    /// `ffprobe` executable used by the CLI backend
    pub ffprobe_path: PathBuf,
}

impl Default for VideoConfig {
    fn default() -> Self {
        let tools = CliTools::default();
        Self {
            backend: VideoBackend::default(),
            output_format: OutputFormat::default(),
            output_dir: PathBuf::from("output"),
            ffmpeg_path: tools.ffmpeg,
            ffprobe_path: tools.ffprobe,
        }
    }
}

impl VideoConfig {
    fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "video.output_dir".to_string(),
                value: String::new(),
            }
            .into());
        }

        if self.ffmpeg_path.as_os_str().is_empty() || self.ffprobe_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "video.ffmpeg_path".to_string(),
                value: format!("{} / {}", self.ffmpeg_path.display(), self.ffprobe_path.display()),
            }
            .into());
        }

        Ok(())
    }
}

/// Container file configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Write indented JSON
    pub pretty: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Progress reporting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Frames between two progress reports
    pub interval: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { interval: DEFAULT_INTERVAL }
    }
}

impl ProgressConfig {
    fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(ConfigError::InvalidValue {
                key: "progress.interval".to_string(),
                value: self.interval.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Preset overrides; only `custom` can be replaced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetsConfig {
    /// Parameters for the `custom` preset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<PresetParams>,
}

impl PresetsConfig {
    fn validate(&self) -> Result<()> {
        if let Some(params) = &self.custom {
            params.check().map_err(|reason| ConfigError::InvalidValue {
                key: "presets.custom".to_string(),
                value: reason,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.video.output_dir, PathBuf::from("output"));
        assert_eq!(config.progress.interval, 30);
        assert!(config.container.pretty);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("ooo.toml");

        let mut original_config = Config::default();
        original_config.video.output_format = OutputFormat::Webm;
        original_config.presets.custom = Some(PresetParams::new(5, 1.1, 1.4, 0.9));

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(
            &file_path,
            "[video]\noutput_dir = \"renders\"\n\n[presets.custom]\nbrightness = -10\ncontrast = 1.0\nsharpness = 2.0\nsaturation = 1.0\n",
        )
        .unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.video.output_dir, PathBuf::from("renders"));
        assert_eq!(config.video.backend, VideoBackend::Cli);
        assert_eq!(config.progress.interval, 30);

        let custom = config.preset_registry().resolve("custom");
        assert_eq!(custom.params.brightness, -10);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, crate::error::OooError::Config(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_invalid_interval() {
        let mut config = Config::default();
        config.progress.interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_custom_preset() {
        let mut config = Config::default();
        config.presets.custom = Some(PresetParams::new(0, -1.0, 1.0, 1.0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_sharpness_too_weak_for_kernel() {
        let mut config = Config::default();
        config.presets.custom = Some(PresetParams::new(0, 1.0, 0.5, 1.0));
        assert!(config.validate().is_err());

        config.presets.custom = Some(PresetParams::new(0, 1.0, 0.9, 1.0));
        assert!(config.validate().is_ok());
    }
}
