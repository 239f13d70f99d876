use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    profile::{ContentProfile, ProfileRegistry},
};

/// Main configuration for the slideshow compositor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Output encoding settings
    #[serde(default)]
    pub video: VideoConfig,

    /// External renderer settings
    #[serde(default)]
    pub renderer: RendererConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-content-type profile overrides
    #[serde(default)]
    pub profiles: ProfilesConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.video.validate()?;
        self.renderer.validate()?;
        for profile in &self.profiles.overrides {
            profile.validate()?;
        }
        Ok(())
    }

    /// Profile registry with configured overrides applied
    pub fn profile_registry(&self) -> ProfileRegistry {
        let mut registry = if self.profiles.builtin {
            ProfileRegistry::new()
        } else {
            ProfileRegistry::empty()
        };
        for profile in &self.profiles.overrides {
            registry.register(profile.clone());
        }
        registry
    }
}

/// Output encoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Video codec passed to ffmpeg
    pub codec: String,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,

    /// Encoder preset
    pub preset: String,

    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            quality: 85,
            preset: "medium".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }
}

impl VideoConfig {
    fn validate(&self) -> Result<()> {
        if self.quality > 100 {
            return Err(ConfigError::InvalidValue {
                key: "video.quality".to_string(),
                value: self.quality.to_string()
            }.into());
        }

        if self.codec.trim().is_empty() {
            return Err(ConfigError::MissingKey { key: "video.codec".to_string() }.into());
        }

        Ok(())
    }
}

/// External renderer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,

    /// Upper bound for one ffmpeg run (seconds)
    pub timeout_secs: u64,

    /// Upper bound for one ffprobe run (seconds)
    pub measure_timeout_secs: u64,

    /// Render requests processed at the same time
    pub max_concurrent_renders: usize,

    /// Repeat images round-robin instead of running short of the target
    pub cycle_images: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            timeout_secs: 600,
            measure_timeout_secs: 30,
            max_concurrent_renders: num_cpus::get().clamp(1, 4),
            cycle_images: false,
        }
    }
}

impl RendererConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn measure_timeout(&self) -> Duration {
        Duration::from_secs(self.measure_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 || self.measure_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "renderer.timeout_secs".to_string(),
                value: format!("{}/{}", self.timeout_secs, self.measure_timeout_secs)
            }.into());
        }

        if self.max_concurrent_renders == 0 {
            return Err(ConfigError::InvalidValue {
                key: "renderer.max_concurrent_renders".to_string(),
                value: self.max_concurrent_renders.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Profile sources
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    /// Start from the built-in profiles
    pub builtin: bool,

    /// Profiles replacing the built-in entry for their content type
    pub overrides: Vec<ContentProfile>,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            overrides: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ContentType;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        let mut reels = ProfileRegistry::builtin(ContentType::Reels);
        reels.transitions = vec!["fade".to_string(), "radial".to_string()];
        original_config.profiles.overrides.push(reels);

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config.video.quality, loaded_config.video.quality);
        assert_eq!(original_config.renderer.timeout_secs, loaded_config.renderer.timeout_secs);
        assert_eq!(original_config.profiles.overrides, loaded_config.profiles.overrides);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [renderer]
            ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
            ffprobe_path = "/opt/ffmpeg/bin/ffprobe"
            timeout_secs = 120
            measure_timeout_secs = 10
            max_concurrent_renders = 2
            cycle_images = true
            "#,
        )
        .unwrap();

        assert_eq!(config.renderer.timeout_secs, 120);
        assert_eq!(config.video.codec, "libx264");
        assert!(config.profiles.builtin);
    }

    #[test]
    fn test_partial_sections_fill_missing_keys() {
        let config: Config = toml::from_str(
            r#"
            [renderer]
            ffmpeg_path = "/usr/local/bin/ffmpeg"

            [logging]
            json = true

            [[profiles.overrides]]
            content_type = "reels"
            transitions = ["fade", "radial"]
            transition_duration = 0.3
            still_duration = { min = 1.5, max = 4.0 }
            motion = { max_zoom = 1.3, zoom_per_frame = 0.002, pan_enabled = true, pan_speed = 1.0 }
            frame = { width = 1080, height = 1920, fps = 30 }
            "#,
        )
        .unwrap();

        assert_eq!(config.renderer.ffmpeg_path, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(config.renderer.ffprobe_path, PathBuf::from("ffprobe"));
        assert_eq!(config.renderer.timeout_secs, 600);
        assert!(!config.renderer.cycle_images);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.json);
        assert!(config.profiles.builtin);
        assert_eq!(config.profiles.overrides.len(), 1);
        assert!(config.validate().is_ok());

        let registry = config.profile_registry();
        assert_eq!(registry.get(ContentType::Reels).unwrap().transition_duration, 0.3);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_overrides_replace_builtin() {
        let mut config = Config::default();
        let mut long = ProfileRegistry::builtin(ContentType::Long);
        long.transition_duration = 1.5;
        config.profiles.overrides.push(long);

        let registry = config.profile_registry();
        assert_eq!(registry.get(ContentType::Long).unwrap().transition_duration, 1.5);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_without_builtin_profiles() {
        let mut config = Config::default();
        config.profiles.builtin = false;
        assert!(config.profile_registry().get(ContentType::Medium).is_none());
    }

    #[test]
    fn test_invalid_renderer_config() {
        let mut config = Config::default();
        config.renderer.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_profile_override() {
        let mut config = Config::default();
        let mut short = ProfileRegistry::builtin(ContentType::Short);
        short.motion.max_zoom = 0.5;
        config.profiles.overrides.push(short);
        assert!(config.validate().is_err());
    }
}
