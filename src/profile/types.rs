use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Transition identifier every ffmpeg build with `xfade` understands
pub const UNIVERSAL_TRANSITION: &str = "fade";

/// Closed set of content variants a render request can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Long,
    Medium,
    Short,
    Reels,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [Self::Long, Self::Medium, Self::Short, Self::Reels];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Medium => "medium",
            Self::Short => "short",
            Self::Reels => "reels",
        }
    }

    /// Output frame used when no profile is available for this content type
    pub fn default_frame(&self) -> FrameSpec {
        match self {
            Self::Long | Self::Medium => FrameSpec::new(1920, 1080, 30),
            Self::Short | Self::Reels => FrameSpec::new(1080, 1920, 30),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" => Ok(Self::Long),
            "medium" => Ok(Self::Medium),
            "short" => Ok(Self::Short),
            "reels" => Ok(Self::Reels),
            other => Err(ConfigError::InvalidValue {
                key: "content_type".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Target frame geometry and rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl FrameSpec {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self { width, height, fps }
    }

    /// Number of frames covering `duration` seconds
    pub fn frames_for(&self, duration: f64) -> u32 {
        (duration * self.fps as f64).round().max(1.0) as u32
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Allowed display time for a single still (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StillRange {
    pub min: f64,
    pub max: f64,
}

/// Ken Burns settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionSettings {
    /// Upper bound of the zoom factor (1.0 = no zoom)
    pub max_zoom: f64,

    /// Zoom added per output frame
    pub zoom_per_frame: f64,

    pub pan_enabled: bool,

    /// Pan distance in source pixels per output frame
    pub pan_speed: f64,
}

/// Optional passes applied once to the fully chained output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinishingPass {
    #[serde(default)]
    pub vignette: bool,

    #[serde(default)]
    pub grain: bool,

    /// ffmpeg `noise` strength (0-100)
    #[serde(default = "default_grain_strength")]
    pub grain_strength: u8,
}

fn default_grain_strength() -> u8 {
    8
}

impl FinishingPass {
    pub fn is_empty(&self) -> bool {
        !self.vignette && !self.grain
    }
}

/// Immutable per-content-type presentation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentProfile {
    pub content_type: ContentType,

    /// Ordered transition vocabulary (xfade identifiers)
    pub transitions: Vec<String>,

    /// Cross-fade length in seconds
    pub transition_duration: f64,

    pub still_duration: StillRange,

    pub motion: MotionSettings,

    pub frame: FrameSpec,

    #[serde(default)]
    pub finishing: FinishingPass,
}

impl ContentProfile {
    /// Check the numeric constraints every component relies on
    pub fn validate(&self) -> Result<()> {
        let key = |field: &str| format!("profiles.{}.{}", self.content_type, field);

        if !(self.transition_duration > 0.0 && self.transition_duration.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: key("transition_duration"),
                value: self.transition_duration.to_string(),
            }
            .into());
        }

        let range = self.still_duration;
        if !(range.min > 0.0 && range.min <= range.max && range.max.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: key("still_duration"),
                value: format!("{}-{}", range.min, range.max),
            }
            .into());
        }

        // Each slot must outlast the cross-fades on its edges
        if self.transition_duration >= range.min {
            return Err(ConfigError::InvalidValue {
                key: key("transition_duration"),
                value: format!("{} >= still min {}", self.transition_duration, range.min),
            }
            .into());
        }

        if self.motion.max_zoom < 1.0 || self.motion.zoom_per_frame < 0.0 || self.motion.pan_speed < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: key("motion"),
                value: format!(
                    "max_zoom={} zoom_per_frame={} pan_speed={}",
                    self.motion.max_zoom, self.motion.zoom_per_frame, self.motion.pan_speed
                ),
            }
            .into());
        }

        if self.frame.width == 0 || self.frame.height == 0 || self.frame.fps == 0 {
            return Err(ConfigError::InvalidValue {
                key: key("frame"),
                value: format!("{}x{}@{}", self.frame.width, self.frame.height, self.frame.fps),
            }
            .into());
        }

        if self.frame.width % 2 != 0 || self.frame.height % 2 != 0 {
            return Err(ConfigError::InvalidValue {
                key: key("frame"),
                value: format!("{}x{} (yuv420p needs even dimensions)", self.frame.width, self.frame.height),
            }
            .into());
        }

        Ok(())
    }
}
