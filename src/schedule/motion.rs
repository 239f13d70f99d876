use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    profile::ContentProfile,
    schedule::{DeterministicStream, Schedule},
};

/// Zoom direction over a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizontal {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vertical {
    Up,
    Down,
    Center,
}

/// Direction the view travels across the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanDirection {
    pub horizontal: Horizontal,
    pub vertical: Vertical,
}

impl PanDirection {
    pub const CENTER: PanDirection = PanDirection {
        horizontal: Horizontal::Center,
        vertical: Vertical::Center,
    };

    pub fn is_static(&self) -> bool {
        *self == Self::CENTER
    }
}

/// Resolved zoom path for one slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomPath {
    pub direction: ZoomDirection,

    /// Zoom factor at the first frame
    pub start: f64,

    /// Zoom factor at the last frame
    pub end: f64,

    /// Zoom change per frame (always non-negative)
    pub per_frame: f64,
}

/// Ken Burns parameters for one slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionParams {
    pub slot_index: usize,

    /// Frames the motion runs over
    pub frames: u32,

    pub zoom: ZoomPath,
    pub pan: PanDirection,

    /// Source pixels travelled per frame
    pub pan_speed: f64,
}

impl MotionParams {
    /// True when the slot neither zooms nor pans
    pub fn is_still(&self) -> bool {
        self.zoom.start == self.zoom.end && (self.pan.is_static() || self.pan_speed == 0.0)
    }
}

/// Derives per-slot Ken Burns motion from the deterministic stream
pub struct MotionParameterGenerator;

impl MotionParameterGenerator {
    /// Motion for every slot, in slot order.
    ///
    /// Slot `i`'s parameters depend only on `i`, its frame count, the profile
    /// and the seed.
    pub fn generate(schedule: &Schedule, profile: &ContentProfile, seed: &str) -> Vec<MotionParams> {
        let draws = DeterministicStream::draws(seed, schedule.len());

        let params: Vec<MotionParams> = schedule
            .slots()
            .iter()
            .zip(draws)
            .map(|(slot, draw)| {
                let frames = profile.frame.frames_for(slot.duration);
                let [zoom_word, horizontal_word, vertical_word] = draw.motion;

                let zoom = zoom_path(zoom_word, frames, profile);
                let pan = if profile.motion.pan_enabled {
                    PanDirection {
                        horizontal: match horizontal_word % 3 {
                            0 => Horizontal::Left,
                            1 => Horizontal::Right,
                            _ => Horizontal::Center,
                        },
                        vertical: match vertical_word % 3 {
                            0 => Vertical::Up,
                            1 => Vertical::Down,
                            _ => Vertical::Center,
                        },
                    }
                } else {
                    PanDirection::CENTER
                };

                MotionParams {
                    slot_index: slot.index,
                    frames,
                    zoom,
                    pan,
                    pan_speed: if profile.motion.pan_enabled { profile.motion.pan_speed } else { 0.0 },
                }
            })
            .collect();

        debug!("Generated motion for {} slots (seed '{}')", params.len(), seed);
        params
    }
}

fn zoom_path(word: u32, frames: u32, profile: &ContentProfile) -> ZoomPath {
    let settings = &profile.motion;
    let direction = if word % 2 == 0 { ZoomDirection::In } else { ZoomDirection::Out };

    // Zoom grows per frame until it reaches the ceiling
    let span = (settings.zoom_per_frame * frames.saturating_sub(1) as f64).min(settings.max_zoom - 1.0);
    let peak = 1.0 + span.max(0.0);

    let (start, end) = match direction {
        ZoomDirection::In => (1.0, peak),
        ZoomDirection::Out => (peak, 1.0),
    };

    ZoomPath {
        direction,
        start,
        end,
        per_frame: settings.zoom_per_frame,
    }
}
