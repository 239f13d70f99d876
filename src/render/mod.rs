//! # Renderer Collaborators
//!
//! Traits for the external engine, its capability probe and the artifact
//! measurement tool, with ffmpeg/ffprobe implementations.

pub mod ffmpeg;
pub mod ffprobe;
pub mod probe;
pub mod traits;

pub use ffmpeg::FfmpegRenderer;
pub use ffprobe::FfprobeMeasurer;
pub use probe::FfmpegCapabilityProbe;
pub use traits::{CapabilityProbe, MediaMeasurer, RenderJob, Renderer, StaticCapabilities};
