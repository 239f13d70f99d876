//! # Slideshow-Compositor
//!
//! Turn a set of still images into a short-form or long-form video with
//! Ken Burns motion, crossfade transitions and a guaranteed hard-cut fallback.
//!
//! This library plans a per-content-type slideshow (slot durations, motion,
//! transitions), hands the resulting filtergraph to an external renderer and
//! checks the rendered artifact before accepting it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slideshow_compositor::{
//!     composition::CompositionEngine,
//!     config::Config,
//!     profile::ContentType,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let engine = CompositionEngine::new(Config::default());
//! let request = engine.request(
//!     ContentType::Reels,
//!     vec!["01.jpg".into(), "02.jpg".into(), "03.jpg".into()],
//!     Some("voiceover.mp3".into()),
//!     "story_reels.mp4".into(),
//!     12.0,
//! );
//!
//! let report = engine.compose(request).await?;
//! println!("rendered {:?} plan to {:?}", report.kind(), report.output);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`profile`] - Content types and their timing/motion/transition profiles
//! - [`schedule`] - Slot durations, seeded motion and transition selection
//! - [`plan`] - Filtergraph assembly and output validation
//! - [`render`] - Renderer, capability probe and measurement collaborators
//! - [`composition`] - Fallback state machine and the composition engine
//! - [`config`] - Configuration management
//!
//! ## Determinism
//!
//! Motion and transitions are drawn from a stream seeded by the output file
//! name, so rendering the same request twice produces the same plan.

pub mod composition;
pub mod config;
pub mod error;
pub mod logging;
pub mod plan;
pub mod profile;
pub mod render;
pub mod schedule;

// Re-export commonly used types for convenience
pub use crate::{
    composition::{CompositionEngine, RenderReport, RenderRequest},
    config::Config,
    error::{CompositorError, Result},
    profile::{ContentProfile, ContentType, ProfileRegistry},
};
