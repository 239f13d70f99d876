//! # Content Profiles
//!
//! Per-content-type presentation settings: transition vocabulary, still
//! duration range, Ken Burns motion and output frame.
//!
//! ## Usage
//!
//! ```rust
//! use slideshow_compositor::profile::{ContentType, ProfileRegistry};
//!
//! let registry = ProfileRegistry::new();
//! let reels = registry.get(ContentType::Reels).unwrap();
//! assert_eq!(reels.frame.dimensions(), (1080, 1920));
//! ```

pub mod registry;
pub mod types;

pub use registry::ProfileRegistry;
pub use types::{
    ContentProfile, ContentType, FinishingPass, FrameSpec, MotionSettings, StillRange,
    UNIVERSAL_TRANSITION,
};
