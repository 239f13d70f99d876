//! # Composition Engine
//!
//! The composition engine probes renderer capabilities, plans each request and
//! drives it through rendering, validation and the hard-cut fallback.

pub mod engine;
pub mod fallback;

// Re-exports for convenience
pub use engine::CompositionEngine;
pub use fallback::{ControllerState, FallbackController, RenderReport, RenderRequest};
