//! # Scheduling
//!
//! Fits still images into a target duration and derives each slot's motion
//! and outgoing transition from a single seeded stream.

pub mod builder;
pub mod motion;
pub mod stream;
pub mod transitions;

pub use builder::{seed_from_output, Schedule, ScheduleBuilder, Slot, DURATION_EPSILON};
pub use motion::{
    Horizontal, MotionParameterGenerator, MotionParams, PanDirection, Vertical, ZoomDirection,
    ZoomPath,
};
pub use stream::{DeterministicStream, SlotDraw};
pub use transitions::{TransitionSelector, TransitionSet};
