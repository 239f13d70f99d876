//! # Composition Plans
//!
//! Compiles a schedule into the filtergraph handed to the renderer and
//! validates what the renderer produced.

pub mod assembler;
pub mod validator;

pub use assembler::{
    CompositionPlan, FiltergraphAssembler, FinishingStage, PlanKind, SlotFragment, TransitionLink,
};
pub use validator::{MediaProperties, OutputValidator, ValidationResult, DURATION_TOLERANCE};
