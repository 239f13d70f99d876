use std::path::Path;

use async_trait::async_trait;

use crate::{
    error::Result,
    plan::{CompositionPlan, MediaProperties},
    schedule::TransitionSet,
};

/// Everything the renderer needs for one attempt
#[derive(Debug, Clone, Copy)]
pub struct RenderJob<'a> {
    pub plan: &'a CompositionPlan,

    /// Optional audio track muxed under the video
    pub audio: Option<&'a Path>,

    pub output: &'a Path,
}

/// External engine that executes a composition plan
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Returns the unique name of this renderer
    fn name(&self) -> &str;

    /// Produce the artifact described by `job`.
    ///
    /// Any failure is reported as a renderer execution error; the caller
    /// bounds the call with its own timeout.
    async fn render(&self, job: RenderJob<'_>) -> Result<()>;
}

/// Measures a rendered artifact
#[async_trait]
pub trait MediaMeasurer: Send + Sync {
    async fn measure(&self, artifact: &Path) -> Result<MediaProperties>;
}

/// Reports which transition identifiers the renderer build supports
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    async fn supported_transitions(&self) -> Result<TransitionSet>;
}

/// Probe answering from a fixed set
#[derive(Debug, Clone, Default)]
pub struct StaticCapabilities(pub TransitionSet);

#[async_trait]
impl CapabilityProbe for StaticCapabilities {
    async fn supported_transitions(&self) -> Result<TransitionSet> {
        Ok(self.0.clone())
    }
}
