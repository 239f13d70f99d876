use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::{
    composition::{FallbackController, RenderReport, RenderRequest},
    config::Config,
    error::{CompositorError, Result},
    profile::{ContentType, ProfileRegistry},
    render::{
        CapabilityProbe, FfmpegCapabilityProbe, FfmpegRenderer, FfprobeMeasurer, MediaMeasurer,
        Renderer,
    },
    schedule::TransitionSet,
};

/// Main composition engine that turns image sets into finished videos
///
/// The engine follows a clear pipeline per request:
/// 1. Capability Probe - Ask the renderer which transitions it supports (once per batch)
/// 2. Planning - Schedule, motion, transitions and filtergraph
/// 3. Rendering - Run the external engine and validate its output
/// 4. Fallback - One hard-cut attempt when anything in 2-3 fails
pub struct CompositionEngine {
    config: Config,
    registry: ProfileRegistry,
    renderer: Arc<dyn Renderer>,
    measurer: Arc<dyn MediaMeasurer>,
    probe: Arc<dyn CapabilityProbe>,
}

impl CompositionEngine {
    /// Create an engine backed by the configured ffmpeg and ffprobe binaries
    pub fn new(config: Config) -> Self {
        let renderer = Arc::new(FfmpegRenderer::new(
            config.renderer.ffmpeg_path.clone(),
            config.video.clone(),
        ));
        let measurer = Arc::new(FfprobeMeasurer::new(config.renderer.ffprobe_path.clone()));
        let probe = Arc::new(FfmpegCapabilityProbe::new(config.renderer.ffmpeg_path.clone()));

        Self::with_collaborators(config, renderer, measurer, probe)
    }

    /// Create an engine with explicit collaborators
    pub fn with_collaborators(
        config: Config,
        renderer: Arc<dyn Renderer>,
        measurer: Arc<dyn MediaMeasurer>,
        probe: Arc<dyn CapabilityProbe>,
    ) -> Self {
        let registry = config.profile_registry();
        Self {
            config,
            registry,
            renderer,
            measurer,
            probe,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Build a request with the profile resolved from the registry
    ///
    /// A content type with no profile still yields a request; the controller
    /// sends it straight to the hard-cut fallback.
    pub fn request(
        &self,
        content_type: ContentType,
        images: Vec<PathBuf>,
        audio: Option<PathBuf>,
        output: PathBuf,
        target_duration: f64,
    ) -> RenderRequest {
        if !self.registry.has_profile(content_type) {
            warn!("No profile configured for {}, it will render with hard cuts", content_type);
        }

        RenderRequest::new(
            content_type,
            self.registry.get(content_type),
            images,
            output,
            target_duration,
        )
        .with_audio(audio)
        .with_cycle_images(self.config.renderer.cycle_images)
    }

    // ==========================================
    // PIPELINE STEP 1: CAPABILITY PROBE
    // ==========================================

    /// Transitions the renderer supports; empty when the probe fails
    pub async fn probe_capabilities(&self) -> TransitionSet {
        info!("🔎 Probing renderer capabilities ({})", self.renderer.name());

        match tokio::time::timeout(
            self.config.renderer.measure_timeout(),
            self.probe.supported_transitions(),
        )
        .await
        {
            Ok(Ok(supported)) => {
                debug!("Renderer supports {} transitions", supported.len());
                supported
            }
            Ok(Err(e)) => {
                warn!("Capability probe failed, treating capabilities as unknown: {}", e);
                TransitionSet::default()
            }
            Err(_) => {
                warn!("Capability probe timed out, treating capabilities as unknown");
                TransitionSet::default()
            }
        }
    }

    // ==========================================
    // PIPELINE STEPS 2-4: PLAN, RENDER, FALLBACK
    // ==========================================

    /// Render a single request
    pub async fn compose(&self, request: RenderRequest) -> Result<RenderReport> {
        let supported = self.probe_capabilities().await;
        self.compose_with(&request, &supported).await
    }

    /// Render a single request against an already probed capability set
    pub async fn compose_with(&self, request: &RenderRequest, supported: &TransitionSet) -> Result<RenderReport> {
        info!("🎬 Composing {} video", request.content_type);
        info!("   Images: {}", request.images.len());
        info!("   Target: {:.3}s", request.target_duration);
        info!("   Output: {:?}", request.output);

        self.controller().run(request, supported).await
    }

    /// Render several independent requests concurrently
    ///
    /// Results come back in request order. One request failing never
    /// affects the others.
    pub async fn compose_variants(&self, requests: Vec<RenderRequest>) -> Vec<Result<RenderReport>> {
        let supported = Arc::new(self.probe_capabilities().await);
        let permits = Arc::new(Semaphore::new(self.config.renderer.max_concurrent_renders.max(1)));
        let controller = Arc::new(self.controller());
        let count = requests.len();

        info!("🎞️  Composing {} variants ({} at a time)", count, self.config.renderer.max_concurrent_renders);

        let mut tasks = JoinSet::new();
        for (index, request) in requests.into_iter().enumerate() {
            let supported = Arc::clone(&supported);
            let permits = Arc::clone(&permits);
            let controller = Arc::clone(&controller);

            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => controller.run(&request, &supported).await,
                    Err(_) => Err(CompositorError::generic("render queue closed")),
                };
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<RenderReport>>> = (0..count).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => warn!("Render task aborted: {}", e),
            }
        }

        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| Err(CompositorError::generic("render task aborted"))))
            .collect()
    }

    fn controller(&self) -> FallbackController {
        FallbackController::new(
            Arc::clone(&self.renderer),
            Arc::clone(&self.measurer),
            &self.config.renderer,
        )
    }
}
