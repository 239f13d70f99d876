use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    config::RendererConfig,
    error::{CompositorError, RenderError, Result, TransitionError},
    plan::{CompositionPlan, FiltergraphAssembler, OutputValidator, PlanKind, ValidationResult},
    profile::{ContentProfile, ContentType},
    render::{MediaMeasurer, RenderJob, Renderer},
    schedule::{
        seed_from_output, MotionParameterGenerator, Schedule, ScheduleBuilder, TransitionSelector,
        TransitionSet,
    },
};

/// One render request; owns everything the state machine needs
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub content_type: ContentType,

    /// Resolved profile, `None` when configuration has none for the type
    pub profile: Option<ContentProfile>,

    pub images: Vec<PathBuf>,
    pub audio: Option<PathBuf>,
    pub output: PathBuf,
    pub target_duration: f64,

    /// Repeat images instead of running short of the target
    pub cycle_images: bool,

    cancel: Arc<AtomicBool>,
}

impl RenderRequest {
    pub fn new(
        content_type: ContentType,
        profile: Option<ContentProfile>,
        images: Vec<PathBuf>,
        output: PathBuf,
        target_duration: f64,
    ) -> Self {
        Self {
            content_type,
            profile,
            images,
            audio: None,
            output,
            target_duration,
            cycle_images: false,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_audio(mut self, audio: Option<PathBuf>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_cycle_images(mut self, enabled: bool) -> Self {
        self.cycle_images = enabled;
        self
    }

    /// Seed for motion and transition draws, derived from the output name
    pub fn seed(&self) -> String {
        seed_from_output(&self.output)
    }

    /// Handle that cancels this request when set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

/// States of the effects/fallback state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    AttemptEffects,
    Validate,
    Fallback,
    Accept,
    Failed,
}

/// Successful outcome of a render request
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub content_type: ContentType,
    pub output: PathBuf,
    pub plan: CompositionPlan,
    pub validation: ValidationResult,

    /// States visited, in order
    pub trail: Vec<ControllerState>,

    /// Accepted-with-note outcomes (short schedules, fallback causes)
    pub warnings: Vec<String>,

    /// Why the full plan was abandoned, when it was
    pub fallback_cause: Option<String>,

    /// Source images actually shown (fewer than given when slots were dropped)
    pub distinct_images: usize,
}

/// A rendered and validated attempt
struct Attempt {
    plan: CompositionPlan,
    validation: ValidationResult,
    distinct_images: usize,
}

impl RenderReport {
    pub fn kind(&self) -> PlanKind {
        self.plan.kind
    }

    pub fn fell_back(&self) -> bool {
        self.fallback_cause.is_some()
    }

    pub fn fallback_attempts(&self) -> usize {
        self.trail.iter().filter(|s| **s == ControllerState::Fallback).count()
    }
}

/// Drives one request through effects, validation and at most one
/// hard-cut fallback
pub struct FallbackController {
    renderer: Arc<dyn Renderer>,
    measurer: Arc<dyn MediaMeasurer>,
    render_timeout: Duration,
    measure_timeout: Duration,
}

impl FallbackController {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        measurer: Arc<dyn MediaMeasurer>,
        config: &RendererConfig,
    ) -> Self {
        Self {
            renderer,
            measurer,
            render_timeout: config.render_timeout(),
            measure_timeout: config.measure_timeout(),
        }
    }

    pub fn with_timeouts(mut self, render: Duration, measure: Duration) -> Self {
        self.render_timeout = render;
        self.measure_timeout = measure;
        self
    }

    /// Run the request to `Accept` or terminal failure
    pub async fn run(&self, request: &RenderRequest, supported: &TransitionSet) -> Result<RenderReport> {
        let mut trail = Vec::new();
        let mut warnings = Vec::new();

        let effects = match &request.profile {
            None => Err(CompositorError::infeasible(format!(
                "no profile configured for {}",
                request.content_type
            ))),
            Some(profile) if !supported.has_usable(profile) => Err(TransitionError::NoTransitionAvailable {
                requested: profile.transitions.clone(),
            }
            .into()),
            Some(profile) => {
                trail.push(ControllerState::AttemptEffects);
                self.attempt_effects(request, profile, supported, &mut trail, &mut warnings)
                    .await
            }
        };

        let cause = match effects {
            Ok(Attempt { plan, validation, distinct_images }) => {
                trail.push(ControllerState::Accept);
                info!("✅ {} accepted with full effects", request.content_type);
                return Ok(RenderReport {
                    content_type: request.content_type,
                    output: request.output.clone(),
                    plan,
                    validation,
                    trail,
                    warnings,
                    fallback_cause: None,
                    distinct_images,
                });
            }
            Err(e) if !e.is_recoverable() => {
                warn!("{}: not retrying with hard cuts: {}", request.content_type, e);
                return Err(e);
            }
            Err(cause) => cause,
        };

        warn!("{}: falling back to hard cuts: {}", request.content_type, cause);
        trail.push(ControllerState::Fallback);

        match self.attempt_fallback(request, &mut trail).await {
            Ok(Attempt { plan, validation, distinct_images }) => {
                trail.push(ControllerState::Accept);
                warnings.push(format!("rendered with hard cuts after: {}", cause));
                info!("✅ {} accepted with hard cuts", request.content_type);
                Ok(RenderReport {
                    content_type: request.content_type,
                    output: request.output.clone(),
                    plan,
                    validation,
                    trail,
                    warnings,
                    fallback_cause: Some(cause.to_string()),
                    distinct_images,
                })
            }
            Err(CompositorError::Cancelled) => Err(CompositorError::Cancelled),
            Err(fallback) => {
                trail.push(ControllerState::Failed);
                warn!("{} failed after fallback: {} (trail {:?})", request.content_type, fallback, trail);
                Err(CompositorError::RenderFailed {
                    cause: Box::new(cause),
                    fallback: Box::new(fallback),
                })
            }
        }
    }

    async fn attempt_effects(
        &self,
        request: &RenderRequest,
        profile: &ContentProfile,
        supported: &TransitionSet,
        trail: &mut Vec<ControllerState>,
        warnings: &mut Vec<String>,
    ) -> Result<Attempt> {
        let seed = request.seed();
        debug!("Planning {} with seed '{}'", request.content_type, seed);

        let schedule = ScheduleBuilder::new(profile)
            .cycle_images(request.cycle_images)
            .build(request.target_duration, &request.images)?;

        if let Some(shortfall) = schedule.shortfall() {
            warnings.push(format!(
                "schedule runs {:.3}s short of the {:.3}s target (stills capped at {:.3}s)",
                shortfall, request.target_duration, profile.still_duration.max
            ));
        }

        // Motion draws precede transition draws for every slot
        let motion = MotionParameterGenerator::generate(&schedule, profile, &seed);
        let transitions = TransitionSelector::select(&schedule, supported, profile, &seed)?;
        let plan = FiltergraphAssembler::new(profile).assemble(&schedule, &motion, &transitions)?;

        self.render(&plan, request).await?;
        trail.push(ControllerState::Validate);
        let validation = self.validate(&plan, request).await?;
        Ok(Attempt {
            plan,
            validation,
            distinct_images: schedule.distinct_images(),
        })
    }

    async fn attempt_fallback(
        &self,
        request: &RenderRequest,
        trail: &mut Vec<ControllerState>,
    ) -> Result<Attempt> {
        let frame = request
            .profile
            .as_ref()
            .map(|p| p.frame)
            .unwrap_or_else(|| request.content_type.default_frame());

        let schedule = Schedule::hard_cut(request.target_duration, &request.images)?;
        let plan = FiltergraphAssembler::assemble_hard_cut(frame, &schedule);

        self.render(&plan, request).await?;
        trail.push(ControllerState::Validate);
        let validation = self.validate(&plan, request).await?;
        Ok(Attempt {
            plan,
            validation,
            distinct_images: schedule.distinct_images(),
        })
    }

    async fn render(&self, plan: &CompositionPlan, request: &RenderRequest) -> Result<()> {
        check_cancelled(request)?;

        let job = RenderJob {
            plan,
            audio: request.audio.as_deref(),
            output: &request.output,
        };

        match tokio::time::timeout(self.render_timeout, self.renderer.render(job)).await {
            Ok(result) => result,
            Err(_) => Err(RenderError::TimedOut {
                seconds: self.render_timeout.as_secs(),
            }
            .into()),
        }
    }

    async fn validate(&self, plan: &CompositionPlan, request: &RenderRequest) -> Result<ValidationResult> {
        check_cancelled(request)?;

        let observed = match tokio::time::timeout(self.measure_timeout, self.measurer.measure(&request.output)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(RenderError::MeasurementFailed {
                    path: request.output.display().to_string(),
                    reason: format!("timed out after {}s", self.measure_timeout.as_secs()),
                }
                .into())
            }
        };

        let validation = OutputValidator::validate_properties(plan, &observed);
        match validation.clone().into_error() {
            Some(mismatch) => Err(mismatch.into()),
            None => Ok(validation),
        }
    }
}

fn check_cancelled(request: &RenderRequest) -> Result<()> {
    if request.is_cancelled() {
        info!("{} cancelled, discarding plan", request.content_type);
        return Err(CompositorError::Cancelled);
    }
    Ok(())
}
