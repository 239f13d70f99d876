use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::{CompositorError, Result},
    profile::{ContentProfile, FinishingPass, FrameSpec},
    schedule::{Horizontal, MotionParams, Schedule, Vertical, ZoomDirection},
};

/// Whether a plan carries the full effect chain or the degraded hard cuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    Full,
    HardCut,
}

/// Per-slot graph fragment: normalization followed by motion or a hold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotFragment {
    pub slot_index: usize,
    pub source: PathBuf,
    pub duration: f64,
    pub frames: u32,

    /// Cover-resize, crop, frame rate and pixel format
    pub normalize: String,

    /// zoompan descriptor, `None` when the slot is held still
    pub motion: Option<String>,

    /// Output pad label
    pub label: String,
}

impl SlotFragment {
    /// Filtergraph chain for this slot; input `i` feeds slot `i`
    pub fn filter(&self, fps: u32) -> String {
        let timing = match &self.motion {
            Some(motion) => format!("{},setpts=PTS-STARTPTS", motion),
            None => format!(
                "loop=loop={}:size=1:start=0,setpts=N/{}/TB",
                self.frames.saturating_sub(1),
                fps
            ),
        };
        format!("[{}:v]{},{}[{}]", self.slot_index, self.normalize, timing, self.label)
    }
}

/// Cross-fade between two adjacent chains
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionLink {
    /// Boundary between slot `boundary` and `boundary + 1`
    pub boundary: usize,
    pub transition: String,
    pub duration: f64,

    /// Seconds from sequence start at which the cross-fade begins
    pub offset: f64,

    pub first: String,
    pub second: String,
    pub label: String,
}

impl TransitionLink {
    pub fn filter(&self) -> String {
        format!(
            "[{}][{}]xfade=transition={}:duration={:.3}:offset={:.3}[{}]",
            self.first, self.second, self.transition, self.duration, self.offset, self.label
        )
    }
}

/// Filters applied once to the fully chained output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishingStage {
    pub filters: Vec<String>,
    pub input: String,
    pub label: String,
}

impl FinishingStage {
    fn from_pass(pass: &FinishingPass, input: &str) -> Option<Self> {
        if pass.is_empty() {
            return None;
        }

        let mut filters = Vec::new();
        if pass.vignette {
            filters.push("vignette=PI/5".to_string());
        }
        if pass.grain {
            filters.push(format!("noise=alls={}:allf=t+u", pass.grain_strength));
        }

        Some(Self {
            filters,
            input: input.to_string(),
            label: "vout".to_string(),
        })
    }

    pub fn filter(&self) -> String {
        format!("[{}]{}[{}]", self.input, self.filters.join(","), self.label)
    }
}

/// Renderer-ready graph description derived from a schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionPlan {
    pub kind: PlanKind,
    pub frame: FrameSpec,

    /// Expected run time of the output (seconds)
    pub total_duration: f64,

    pub fragments: Vec<SlotFragment>,
    pub links: Vec<TransitionLink>,

    /// Hard-cut plans join fragments with `concat` instead of `xfade`
    pub concat: Option<String>,

    pub finishing: Option<FinishingStage>,
    pub output_label: String,
}

impl CompositionPlan {
    /// Input images, in slot order
    pub fn inputs(&self) -> impl Iterator<Item = &Path> {
        self.fragments.iter().map(|f| f.source.as_path())
    }

    /// Cross-fade start times, in slot order
    pub fn offsets(&self) -> Vec<f64> {
        self.links.iter().map(|l| l.offset).collect()
    }

    /// ffmpeg `-filter_complex` value
    pub fn to_filter_complex(&self) -> String {
        let mut chains: Vec<String> = self
            .fragments
            .iter()
            .map(|f| f.filter(self.frame.fps))
            .collect();

        chains.extend(self.links.iter().map(TransitionLink::filter));

        if let Some(concat) = &self.concat {
            chains.push(concat.clone());
        }

        if let Some(finishing) = &self.finishing {
            chains.push(finishing.filter());
        }

        chains.join(";")
    }
}

/// Compiles a schedule, its motion and its transitions into a plan
pub struct FiltergraphAssembler {
    frame: FrameSpec,
    finishing: FinishingPass,
}

impl FiltergraphAssembler {
    pub fn new(profile: &ContentProfile) -> Self {
        Self {
            frame: profile.frame,
            finishing: profile.finishing.clone(),
        }
    }

    /// Full plan with Ken Burns motion and cross-fades
    pub fn assemble(
        &self,
        schedule: &Schedule,
        motion: &[MotionParams],
        transitions: &[String],
    ) -> Result<CompositionPlan> {
        if motion.len() != schedule.len() {
            return Err(CompositorError::generic(format!(
                "motion for {} slots, schedule has {}",
                motion.len(),
                schedule.len()
            )));
        }
        if transitions.len() != schedule.transition_count() {
            return Err(CompositorError::generic(format!(
                "{} transitions for {} boundaries",
                transitions.len(),
                schedule.transition_count()
            )));
        }

        let fragments: Vec<SlotFragment> = schedule
            .slots()
            .iter()
            .zip(motion)
            .map(|(slot, params)| SlotFragment {
                slot_index: slot.index,
                source: slot.source.clone(),
                duration: slot.duration,
                frames: self.frame.frames_for(slot.duration),
                normalize: normalize_filter(&self.frame),
                motion: (!params.is_still()).then(|| zoompan_filter(params, &self.frame)),
                label: format!("v{}", slot.index),
            })
            .collect();

        // Offsets come straight from the schedule, in slot order
        let mut links = Vec::with_capacity(transitions.len());
        let mut chained = "v0".to_string();
        for (boundary, (offset, transition)) in schedule
            .transition_offsets()
            .into_iter()
            .zip(transitions)
            .enumerate()
        {
            let label = format!("x{}", boundary);
            links.push(TransitionLink {
                boundary,
                transition: transition.clone(),
                duration: schedule.transition_duration(),
                offset,
                first: chained.clone(),
                second: format!("v{}", boundary + 1),
                label: label.clone(),
            });
            chained = label;
        }

        let finishing = FinishingStage::from_pass(&self.finishing, &chained);
        let output_label = finishing
            .as_ref()
            .map(|stage| stage.label.clone())
            .unwrap_or(chained);

        let plan = CompositionPlan {
            kind: PlanKind::Full,
            frame: self.frame,
            total_duration: schedule.rendered_duration(),
            fragments,
            links,
            concat: None,
            finishing,
            output_label,
        };

        info!(
            "Assembled plan: {} fragments, {} transitions, {:.3}s",
            plan.fragments.len(),
            plan.links.len(),
            plan.total_duration
        );
        debug!("Filtergraph: {}", plan.to_filter_complex());
        Ok(plan)
    }

    /// Degraded plan: normalized stills joined by hard cuts
    pub fn assemble_hard_cut(frame: FrameSpec, schedule: &Schedule) -> CompositionPlan {
        let fragments: Vec<SlotFragment> = schedule
            .slots()
            .iter()
            .map(|slot| SlotFragment {
                slot_index: slot.index,
                source: slot.source.clone(),
                duration: slot.duration,
                frames: frame.frames_for(slot.duration),
                normalize: normalize_filter(&frame),
                motion: None,
                label: format!("v{}", slot.index),
            })
            .collect();

        let (concat, output_label) = if fragments.len() > 1 {
            let pads: String = fragments.iter().map(|f| format!("[{}]", f.label)).collect();
            (
                Some(format!("{}concat=n={}:v=1:a=0[vcat]", pads, fragments.len())),
                "vcat".to_string(),
            )
        } else {
            (None, "v0".to_string())
        };

        info!("Assembled hard-cut plan: {} fragments", fragments.len());

        CompositionPlan {
            kind: PlanKind::HardCut,
            frame,
            total_duration: schedule.rendered_duration(),
            fragments,
            links: Vec::new(),
            concat,
            finishing: None,
            output_label,
        }
    }
}

fn normalize_filter(frame: &FrameSpec) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1,fps={fps},format=yuv420p",
        w = frame.width,
        h = frame.height,
        fps = frame.fps
    )
}

fn zoompan_filter(params: &MotionParams, frame: &FrameSpec) -> String {
    let zoom = &params.zoom;
    let z = if zoom.start == zoom.end {
        format!("{:.4}", zoom.start)
    } else {
        match zoom.direction {
            ZoomDirection::In => format!("min(1+{:.6}*on,{:.4})", zoom.per_frame, zoom.end),
            ZoomDirection::Out => format!("max({:.4}-{:.6}*on,1)", zoom.start, zoom.per_frame),
        }
    };

    let speed = params.pan_speed;
    let x = match params.pan.horizontal {
        Horizontal::Right => format!("min({:.3}*on,iw-iw/zoom)", speed),
        Horizontal::Left => format!("max(iw-iw/zoom-{:.3}*on,0)", speed),
        Horizontal::Center => "(iw-iw/zoom)/2".to_string(),
    };
    let y = match params.pan.vertical {
        Vertical::Down => format!("min({:.3}*on,ih-ih/zoom)", speed),
        Vertical::Up => format!("max(ih-ih/zoom-{:.3}*on,0)", speed),
        Vertical::Center => "(ih-ih/zoom)/2".to_string(),
    };

    format!(
        "zoompan=z='{}':x='{}':y='{}':d={}:s={}x{}:fps={}",
        z, x, y, params.frames, frame.width, frame.height, frame.fps
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ContentType, ProfileRegistry, StillRange};
    use crate::schedule::{MotionParameterGenerator, ScheduleBuilder, TransitionSelector, TransitionSet};
    use proptest::prelude::*;

    fn images(count: usize) -> Vec<PathBuf> {
        (0..count).map(|i| PathBuf::from(format!("shot_{}.jpg", i))).collect()
    }

    fn full_plan(profile: &ContentProfile, target: f64, count: usize, seed: &str) -> (Schedule, CompositionPlan) {
        let schedule = ScheduleBuilder::new(profile).build(target, &images(count)).unwrap();
        let supported: TransitionSet = profile.transitions.iter().cloned().collect();
        let motion = MotionParameterGenerator::generate(&schedule, profile, seed);
        let transitions = TransitionSelector::select(&schedule, &supported, profile, seed).unwrap();
        let plan = FiltergraphAssembler::new(profile).assemble(&schedule, &motion, &transitions).unwrap();
        (schedule, plan)
    }

    #[test]
    fn test_two_slot_offset() {
        let mut profile = ProfileRegistry::builtin(ContentType::Medium);
        profile.still_duration = StillRange { min: 4.0, max: 8.0 };
        profile.transition_duration = 0.8;

        let (_, plan) = full_plan(&profile, 10.0, 2, "two");

        assert_eq!(plan.links.len(), 1);
        assert!((plan.links[0].offset - 4.6).abs() < 0.01);
        assert!(plan.to_filter_complex().contains("duration=0.800:offset=4.600[x0]"));
        assert_eq!(plan.output_label, "x0");
    }

    #[test]
    fn test_single_slot_plan() {
        let profile = ProfileRegistry::builtin(ContentType::Short);
        let (_, plan) = full_plan(&profile, 8.0, 1, "solo");

        assert!(plan.links.is_empty());
        assert!(plan.offsets().is_empty());
        assert_eq!(plan.fragments.len(), 1);
        assert_eq!(plan.output_label, "v0");
        assert!((plan.total_duration - 8.0).abs() < 0.01);
    }

    #[test]
    fn test_frame_count_and_normalization() {
        let profile = ProfileRegistry::builtin(ContentType::Reels);
        let (schedule, plan) = full_plan(&profile, 12.0, 4, "frames");

        for (fragment, slot) in plan.fragments.iter().zip(schedule.slots()) {
            assert_eq!(fragment.frames, (slot.duration * 30.0).round() as u32);
            assert!(fragment.normalize.starts_with("scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920"));
            if let Some(motion) = &fragment.motion {
                assert!(motion.contains(&format!("d={}", fragment.frames)));
                assert!(motion.contains("s=1080x1920"));
            }
        }
    }

    #[test]
    fn test_chain_links_previous_output() {
        let profile = ProfileRegistry::builtin(ContentType::Short);
        let (_, plan) = full_plan(&profile, 15.0, 4, "chain");

        assert_eq!(plan.links[0].first, "v0");
        assert_eq!(plan.links[0].second, "v1");
        assert_eq!(plan.links[1].first, "x0");
        assert_eq!(plan.links[2].first, "x1");
        assert_eq!(plan.links[2].second, "v3");
    }

    #[test]
    fn test_finishing_applied_once_at_end() {
        let mut profile = ProfileRegistry::builtin(ContentType::Medium);
        profile.finishing = FinishingPass { vignette: true, grain: true, grain_strength: 12 };
        let (_, plan) = full_plan(&profile, 20.0, 3, "finish");

        let graph = plan.to_filter_complex();
        assert_eq!(graph.matches("vignette").count(), 1);
        assert!(graph.ends_with("[x1]vignette=PI/5,noise=alls=12:allf=t+u[vout]"));
        assert_eq!(plan.output_label, "vout");
    }

    #[test]
    fn test_mismatched_inputs_rejected() {
        let profile = ProfileRegistry::builtin(ContentType::Medium);
        let schedule = ScheduleBuilder::new(&profile).build(20.0, &images(3)).unwrap();
        let motion = MotionParameterGenerator::generate(&schedule, &profile, "m");

        let assembler = FiltergraphAssembler::new(&profile);
        assert!(assembler.assemble(&schedule, &motion, &["fade".to_string()]).is_err());
        assert!(assembler.assemble(&schedule, &motion[..1], &["fade".to_string(), "fade".to_string()]).is_err());
    }

    #[test]
    fn test_hard_cut_plan() {
        let frame = FrameSpec::new(1920, 1080, 30);
        let schedule = Schedule::hard_cut(9.0, &images(3)).unwrap();
        let plan = FiltergraphAssembler::assemble_hard_cut(frame, &schedule);

        let graph = plan.to_filter_complex();
        assert_eq!(plan.kind, PlanKind::HardCut);
        assert!(!graph.contains("xfade"));
        assert!(!graph.contains("zoompan"));
        assert!(graph.ends_with("[v0][v1][v2]concat=n=3:v=1:a=0[vcat]"));
        assert!(graph.contains("loop=loop=89:size=1:start=0"));
        assert_eq!(plan.output_label, "vcat");
    }

    proptest! {
        #[test]
        fn prop_plan_offsets_monotonic(
            target in 5.0f64..240.0,
            count in 1usize..25,
            seed in "[a-z0-9_]{1,16}",
        ) {
            let profile = ProfileRegistry::builtin(ContentType::Short);
            let (schedule, plan) = full_plan(&profile, target, count, &seed);
            let offsets = plan.offsets();

            prop_assert_eq!(offsets, schedule.transition_offsets());
            for pair in plan.offsets().windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
            for offset in plan.offsets() {
                prop_assert!(offset >= 0.0 && offset <= target);
            }
        }
    }
}
