use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    error::{CompositorError, Result},
    profile::ContentProfile,
};

/// Tolerance for the duration conservation invariant (seconds)
pub const DURATION_EPSILON: f64 = 0.01;

/// One still image's timed appearance in the output sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// Render order (0-based)
    pub index: usize,

    /// Position of the source in the caller's image list
    pub image_index: usize,

    /// Source image reference, owned by the caller
    pub source: PathBuf,

    /// Display time in seconds, including the overlap with its neighbours
    pub duration: f64,
}

/// Complete ordered timing plan for all slots and transitions
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    slots: Vec<Slot>,
    target_duration: f64,
    transition_duration: f64,
    shortfall: Option<f64>,
}

impl Schedule {
    fn new(
        sources: &[PathBuf],
        durations: Vec<f64>,
        target_duration: f64,
        transition_duration: f64,
        shortfall: Option<f64>,
    ) -> Self {
        let slots = durations
            .into_iter()
            .enumerate()
            .map(|(index, duration)| {
                // Round-robin from the first image
                let image_index = index % sources.len();
                Slot {
                    index,
                    image_index,
                    source: sources[image_index].clone(),
                    duration,
                }
            })
            .collect();

        Self {
            slots,
            target_duration,
            transition_duration,
            shortfall,
        }
    }

    /// Minimal hard-cut schedule: no transitions, target split evenly over
    /// one slot per image
    pub fn hard_cut(target_duration: f64, sources: &[PathBuf]) -> Result<Self> {
        check_inputs(target_duration, sources)?;

        let durations = even_durations(target_duration, sources.len());
        Ok(Self::new(sources, durations, target_duration, 0.0, None))
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn target_duration(&self) -> f64 {
        self.target_duration
    }

    /// Cross-fade length applied at every slot boundary
    pub fn transition_duration(&self) -> f64 {
        self.transition_duration
    }

    /// Number of slot boundaries
    pub fn transition_count(&self) -> usize {
        self.slots.len().saturating_sub(1)
    }

    /// Run time of the chained output: slot time minus overlapped time
    pub fn rendered_duration(&self) -> f64 {
        let slot_total: f64 = self.slots.iter().map(|s| s.duration).sum();
        slot_total - self.transition_duration * self.transition_count() as f64
    }

    /// Seconds by which the schedule runs short of its target, when every
    /// slot had to be capped at the still maximum
    pub fn shortfall(&self) -> Option<f64> {
        self.shortfall
    }

    /// Number of distinct source images in use
    pub fn distinct_images(&self) -> usize {
        let mut used: Vec<usize> = self.slots.iter().map(|s| s.image_index).collect();
        used.sort_unstable();
        used.dedup();
        used.len()
    }

    /// Absolute start of each cross-fade, in slot order.
    ///
    /// Boundary `i` begins where slot `i`'s tail starts overlapping slot
    /// `i + 1`'s head: the sum of slot durations up to and including `i`
    /// minus `i + 1` transitions.
    pub fn transition_offsets(&self) -> Vec<f64> {
        let mut offsets = Vec::with_capacity(self.transition_count());
        let mut slot_start = 0.0;

        for slot in self.slots.iter().take(self.transition_count()) {
            let offset = slot_start + slot.duration - self.transition_duration;
            offsets.push(offset);
            slot_start = offset;
        }

        offsets
    }
}

/// Fits image display time against a target duration
pub struct ScheduleBuilder<'a> {
    profile: &'a ContentProfile,
    cycle_images: bool,
}

impl<'a> ScheduleBuilder<'a> {
    pub fn new(profile: &'a ContentProfile) -> Self {
        Self {
            profile,
            cycle_images: false,
        }
    }

    /// Repeat images round-robin when the target cannot be covered without
    /// exceeding the still maximum
    pub fn cycle_images(mut self, enabled: bool) -> Self {
        self.cycle_images = enabled;
        self
    }

    /// Build a schedule using up to one slot per image.
    ///
    /// Fails with an infeasible-schedule error when the profile is invalid,
    /// no image is given, the target is not positive, or not even a single
    /// slot of at least the still minimum fits.
    pub fn build(&self, target_duration: f64, images: &[PathBuf]) -> Result<Schedule> {
        self.profile.validate().map_err(|e| {
            CompositorError::infeasible(format!("unusable {} profile: {}", self.profile.content_type, e))
        })?;
        check_inputs(target_duration, images)?;

        let transition = self.profile.transition_duration;
        let range = self.profile.still_duration;

        let mut slot_count = images.len();
        if self.cycle_images && range.max > transition {
            let needed = ((target_duration - transition) / (range.max - transition)).ceil();
            slot_count = slot_count.max(needed.max(1.0) as usize);
        }

        debug!(
            "Fitting {:.3}s over {} slots ({} images, {:.2}s transitions, stills {:.2}-{:.2}s)",
            target_duration, slot_count, images.len(), transition, range.min, range.max
        );

        loop {
            if slot_count == 1 {
                if range.min > target_duration {
                    return Err(CompositorError::infeasible(format!(
                        "target {:.3}s is shorter than the minimum still duration {:.3}s",
                        target_duration, range.min
                    )));
                }
                info!("Single slot spanning {:.3}s", target_duration);
                return Ok(Schedule::new(
                    images,
                    vec![round_ms(target_duration)],
                    target_duration,
                    transition,
                    None,
                ));
            }

            let overlap = transition * (slot_count - 1) as f64;
            let per_slot = (target_duration + overlap) / slot_count as f64;

            if per_slot + 1e-9 < range.min {
                debug!(
                    "{:.3}s per slot is below minimum {:.3}s, dropping to {} slots",
                    per_slot, range.min, slot_count - 1
                );
                slot_count -= 1;
                continue;
            }

            if per_slot > range.max {
                let rendered = range.max * slot_count as f64 - overlap;
                let shortfall = target_duration - rendered;
                warn!(
                    "Capping {} slots at {:.3}s; output runs {:.3}s short of the {:.3}s target",
                    slot_count, range.max, shortfall, target_duration
                );
                let shortfall = (shortfall > DURATION_EPSILON).then_some(shortfall);
                return Ok(Schedule::new(
                    images,
                    vec![range.max; slot_count],
                    target_duration,
                    transition,
                    shortfall,
                ));
            }

            // Millisecond rounding can only leave the range for bounds finer than 1ms
            let durations = even_durations(target_duration + overlap, slot_count)
                .into_iter()
                .map(|d| d.clamp(range.min, range.max))
                .collect();
            info!("Scheduled {} slots of ~{:.3}s", slot_count, per_slot);
            return Ok(Schedule::new(images, durations, target_duration, transition, None));
        }
    }
}

fn check_inputs(target_duration: f64, images: &[PathBuf]) -> Result<()> {
    if images.is_empty() {
        return Err(CompositorError::infeasible("no images to schedule"));
    }
    if !(target_duration > 0.0 && target_duration.is_finite()) {
        return Err(CompositorError::infeasible(format!(
            "target duration must be positive, got {}",
            target_duration
        )));
    }
    Ok(())
}

/// Split `total` into `count` millisecond-precise parts that differ by at
/// most 1ms; the remainder milliseconds land on the final parts.
fn even_durations(total: f64, count: usize) -> Vec<f64> {
    let total_ms = (total * 1000.0).round() as u64;
    let base = total_ms / count as u64;
    let extra = (total_ms % count as u64) as usize;

    (0..count)
        .map(|i| {
            let ms = if i >= count - extra { base + 1 } else { base };
            ms as f64 / 1000.0
        })
        .collect()
}

fn round_ms(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Seed for the deterministic stream: the output artifact's file stem
pub fn seed_from_output(output: &Path) -> String {
    output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| output.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ContentType, ProfileRegistry, StillRange};
    use proptest::prelude::*;

    fn images(count: usize) -> Vec<PathBuf> {
        (0..count).map(|i| PathBuf::from(format!("img_{:02}.jpg", i))).collect()
    }

    fn profile(min: f64, max: f64, transition: f64) -> ContentProfile {
        let mut profile = ProfileRegistry::builtin(ContentType::Medium);
        profile.still_duration = StillRange { min, max };
        profile.transition_duration = transition;
        profile
    }

    #[test]
    fn test_two_images_overlap() {
        let profile = profile(4.0, 8.0, 0.8);
        let schedule = ScheduleBuilder::new(&profile).build(10.0, &images(2)).unwrap();

        let durations: Vec<f64> = schedule.slots().iter().map(|s| s.duration).collect();
        assert_eq!(durations, vec![5.4, 5.4]);
        assert!((schedule.rendered_duration() - 10.0).abs() < DURATION_EPSILON);

        let offsets = schedule.transition_offsets();
        assert_eq!(offsets.len(), 1);
        assert!((offsets[0] - 4.6).abs() < 1e-9);
    }

    #[test]
    fn test_single_image_spans_target() {
        let profile = profile(4.0, 8.0, 0.8);
        let schedule = ScheduleBuilder::new(&profile).build(30.0, &images(1)).unwrap();

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.slots()[0].duration, 30.0);
        assert_eq!(schedule.transition_count(), 0);
        assert!(schedule.transition_offsets().is_empty());
    }

    #[test]
    fn test_infeasible_inputs() {
        let profile = profile(4.0, 8.0, 0.8);
        let builder = ScheduleBuilder::new(&profile);

        assert!(builder.build(10.0, &[]).is_err());
        assert!(builder.build(0.0, &images(3)).is_err());
        assert!(builder.build(-1.0, &images(3)).is_err());
        assert!(builder.build(f64::NAN, &images(3)).is_err());
        assert!(builder.build(3.0, &images(3)).is_err());
    }

    #[test]
    fn test_too_many_images_reduces_slots() {
        let profile = profile(4.0, 8.0, 0.8);
        let schedule = ScheduleBuilder::new(&profile).build(10.0, &images(6)).unwrap();

        assert_eq!(schedule.len(), 2);
        let used: Vec<usize> = schedule.slots().iter().map(|s| s.image_index).collect();
        assert_eq!(used, vec![0, 1]);
        assert!(schedule.slots().iter().all(|s| s.duration >= 4.0));
    }

    #[test]
    fn test_capped_at_max_runs_short() {
        let profile = profile(4.0, 8.0, 0.8);
        let schedule = ScheduleBuilder::new(&profile).build(60.0, &images(3)).unwrap();

        assert!(schedule.slots().iter().all(|s| s.duration == 8.0));
        let shortfall = schedule.shortfall().expect("shortfall must be flagged");
        assert!((schedule.rendered_duration() + shortfall - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_cycling_fills_target() {
        let profile = profile(4.0, 8.0, 0.8);
        let schedule = ScheduleBuilder::new(&profile)
            .cycle_images(true)
            .build(60.0, &images(3))
            .unwrap();

        assert!(schedule.shortfall().is_none());
        assert!(schedule.len() > 3);
        assert_eq!(schedule.distinct_images(), 3);
        let used: Vec<usize> = schedule.slots().iter().map(|s| s.image_index).take(5).collect();
        assert_eq!(used, vec![0, 1, 2, 0, 1]);
        assert!((schedule.rendered_duration() - 60.0).abs() < DURATION_EPSILON);
    }

    #[test]
    fn test_remainder_lands_on_final_slot() {
        let profile = profile(2.0, 8.0, 0.5);
        let schedule = ScheduleBuilder::new(&profile).build(10.0, &images(3)).unwrap();

        let durations: Vec<f64> = schedule.slots().iter().map(|s| s.duration).collect();
        assert_eq!(durations, vec![3.666, 3.667, 3.667]);
        assert!((schedule.rendered_duration() - 10.0).abs() < DURATION_EPSILON);
    }

    #[test]
    fn test_rounding_stays_inside_still_range() {
        let profile = profile(4.0005, 8.0, 0.5);
        let schedule = ScheduleBuilder::new(&profile).build(35.506, &images(10)).unwrap();

        assert_eq!(schedule.len(), 10);
        for slot in schedule.slots() {
            assert!(slot.duration >= 4.0005 && slot.duration <= 8.0, "slot {:?}", slot);
        }
        assert!((schedule.rendered_duration() - 35.506).abs() < DURATION_EPSILON);
    }

    #[test]
    fn test_transition_longer_than_still_is_rejected() {
        // Slots would be shorter than their cross-fades
        let profile = profile(0.5, 8.0, 1.0);
        let err = ScheduleBuilder::new(&profile).build(0.9, &images(2)).unwrap_err();
        assert!(matches!(err, CompositorError::Schedule(_)));
    }

    #[test]
    fn test_cycling_with_degenerate_range_does_not_explode() {
        let profile = profile(1.0, 1.0, 1.0);
        let result = ScheduleBuilder::new(&profile).cycle_images(true).build(10.0, &images(2));
        assert!(matches!(result, Err(CompositorError::Schedule(_))));
    }

    #[test]
    fn test_hard_cut_even_division() {
        let schedule = Schedule::hard_cut(10.0, &images(3)).unwrap();

        assert_eq!(schedule.transition_duration(), 0.0);
        let offsets = schedule.transition_offsets();
        assert_eq!(offsets.len(), 2);
        assert!((offsets[0] - 3.333).abs() < 1e-9);
        assert!((offsets[1] - 6.666).abs() < 1e-9);
        assert!((schedule.rendered_duration() - 10.0).abs() < DURATION_EPSILON);
    }

    #[test]
    fn test_seed_from_output_uses_stem() {
        assert_eq!(seed_from_output(Path::new("/tmp/out/trip_reels.mp4")), "trip_reels");
    }

    proptest! {
        #[test]
        fn prop_duration_conservation(
            target in 1.0f64..600.0,
            count in 1usize..40,
            min_ms in 1000u32..6000,
            spread_ms in 0u32..10000,
            fade_ratio in 0.05f64..0.9,
            cycle in any::<bool>(),
        ) {
            let min = min_ms as f64 / 1000.0;
            let max = (min_ms + spread_ms) as f64 / 1000.0;
            let transition = round_ms(min * fade_ratio).max(0.001);
            let profile = profile(min, max, transition);
            let result = ScheduleBuilder::new(&profile).cycle_images(cycle).build(target, &images(count));

            match result {
                Ok(schedule) => {
                    let rendered = schedule.rendered_duration();
                    match schedule.shortfall() {
                        None => prop_assert!((rendered - target).abs() <= DURATION_EPSILON),
                        Some(short) => prop_assert!((rendered + short - target).abs() <= DURATION_EPSILON),
                    }
                    if schedule.len() > 1 {
                        for slot in schedule.slots() {
                            prop_assert!(slot.duration >= min && slot.duration <= max, "slot {:?}", slot);
                        }
                    }
                }
                Err(_) => prop_assert!(target < min),
            }
        }

        #[test]
        fn prop_any_positive_profile_yields_sane_offsets(
            target in 0.01f64..120.0,
            count in 1usize..12,
            min in 0.01f64..6.0,
            spread in 0.0f64..6.0,
            transition in 0.01f64..8.0,
            cycle in any::<bool>(),
        ) {
            let profile = profile(min, min + spread, transition);
            let result = ScheduleBuilder::new(&profile).cycle_images(cycle).build(target, &images(count));

            if let Ok(schedule) = result {
                let offsets = schedule.transition_offsets();
                for offset in &offsets {
                    prop_assert!(*offset >= 0.0);
                }
                for pair in offsets.windows(2) {
                    prop_assert!(pair[0] <= pair[1]);
                }
            }
        }

        #[test]
        fn prop_offsets_monotonic_within_target(
            target in 5.0f64..300.0,
            count in 1usize..30,
        ) {
            let profile = profile(2.0, 9.0, 0.7);
            let schedule = ScheduleBuilder::new(&profile).build(target, &images(count)).unwrap();
            let offsets = schedule.transition_offsets();

            prop_assert_eq!(offsets.len(), schedule.transition_count());
            for pair in offsets.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
            for offset in offsets {
                prop_assert!(offset > 0.0 && offset < target);
            }
        }
    }
}
