use tracing::{debug, warn};

use crate::{
    error::RenderError,
    plan::CompositionPlan,
};

/// Relative duration drift tolerated from muxing and frame rounding
pub const DURATION_TOLERANCE: f64 = 0.05;

/// Measured properties of a rendered artifact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaProperties {
    pub width: u32,
    pub height: u32,
    pub duration: f64,
}

/// Outcome of comparing an artifact with its plan
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub passed: bool,
    pub observed_dimensions: (u32, u32),
    pub observed_duration: f64,

    /// Reasons for a failure, empty on success
    pub problems: Vec<String>,
}

impl ValidationResult {
    /// Convert a failure into the error routed to the fallback controller
    pub fn into_error(self) -> Option<RenderError> {
        (!self.passed).then(|| RenderError::ValidationMismatch {
            details: self.problems.join("; "),
        })
    }
}

/// Checks a rendered artifact against the plan it was rendered from
pub struct OutputValidator;

impl OutputValidator {
    pub fn validate(
        plan: &CompositionPlan,
        observed_dimensions: (u32, u32),
        observed_duration: f64,
    ) -> ValidationResult {
        let mut problems = Vec::new();
        let expected = plan.frame.dimensions();

        if observed_dimensions != expected {
            problems.push(format!(
                "dimensions {}x{} != planned {}x{}",
                observed_dimensions.0, observed_dimensions.1, expected.0, expected.1
            ));
        }

        if !(observed_duration.is_finite() && observed_duration > 0.0) {
            // Unreadable or empty stream, never a tolerance case
            problems.push(format!("unusable duration {}", observed_duration));
        } else {
            let drift = (observed_duration - plan.total_duration).abs() / plan.total_duration;
            if drift > DURATION_TOLERANCE {
                problems.push(format!(
                    "duration {:.3}s drifts {:.1}% from planned {:.3}s",
                    observed_duration,
                    drift * 100.0,
                    plan.total_duration
                ));
            }
        }

        let passed = problems.is_empty();
        if passed {
            debug!(
                "Output validated: {}x{} {:.3}s",
                observed_dimensions.0, observed_dimensions.1, observed_duration
            );
        } else {
            warn!("Output validation failed: {}", problems.join("; "));
        }

        ValidationResult {
            passed,
            observed_dimensions,
            observed_duration,
            problems,
        }
    }

    pub fn validate_properties(plan: &CompositionPlan, observed: &MediaProperties) -> ValidationResult {
        Self::validate(plan, (observed.width, observed.height), observed.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::FiltergraphAssembler;
    use crate::profile::FrameSpec;
    use crate::schedule::Schedule;
    use std::path::PathBuf;

    fn plan(duration: f64) -> CompositionPlan {
        let images = vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")];
        let schedule = Schedule::hard_cut(duration, &images).unwrap();
        FiltergraphAssembler::assemble_hard_cut(FrameSpec::new(1920, 1080, 30), &schedule)
    }

    #[test]
    fn test_exact_match_passes() {
        let result = OutputValidator::validate(&plan(10.0), (1920, 1080), 10.0);
        assert!(result.passed);
        assert!(result.into_error().is_none());
    }

    #[test]
    fn test_duration_within_five_percent() {
        assert!(OutputValidator::validate(&plan(10.0), (1920, 1080), 10.45).passed);
        assert!(OutputValidator::validate(&plan(10.0), (1920, 1080), 9.55).passed);
        assert!(!OutputValidator::validate(&plan(10.0), (1920, 1080), 10.6).passed);
    }

    #[test]
    fn test_rotated_dimensions_fail() {
        let result = OutputValidator::validate(&plan(10.0), (1080, 1920), 10.0);
        assert!(!result.passed);
        assert_eq!(result.observed_dimensions, (1080, 1920));
        assert!(matches!(result.into_error(), Some(RenderError::ValidationMismatch { .. })));
    }

    #[test]
    fn test_zero_or_nan_duration_is_hard_failure() {
        assert!(!OutputValidator::validate(&plan(10.0), (1920, 1080), 0.0).passed);
        assert!(!OutputValidator::validate(&plan(10.0), (1920, 1080), f64::NAN).passed);
    }
}
