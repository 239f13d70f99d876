use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::{
    error::{Result, TransitionError},
    profile::{ContentProfile, UNIVERSAL_TRANSITION},
    schedule::{DeterministicStream, Schedule},
};

/// Transition identifiers a renderer build supports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionSet {
    names: BTreeSet<String>,
}

impl TransitionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Order-preserving intersection with a configured vocabulary
    pub fn filter(&self, vocabulary: &[String]) -> Vec<String> {
        vocabulary
            .iter()
            .filter(|name| self.contains(name))
            .cloned()
            .collect()
    }

    /// True when a profile has at least one transition this build can run
    pub fn has_usable(&self, profile: &ContentProfile) -> bool {
        !self.filter(&profile.transitions).is_empty() || self.contains(UNIVERSAL_TRANSITION)
    }
}

impl<S: Into<String>> FromIterator<S> for TransitionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Assigns a transition to every slot boundary
pub struct TransitionSelector;

impl TransitionSelector {
    /// Capability-filtered vocabulary for a profile.
    ///
    /// Falls back to the universal fade when nothing configured is supported.
    /// An empty capability set means the probe knew nothing, so the fade is
    /// assumed; a non-empty set without the fade is a hard mismatch.
    pub fn vocabulary(profile: &ContentProfile, supported: &TransitionSet) -> Result<Vec<String>> {
        let filtered = supported.filter(&profile.transitions);
        if !filtered.is_empty() {
            return Ok(filtered);
        }

        if supported.is_empty() || supported.contains(UNIVERSAL_TRANSITION) {
            warn!(
                "No configured {} transition is supported, using '{}'",
                profile.content_type, UNIVERSAL_TRANSITION
            );
            return Ok(vec![UNIVERSAL_TRANSITION.to_string()]);
        }

        Err(TransitionError::NoTransitionAvailable {
            requested: profile.transitions.clone(),
        }
        .into())
    }

    /// One transition per boundary (`schedule.len() - 1` entries)
    pub fn select(
        schedule: &Schedule,
        supported: &TransitionSet,
        profile: &ContentProfile,
        seed: &str,
    ) -> Result<Vec<String>> {
        let boundaries = schedule.transition_count();
        if boundaries == 0 {
            return Ok(Vec::new());
        }

        let vocabulary = Self::vocabulary(profile, supported)?;
        let draws = DeterministicStream::draws(seed, schedule.len());

        let chosen: Vec<String> = draws
            .iter()
            .take(boundaries)
            .map(|draw| vocabulary[draw.transition as usize % vocabulary.len()].clone())
            .collect();

        debug!("Selected transitions: {:?}", chosen);
        Ok(chosen)
    }
}
