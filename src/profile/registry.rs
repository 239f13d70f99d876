use std::collections::HashMap;

use crate::profile::{
    ContentProfile, ContentType, FinishingPass, FrameSpec, MotionSettings, StillRange,
};

/// Registry resolving a [`ContentProfile`] for each content type
///
/// Built-in profiles are registered on construction; profiles loaded from
/// configuration replace the built-in entry for the same content type.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: HashMap<ContentType, ContentProfile>,
}

impl ProfileRegistry {
    /// Create a registry with all built-in profiles
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for content_type in ContentType::ALL {
            registry.register(Self::builtin(content_type));
        }
        registry
    }

    /// Create a registry without any profile
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// Built-in defaults for a content type
    pub fn builtin(content_type: ContentType) -> ContentProfile {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        match content_type {
            ContentType::Long => ContentProfile {
                content_type,
                transitions: names(&["fade", "dissolve", "smoothleft", "smoothright", "circleopen"]),
                transition_duration: 1.0,
                still_duration: StillRange { min: 5.0, max: 12.0 },
                motion: MotionSettings {
                    max_zoom: 1.2,
                    zoom_per_frame: 0.0008,
                    pan_enabled: true,
                    pan_speed: 0.6,
                },
                frame: content_type.default_frame(),
                finishing: FinishingPass {
                    vignette: true,
                    grain: false,
                    grain_strength: 8,
                },
            },
            ContentType::Medium => ContentProfile {
                content_type,
                transitions: names(&["fade", "wipeleft", "wiperight", "slideleft", "dissolve"]),
                transition_duration: 0.8,
                still_duration: StillRange { min: 4.0, max: 8.0 },
                motion: MotionSettings {
                    max_zoom: 1.25,
                    zoom_per_frame: 0.0012,
                    pan_enabled: true,
                    pan_speed: 0.8,
                },
                frame: content_type.default_frame(),
                finishing: FinishingPass::default(),
            },
            ContentType::Short => ContentProfile {
                content_type,
                transitions: names(&["fade", "slideup", "slidedown", "circleopen", "radial"]),
                transition_duration: 0.5,
                still_duration: StillRange { min: 2.5, max: 5.0 },
                motion: MotionSettings {
                    max_zoom: 1.3,
                    zoom_per_frame: 0.0015,
                    pan_enabled: true,
                    pan_speed: 1.0,
                },
                frame: content_type.default_frame(),
                finishing: FinishingPass::default(),
            },
            ContentType::Reels => ContentProfile {
                content_type,
                transitions: names(&["fade", "zoomin", "slideup", "pixelize", "fadeblack"]),
                transition_duration: 0.4,
                still_duration: StillRange { min: 1.5, max: 4.0 },
                motion: MotionSettings {
                    max_zoom: 1.35,
                    zoom_per_frame: 0.002,
                    pan_enabled: true,
                    pan_speed: 1.2,
                },
                frame: FrameSpec::new(1080, 1920, 30),
                finishing: FinishingPass {
                    vignette: false,
                    grain: true,
                    grain_strength: 10,
                },
            },
        }
    }

    /// Register a profile, replacing any existing one for its content type
    pub fn register(&mut self, profile: ContentProfile) {
        self.profiles.insert(profile.content_type, profile);
    }

    /// Get a copy of the profile for a content type
    pub fn get(&self, content_type: ContentType) -> Option<ContentProfile> {
        self.profiles.get(&content_type).cloned()
    }

    /// Check if a profile is available
    pub fn has_profile(&self, content_type: ContentType) -> bool {
        self.profiles.contains_key(&content_type)
    }

    /// Get all registered content types, in declaration order
    pub fn available(&self) -> Vec<ContentType> {
        let mut types: Vec<ContentType> = self.profiles.keys().copied().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_available() {
        let registry = ProfileRegistry::new();

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.available(), ContentType::ALL.to_vec());
    }

    #[test]
    fn test_builtin_profiles_are_valid() {
        for content_type in ContentType::ALL {
            let profile = ProfileRegistry::builtin(content_type);
            assert!(profile.validate().is_ok(), "{} profile invalid", content_type);
            assert!(profile.transitions.contains(&"fade".to_string()));
        }
    }

    #[test]
    fn test_portrait_variants() {
        let reels = ProfileRegistry::builtin(ContentType::Reels);
        assert_eq!(reels.frame.dimensions(), (1080, 1920));

        let long = ProfileRegistry::builtin(ContentType::Long);
        assert_eq!(long.frame.dimensions(), (1920, 1080));
    }

    #[test]
    fn test_register_overrides_builtin() {
        let mut registry = ProfileRegistry::new();
        let mut custom = ProfileRegistry::builtin(ContentType::Short);
        custom.transition_duration = 0.3;
        registry.register(custom);

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get(ContentType::Short).unwrap().transition_duration, 0.3);
    }

    #[test]
    fn test_empty_registry_misses() {
        let registry = ProfileRegistry::empty();
        assert!(registry.get(ContentType::Long).is_none());
        assert!(registry.is_empty());
    }
}
