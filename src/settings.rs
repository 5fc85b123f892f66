//! Foot placement node settings
//!
//! Authored as data (JSON) and loaded once per node instance. The blend time,
//! hit offset and stretch limits can also be changed live through
//! `LiveTuning`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_BLEND_TIME, DEFAULT_STRETCH_LIMITS};
use crate::error::{IkError, Result};
use crate::ik::chain::{StretchConfig, validate_stretch_limits};
use crate::ik::space::BoneControlSpace;
use crate::ik::tracker::TrackerConfig;

/// Configuration of a foot placement IK node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootIkSettings {
    /// End bone of the limb (the foot)
    pub ik_bone: String,

    // === Joint target ===
    /// Location the knee bends toward
    pub joint_target_location: Vec3,
    /// Frame `joint_target_location` is expressed in
    pub joint_target_space: BoneControlSpace,
    /// Bone for the `Bone` / `ParentBone` spaces
    pub joint_target_space_bone: Option<String>,

    // === Reach ===
    /// Let the limb stretch toward targets beyond its length
    pub allow_stretching: bool,
    /// Stretch range `[min, max]` as multiples of the limb's full reach
    pub stretch_limits: [f32; 2],

    // === Ground tracking ===
    /// Vertical offset applied to the ground hit
    pub hit_z_offset: f32,
    /// Seconds to blend the node in or out
    pub blend_time: f32,
}

impl Default for FootIkSettings {
    fn default() -> Self {
        Self {
            ik_bone: String::new(),

            joint_target_location: Vec3::ZERO,
            joint_target_space: BoneControlSpace::Component,
            joint_target_space_bone: None,

            allow_stretching: false,
            stretch_limits: [DEFAULT_STRETCH_LIMITS.0, DEFAULT_STRETCH_LIMITS.1],

            hit_z_offset: 0.0,
            blend_time: DEFAULT_BLEND_TIME,
        }
    }
}

impl FootIkSettings {
    /// Settings for a foot bone with everything else at defaults
    pub fn for_bone(ik_bone: impl Into<String>) -> Self {
        Self {
            ik_bone: ik_bone.into(),
            ..Self::default()
        }
    }

    pub fn with_joint_target(
        mut self,
        location: Vec3,
        space: BoneControlSpace,
        bone: Option<String>,
    ) -> Self {
        self.joint_target_location = location;
        self.joint_target_space = space;
        self.joint_target_space_bone = bone;
        self
    }

    pub fn with_stretching(mut self, min: f32, max: f32) -> Self {
        self.allow_stretching = true;
        self.stretch_limits = [min, max];
        self
    }

    pub fn with_hit_z_offset(mut self, offset: f32) -> Self {
        self.hit_z_offset = offset;
        self
    }

    pub fn with_blend_time(mut self, blend_time: f32) -> Self {
        self.blend_time = blend_time;
        self
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        validate_stretch_limits(self.stretch_limits[0], self.stretch_limits[1])?;
        validate_blend_time(self.blend_time)
    }

    pub fn stretch_config(&self) -> StretchConfig {
        StretchConfig {
            allow_stretch: self.allow_stretching,
            stretch_limits: (self.stretch_limits[0], self.stretch_limits[1]),
        }
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            blend_time: self.blend_time,
            hit_z_offset: self.hit_z_offset,
            allow_stretch: self.allow_stretching,
        }
    }

    pub fn live_tuning(&self) -> LiveTuning {
        LiveTuning {
            hit_z_offset: self.hit_z_offset,
            blend_time: self.blend_time,
            stretch_limits: self.stretch_limits,
        }
    }

    /// Apply a live edit after validating it; on error nothing changes
    pub fn apply_live_tuning(&mut self, tuning: &LiveTuning) -> Result<()> {
        tuning.validate()?;
        self.hit_z_offset = tuning.hit_z_offset;
        self.blend_time = tuning.blend_time;
        self.stretch_limits = tuning.stretch_limits;
        Ok(())
    }
}

/// Settings that may be edited while the node is running
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveTuning {
    pub hit_z_offset: f32,
    pub blend_time: f32,
    pub stretch_limits: [f32; 2],
}

impl LiveTuning {
    pub fn validate(&self) -> Result<()> {
        validate_stretch_limits(self.stretch_limits[0], self.stretch_limits[1])?;
        validate_blend_time(self.blend_time)
    }
}

fn validate_blend_time(blend_time: f32) -> Result<()> {
    if !blend_time.is_finite() || blend_time < 0.0 {
        return Err(IkError::InvalidBlendTime(blend_time));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = FootIkSettings::default();
        assert_eq!(settings.blend_time, 0.2);
        assert_eq!(settings.hit_z_offset, 0.0);
        assert!(!settings.allow_stretching);
        assert_eq!(settings.joint_target_space, BoneControlSpace::Component);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let json = r#"{
            "ik_bone": "foot_l",
            "joint_target_location": [0.0, 50.0, 0.0],
            "joint_target_space": "Bone",
            "joint_target_space_bone": "calf_l",
            "hit_z_offset": 2.5
        }"#;
        let settings = FootIkSettings::from_json(json).unwrap();
        assert_eq!(settings.ik_bone, "foot_l");
        assert_eq!(settings.joint_target_location, Vec3::new(0.0, 50.0, 0.0));
        assert_eq!(settings.joint_target_space, BoneControlSpace::Bone);
        assert_eq!(settings.joint_target_space_bone.as_deref(), Some("calf_l"));
        assert_eq!(settings.hit_z_offset, 2.5);
        // Unspecified fields fall back to defaults
        assert_eq!(settings.blend_time, 0.2);
    }

    #[test]
    fn test_json_round_trip() {
        let settings = FootIkSettings::for_bone("foot_r")
            .with_stretching(1.0, 1.3)
            .with_blend_time(0.35);
        let json = settings.to_json().unwrap();
        assert_eq!(FootIkSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(matches!(
            FootIkSettings::from_json(r#"{ "stretch_limits": [1.5, 1.0] }"#),
            Err(IkError::InvalidStretchLimits { .. })
        ));
        assert!(matches!(
            FootIkSettings::from_json(r#"{ "blend_time": -1.0 }"#),
            Err(IkError::InvalidBlendTime(_))
        ));
        assert!(matches!(
            FootIkSettings::from_json("not json"),
            Err(IkError::Settings(_))
        ));
    }

    #[test]
    fn test_live_tuning_is_atomic() {
        let mut settings = FootIkSettings::for_bone("foot");
        let bad = LiveTuning {
            hit_z_offset: 9.0,
            blend_time: 0.5,
            stretch_limits: [2.0, 1.0],
        };
        assert!(settings.apply_live_tuning(&bad).is_err());
        assert_eq!(settings.hit_z_offset, 0.0);

        let good = LiveTuning {
            stretch_limits: [1.0, 1.1],
            ..bad
        };
        settings.apply_live_tuning(&good).unwrap();
        assert_eq!(settings.live_tuning(), good);
        assert_eq!(settings.tracker_config().hit_z_offset, 9.0);
        assert_eq!(settings.stretch_config().stretch_limits, (1.0, 1.1));
    }
}
