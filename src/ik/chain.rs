//! Limb chain inputs and solver outputs
//!
//! A limb is the upper bone (hip), lower bone (knee) and end bone (foot),
//! found by walking two parent links up from the end bone.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::pose::{BoneIndex, PoseSource};
use super::transform::BoneTransform;
use crate::consts::DEFAULT_STRETCH_LIMITS;
use crate::error::{IkError, Result};

/// One bone of the limb with its component-space transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimbBone {
    pub index: BoneIndex,
    pub transform: BoneTransform,
}

/// Snapshot of a limb taken at evaluation time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimbChain {
    pub upper: LimbBone,
    pub lower: LimbBone,
    pub end: LimbBone,
    /// Current distance from upper to lower bone
    pub upper_length: f32,
    /// Current distance from lower to end bone
    pub lower_length: f32,
}

impl LimbChain {
    /// Build the chain ending at `end_bone`
    ///
    /// Returns `None` when the end bone has fewer than two ancestors. Lengths
    /// come from the current local translations rather than the reference
    /// skeleton, so scaling applied by earlier controllers is respected.
    pub fn from_pose<P: PoseSource + ?Sized>(pose: &P, end_bone: BoneIndex) -> Option<Self> {
        if !pose.is_valid_index(end_bone) {
            return None;
        }
        let lower = pose.parent(end_bone)?;
        let upper = pose.parent(lower)?;

        let upper_length = pose.local_transform(lower).translation.length();
        let lower_length = pose.local_transform(end_bone).translation.length();

        Some(Self {
            upper: LimbBone {
                index: upper,
                transform: pose.component_transform(upper),
            },
            lower: LimbBone {
                index: lower,
                transform: pose.component_transform(lower),
            },
            end: LimbBone {
                index: end_bone,
                transform: pose.component_transform(end_bone),
            },
            upper_length,
            lower_length,
        })
    }

    /// Build a chain from bare positions (identity rotations)
    pub fn from_positions(root: Vec3, joint: Vec3, end: Vec3) -> Self {
        Self {
            upper: LimbBone {
                index: 0,
                transform: BoneTransform::from_translation(root),
            },
            lower: LimbBone {
                index: 1,
                transform: BoneTransform::from_translation(joint),
            },
            end: LimbBone {
                index: 2,
                transform: BoneTransform::from_translation(end),
            },
            upper_length: (joint - root).length(),
            lower_length: (end - joint).length(),
        }
    }

    #[inline]
    pub fn root_pos(&self) -> Vec3 {
        self.upper.transform.translation
    }

    #[inline]
    pub fn joint_pos(&self) -> Vec3 {
        self.lower.transform.translation
    }

    #[inline]
    pub fn end_pos(&self) -> Vec3 {
        self.end.transform.translation
    }

    #[inline]
    pub fn max_reach(&self) -> f32 {
        self.upper_length + self.lower_length
    }
}

/// Optional limb stretching toward distant targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StretchConfig {
    pub allow_stretch: bool,
    /// Reach-ratio range `(min, max)`; `max` is also the largest length multiplier
    pub stretch_limits: (f32, f32),
}

impl Default for StretchConfig {
    fn default() -> Self {
        Self {
            allow_stretch: false,
            stretch_limits: DEFAULT_STRETCH_LIMITS,
        }
    }
}

impl StretchConfig {
    pub fn new(allow_stretch: bool, min: f32, max: f32) -> Result<Self> {
        validate_stretch_limits(min, max)?;
        Ok(Self {
            allow_stretch,
            stretch_limits: (min, max),
        })
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

pub(crate) fn validate_stretch_limits(min: f32, max: f32) -> Result<()> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(IkError::InvalidStretchLimits { min, max });
    }
    Ok(())
}

/// Reach goal and bend hint, both in component space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkTarget {
    pub effector: Vec3,
    pub joint_target: Vec3,
}

impl IkTarget {
    pub fn new(effector: Vec3, joint_target: Vec3) -> Self {
        Self {
            effector,
            joint_target,
        }
    }
}

/// A solved bone placement in component space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneOutput {
    pub index: BoneIndex,
    pub transform: BoneTransform,
}

/// Solver output: upper, lower and end bone, always in that order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveResult {
    pub upper: BoneOutput,
    pub lower: BoneOutput,
    pub end: BoneOutput,
    /// Effective lengths after stretching
    pub upper_length: f32,
    pub lower_length: f32,
}

impl SolveResult {
    pub fn joint_pos(&self) -> Vec3 {
        self.lower.transform.translation
    }

    pub fn end_pos(&self) -> Vec3 {
        self.end.transform.translation
    }

    pub fn max_reach(&self) -> f32 {
        self.upper_length + self.lower_length
    }

    pub fn bones(&self) -> [BoneOutput; 3] {
        [self.upper, self.lower, self.end]
    }
}
