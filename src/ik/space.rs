//! Reference frame conversions for IK inputs
//!
//! The solver works in component space. Effector locations arrive in world
//! space and joint targets can be authored relative to a bone.

use serde::{Deserialize, Serialize};

use super::pose::{BoneIndex, PoseSource};
use super::transform::BoneTransform;

/// Frame a configured location is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BoneControlSpace {
    World,
    #[default]
    Component,
    /// Relative to the parent of the named bone
    ParentBone,
    /// Relative to the named bone
    Bone,
}

impl BoneControlSpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoneControlSpace::World => "World",
            BoneControlSpace::Component => "Component",
            BoneControlSpace::ParentBone => "ParentBone",
            BoneControlSpace::Bone => "Bone",
        }
    }

    /// Whether this space needs a bone to be resolved
    pub fn uses_bone(&self) -> bool {
        matches!(self, BoneControlSpace::ParentBone | BoneControlSpace::Bone)
    }
}

/// Convert a transform from `space` into component space
///
/// Bone-relative spaces fall back to leaving the transform untouched when the
/// bone (or its parent) can't be found.
pub fn to_component_space<P: PoseSource + ?Sized>(
    pose: &P,
    transform: BoneTransform,
    space: BoneControlSpace,
    bone: Option<BoneIndex>,
) -> BoneTransform {
    match space {
        BoneControlSpace::World => pose.component_to_world().inverse().mul_transform(&transform),
        BoneControlSpace::Component => transform,
        BoneControlSpace::ParentBone => match bone
            .filter(|&b| pose.is_valid_index(b))
            .and_then(|b| pose.parent(b))
        {
            Some(parent) => pose.component_transform(parent).mul_transform(&transform),
            None => transform,
        },
        BoneControlSpace::Bone => match bone.filter(|&b| pose.is_valid_index(b)) {
            Some(b) => pose.component_transform(b).mul_transform(&transform),
            None => transform,
        },
    }
}

/// Convert a component-space transform into world space
pub fn component_to_world_space<P: PoseSource + ?Sized>(
    pose: &P,
    transform: BoneTransform,
) -> BoneTransform {
    pose.component_to_world().mul_transform(&transform)
}
