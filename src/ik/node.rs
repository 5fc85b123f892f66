//! Foot placement IK node
//!
//! Ties the effector tracker and the two-bone solver to a pose. The host
//! calls `update` once per tick and `evaluate` whenever it needs a pose;
//! evaluation always uses the most recent tracker state, however many
//! times it runs between updates.

use glam::Vec3;

use super::chain::{BoneOutput, IkTarget, LimbChain, StretchConfig};
use super::pose::{BoneIndex, PoseSource};
use super::probe::{ActorId, GroundProbe};
use super::solver::solve_two_bone;
use super::space::{BoneControlSpace, component_to_world_space, to_component_space};
use super::tracker::{BlendState, EffectorTracker};
use super::transform::BoneTransform;
use crate::error::{IkError, Result};
use crate::settings::{FootIkSettings, LiveTuning};

/// Per-tick input from the host
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateContext {
    /// Seconds since the previous update
    pub delta_time: f32,
    /// Actor owning the skeleton, ignored by ground probes
    pub owner: Option<ActorId>,
}

impl UpdateContext {
    pub fn new(delta_time: f32, owner: Option<ActorId>) -> Self {
        Self { delta_time, owner }
    }
}

/// A skeletal controller with a tick phase and an evaluation phase
pub trait SkeletalControl {
    /// Advance internal state once per tick
    fn update(&mut self, ctx: &UpdateContext, pose: &dyn PoseSource, ground: &dyn GroundProbe);

    /// Component-space bone transforms to blend in, parents first
    ///
    /// Empty when the controller can't run on this pose.
    fn evaluate(&mut self, pose: &dyn PoseSource) -> Vec<BoneOutput>;

    /// Weight the host should blend the evaluated transforms in with
    fn alpha(&self) -> f32;
}

/// Plants a foot on the ground with two-bone IK
#[derive(Debug, Clone)]
pub struct FootPlacementIk {
    settings: FootIkSettings,
    stretch: StretchConfig,
    tracker: EffectorTracker,
    ik_bone: Option<BoneIndex>,
    joint_target_bone: Option<BoneIndex>,
    warned_invalid_limb: bool,
}

impl FootPlacementIk {
    pub fn new(settings: FootIkSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            stretch: settings.stretch_config(),
            tracker: EffectorTracker::new(settings.tracker_config()),
            settings,
            ik_bone: None,
            joint_target_bone: None,
            warned_invalid_limb: false,
        })
    }

    pub fn settings(&self) -> &FootIkSettings {
        &self.settings
    }

    pub fn tracker(&self) -> &EffectorTracker {
        &self.tracker
    }

    pub fn blend_state(&self) -> BlendState {
        self.tracker.blend_state()
    }

    /// Tracked effector location in world space
    pub fn effector_location(&self) -> Vec3 {
        self.tracker.effector_location()
    }

    pub fn ik_bone(&self) -> Option<BoneIndex> {
        self.ik_bone
    }

    /// Resolve configured bone names against the skeleton
    ///
    /// An unknown IK bone leaves the node permanently invalid for this pose;
    /// it is logged and returned, but evaluation just becomes a no-op.
    pub fn initialize_bone_references(&mut self, pose: &dyn PoseSource) -> Result<()> {
        self.warned_invalid_limb = false;
        self.ik_bone = pose.bone_index(&self.settings.ik_bone);

        self.joint_target_bone = if self.settings.joint_target_space.uses_bone() {
            let bone = self
                .settings
                .joint_target_space_bone
                .as_deref()
                .and_then(|name| pose.bone_index(name));
            if bone.is_none() {
                log::warn!(
                    "joint target bone {:?} not found, using {} space untransformed",
                    self.settings.joint_target_space_bone,
                    self.settings.joint_target_space.as_str()
                );
            }
            bone
        } else {
            None
        };

        if self.ik_bone.is_none() {
            log::warn!(
                "IK bone '{}' not found in skeleton, foot placement disabled",
                self.settings.ik_bone
            );
            return Err(IkError::BoneNotFound {
                bone: self.settings.ik_bone.clone(),
            });
        }
        Ok(())
    }

    pub fn is_valid_to_evaluate(&self, pose: &dyn PoseSource) -> bool {
        self.ik_bone.is_some_and(|b| pose.is_valid_index(b))
    }

    /// Change blend time, hit offset and stretch limits without re-initializing
    pub fn apply_live_tuning(&mut self, tuning: &LiveTuning) -> Result<()> {
        self.settings.apply_live_tuning(tuning)?;
        self.stretch = self.settings.stretch_config();
        self.tracker.config = self.settings.tracker_config();
        Ok(())
    }

    /// Joint target resolved into component space
    fn joint_target(&self, pose: &dyn PoseSource) -> Vec3 {
        let local = BoneTransform::from_translation(self.settings.joint_target_location);
        to_component_space(
            pose,
            local,
            self.settings.joint_target_space,
            self.joint_target_bone,
        )
        .translation
    }
}

impl SkeletalControl for FootPlacementIk {
    fn update(&mut self, ctx: &UpdateContext, pose: &dyn PoseSource, ground: &dyn GroundProbe) {
        let Some(ik_bone) = self.ik_bone.filter(|&b| pose.is_valid_index(b)) else {
            return;
        };
        let end_cs = pose.component_transform(ik_bone);
        let end_world = component_to_world_space(pose, end_cs).translation;
        self.tracker.update(ctx.delta_time, end_world, ground, ctx.owner);
    }

    fn evaluate(&mut self, pose: &dyn PoseSource) -> Vec<BoneOutput> {
        if !self.is_valid_to_evaluate(pose) {
            return Vec::new();
        }
        let Some(chain) = self.ik_bone.and_then(|b| LimbChain::from_pose(pose, b)) else {
            if !self.warned_invalid_limb {
                log::warn!(
                    "IK bone '{}' needs two parent bones, skipping foot placement",
                    self.settings.ik_bone
                );
                self.warned_invalid_limb = true;
            }
            return Vec::new();
        };

        let effector = to_component_space(
            pose,
            BoneTransform::from_translation(self.tracker.effector_location()),
            BoneControlSpace::World,
            None,
        )
        .translation;
        let target = IkTarget::new(effector, self.joint_target(pose));

        solve_two_bone(&chain, &target, &self.stretch).bones().to_vec()
    }

    fn alpha(&self) -> f32 {
        self.tracker.alpha()
    }
}
