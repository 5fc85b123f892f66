//! Foot placement IK
//!
//! Everything here is deterministic and free of engine dependencies:
//! - Poses are read through `PoseSource`
//! - The ground is queried through `GroundProbe`
//! - Time only advances through the delta passed to `update`

pub mod blend;
pub mod chain;
pub mod node;
pub mod pose;
pub mod probe;
pub mod solver;
pub mod space;
pub mod tracker;
pub mod transform;

pub use blend::apply_bone_outputs;
pub use chain::{BoneOutput, IkTarget, LimbBone, LimbChain, SolveResult, StretchConfig};
pub use node::{FootPlacementIk, SkeletalControl, UpdateContext};
pub use pose::{Bone, BoneIndex, Pose, PoseSource};
pub use probe::{ActorId, FlatGround, GroundProbe, HeightField, NoGround, ProbeHit};
pub use solver::{BendPlane, delta_rotation, solve_positions, solve_two_bone, stretched_lengths};
pub use space::{BoneControlSpace, component_to_world_space, to_component_space};
pub use tracker::{BlendState, EffectorSample, EffectorTracker, TrackerConfig};
pub use transform::BoneTransform;
