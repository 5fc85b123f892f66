//! Applying solved bones to a pose
//!
//! Each output is blended from the bone's current component transform toward
//! the solved one by alpha and written back. Outputs arrive parents first, so
//! every child is placed against its already-updated parent, and bones below
//! the chain (toes) follow through their unchanged local transforms.

use super::chain::BoneOutput;
use super::pose::{Pose, PoseSource};

/// Blend `outputs` into `pose` with weight `alpha`
pub fn apply_bone_outputs(pose: &mut Pose, outputs: &[BoneOutput], alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    for output in outputs {
        if !pose.is_valid_index(output.index) {
            continue;
        }
        let current = pose.component_transform(output.index);
        let blended = if alpha >= 1.0 {
            output.transform
        } else {
            current.blend(&output.transform, alpha)
        };
        pose.set_component_transform(output.index, blended);
    }
}
