//! Two-bone analytic IK
//!
//! Places the joint (knee) so the end bone reaches the target while keeping
//! both segment lengths, using the law of cosines inside the plane defined by
//! the root, the target and a joint-target hint.
//!
//! Every degenerate input resolves to fallback geometry; for finite inputs the
//! output never contains NaN.

use glam::{Quat, Vec3};

use super::chain::{BoneOutput, IkTarget, LimbChain, SolveResult, StretchConfig};
use crate::consts::KINDA_SMALL_NUMBER;
use crate::{clamped_sqrt, perpendicular_axes, safe_normal};

/// Frame the joint is allowed to bend in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BendPlane {
    /// Unit direction from root toward the target
    pub desired_dir: Vec3,
    /// Distance from root to target (at least `KINDA_SMALL_NUMBER`)
    pub desired_length: f32,
    /// Unit normal of the bend plane
    pub normal: Vec3,
    /// Unit direction the joint is pushed toward, perpendicular to `desired_dir`
    pub bend_dir: Vec3,
}

impl BendPlane {
    pub fn new(root: Vec3, target: Vec3, joint_target: Vec3) -> Self {
        let desired_delta = target - root;
        let mut desired_length = desired_delta.length();

        let desired_dir = if desired_length < KINDA_SMALL_NUMBER {
            desired_length = KINDA_SMALL_NUMBER;
            Vec3::X
        } else {
            desired_delta / desired_length
        };

        let joint_target_delta = joint_target - root;
        let small_sq = KINDA_SMALL_NUMBER * KINDA_SMALL_NUMBER;

        let (normal, bend_dir) = if joint_target_delta.length_squared() < small_sq {
            perpendicular_axes(desired_dir)
        } else {
            let normal = desired_dir.cross(joint_target_delta);
            if normal.length_squared() < small_sq {
                // Hint lies on the reach line, any perpendicular pair will do
                perpendicular_axes(desired_dir)
            } else {
                let bend = joint_target_delta - joint_target_delta.dot(desired_dir) * desired_dir;
                (normal.normalize(), bend.normalize())
            }
        };

        Self {
            desired_dir,
            desired_length,
            normal,
            bend_dir,
        }
    }
}

/// Segment lengths after applying stretch
///
/// Returns `(upper, lower)`. The multiplier grows from 1 to `limits.max` as
/// the reach ratio moves through `[limits.min, limits.max]`.
pub fn stretched_lengths(
    upper: f32,
    lower: f32,
    desired_length: f32,
    stretch: &StretchConfig,
) -> (f32, f32) {
    if !stretch.allow_stretch {
        return (upper, lower);
    }
    let (min, max) = stretch.stretch_limits;
    let scale_range = max - min;
    let max_reach = upper + lower;
    if scale_range <= KINDA_SMALL_NUMBER || max_reach <= KINDA_SMALL_NUMBER {
        return (upper, lower);
    }

    let reach_ratio = desired_length / max_reach;
    let scaling = (max - 1.0) * ((reach_ratio - min) / scale_range).clamp(0.0, 1.0);
    if scaling > KINDA_SMALL_NUMBER {
        let factor = 1.0 + scaling;
        (upper * factor, lower * factor)
    } else {
        (upper, lower)
    }
}

/// New joint and end positions for the limb
///
/// Returns `(joint, end)`.
pub fn solve_positions(
    root: Vec3,
    plane: &BendPlane,
    target: Vec3,
    upper: f32,
    lower: f32,
) -> (Vec3, Vec3) {
    let dir = plane.desired_dir;
    let desired = plane.desired_length;
    let max_reach = upper + lower;

    // Out of reach: extend fully along the reach line
    if desired >= max_reach {
        return (root + upper * dir, root + max_reach * dir);
    }

    let two_ab = 2.0 * upper * desired;
    let cos_angle = if two_ab != 0.0 {
        (upper * upper + desired * desired - lower * lower) / two_ab
    } else {
        0.0
    };

    if !(-1.0..=1.0).contains(&cos_angle) {
        // No triangle: the target is closer than |upper - lower|. Fold the
        // limb back on itself so the end stays on the positive side.
        return if upper >= lower {
            let joint = root + upper * dir;
            (joint, joint - lower * dir)
        } else {
            let joint = root - upper * dir;
            (joint, joint + lower * dir)
        };
    }

    // Right triangle with the upper bone as hypotenuse. A negative cosine
    // puts the joint behind the root along the reach line.
    let sin_angle = clamped_sqrt(1.0 - cos_angle * cos_angle);
    let along = upper * cos_angle;
    let perpendicular = (upper * sin_angle).max(0.0);

    let joint = root + along * dir + perpendicular * plane.bend_dir;
    (joint, target)
}

/// Shortest-arc rotation taking `from` onto `to`
///
/// Identity when either direction is degenerate.
pub fn delta_rotation(from: Vec3, to: Vec3) -> Quat {
    let from = safe_normal(from);
    let to = safe_normal(to);
    if from == Vec3::ZERO || to == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(from, to)
}

/// Solve the limb toward `target`
///
/// Upper bone stays at the root and turns toward the new joint; lower bone
/// moves to the new joint and turns toward the new end; end bone keeps its
/// rotation and moves to the new end position.
pub fn solve_two_bone(
    chain: &LimbChain,
    target: &IkTarget,
    stretch: &StretchConfig,
) -> SolveResult {
    let root = chain.root_pos();
    let initial_joint = chain.joint_pos();
    let initial_end = chain.end_pos();

    let plane = BendPlane::new(root, target.effector, target.joint_target);
    let (upper_length, lower_length) = stretched_lengths(
        chain.upper_length,
        chain.lower_length,
        plane.desired_length,
        stretch,
    );

    let (joint, end) = solve_positions(root, &plane, target.effector, upper_length, lower_length);

    let mut upper = chain.upper.transform;
    let upper_delta = delta_rotation(initial_joint - root, joint - root);
    upper.rotation = (upper_delta * upper.rotation).normalize();
    upper.translation = root;

    // The lower bone's delta is found in its own frame; applying it on the
    // right is the same as left-multiplying the component-space delta.
    let mut lower = chain.lower.transform;
    let old_dir_local = lower.inverse_transform_vector_no_scale(initial_end - initial_joint);
    let new_dir_local = lower.inverse_transform_vector_no_scale(end - joint);
    let lower_delta = delta_rotation(old_dir_local, new_dir_local);
    lower.rotation = (lower.rotation * lower_delta).normalize();
    lower.translation = joint;

    let mut end_transform = chain.end.transform;
    end_transform.translation = end;

    SolveResult {
        upper: BoneOutput {
            index: chain.upper.index,
            transform: upper,
        },
        lower: BoneOutput {
            index: chain.lower.index,
            transform: lower,
        },
        end: BoneOutput {
            index: chain.end.index,
            transform: end_transform,
        },
        upper_length,
        lower_length,
    }
}
