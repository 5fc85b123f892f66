//! Bone transforms (translation, rotation, scale)
//!
//! A transform maps a point `p` to `rotation * (scale * p) + translation`.
//! Composition and inversion assume uniform scale, which is what skeletal
//! rigs use in practice.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Rigid transform with scale for a single bone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl BoneTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::ONE,
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Apply `child` first, then `self`
    pub fn mul_transform(&self, child: &BoneTransform) -> BoneTransform {
        BoneTransform {
            translation: self.transform_point(child.translation),
            rotation: (self.rotation * child.rotation).normalize(),
            scale: self.scale * child.scale,
        }
    }

    pub fn inverse(&self) -> BoneTransform {
        let inv_rotation = self.rotation.inverse();
        let inv_scale = Vec3::new(
            safe_recip(self.scale.x),
            safe_recip(self.scale.y),
            safe_recip(self.scale.z),
        );
        BoneTransform {
            translation: inv_scale * (inv_rotation * -self.translation),
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }

    /// Express `self` (a transform in the same space as `parent`) relative to `parent`
    pub fn relative_to(&self, parent: &BoneTransform) -> BoneTransform {
        parent.inverse().mul_transform(self)
    }

    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (self.scale * point) + self.translation
    }

    #[inline]
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.inverse().transform_point(point)
    }

    /// Rotate a direction into this transform's frame, ignoring scale
    #[inline]
    pub fn inverse_transform_vector_no_scale(&self, v: Vec3) -> Vec3 {
        self.rotation.inverse() * v
    }

    /// Interpolate toward `other` (lerp translation/scale, slerp rotation)
    pub fn blend(&self, other: &BoneTransform, alpha: f32) -> BoneTransform {
        BoneTransform {
            translation: self.translation.lerp(other.translation, alpha),
            rotation: self.rotation.slerp(other.rotation, alpha).normalize(),
            scale: self.scale.lerp(other.scale, alpha),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

fn safe_recip(s: f32) -> f32 {
    if s.abs() <= f32::EPSILON { 0.0 } else { 1.0 / s }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1.0e-4
    }

    #[test]
    fn test_compose_parent_child() {
        let parent = BoneTransform::from_rotation_translation(
            Quat::from_rotation_z(FRAC_PI_2),
            Vec3::new(10.0, 0.0, 0.0),
        );
        let child = BoneTransform::from_translation(Vec3::new(5.0, 0.0, 0.0));
        let world = parent.mul_transform(&child);
        // Child offset along X is rotated onto Y by the parent
        assert!(approx_vec(world.translation, Vec3::new(10.0, 5.0, 0.0)));
    }

    #[test]
    fn test_relative_to_undoes_compose() {
        let parent = BoneTransform::from_rotation_translation(
            Quat::from_rotation_y(0.7),
            Vec3::new(1.0, 2.0, 3.0),
        )
        .with_scale(Vec3::splat(2.0));
        let child = BoneTransform::from_rotation_translation(
            Quat::from_rotation_x(-0.3),
            Vec3::new(0.0, 4.0, -1.0),
        );
        let world = parent.mul_transform(&child);
        let local = world.relative_to(&parent);
        assert!(approx_vec(local.translation, child.translation));
        assert!(local.rotation.angle_between(child.rotation) < 1.0e-4);
        assert!(approx_vec(local.scale, Vec3::ONE));
    }

    #[test]
    fn test_inverse_transform_point() {
        let t = BoneTransform::from_rotation_translation(
            Quat::from_rotation_z(0.4),
            Vec3::new(-3.0, 1.0, 8.0),
        );
        let p = Vec3::new(2.0, -5.0, 1.5);
        assert!(approx_vec(t.inverse_transform_point(t.transform_point(p)), p));
    }

    #[test]
    fn test_blend_endpoints() {
        let a = BoneTransform::IDENTITY;
        let b = BoneTransform::from_rotation_translation(
            Quat::from_rotation_x(1.0),
            Vec3::new(4.0, 0.0, 0.0),
        );
        assert_eq!(a.blend(&b, 0.0).translation, a.translation);
        assert!(approx_vec(a.blend(&b, 1.0).translation, b.translation));
        assert!(approx_vec(a.blend(&b, 0.5).translation, Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_zero_scale_inverse_is_finite() {
        let t = BoneTransform::IDENTITY.with_scale(Vec3::ZERO);
        assert!(t.inverse().is_finite());
    }
}
