//! Skeleton pose abstraction
//!
//! The solver only needs parent links, local and component-space transforms
//! and a name lookup. `PoseSource` is that seam; `Pose` is a plain
//! hierarchy implementation used by the demo and the tests.

use std::collections::HashMap;

use super::transform::BoneTransform;

/// Index of a bone inside a pose
pub type BoneIndex = usize;

/// Read access to a posed skeleton
pub trait PoseSource {
    fn bone_count(&self) -> usize;

    fn parent(&self, bone: BoneIndex) -> Option<BoneIndex>;

    fn bone_index(&self, name: &str) -> Option<BoneIndex>;

    /// Transform relative to the parent bone (or component, for roots)
    fn local_transform(&self, bone: BoneIndex) -> BoneTransform;

    /// Transform relative to the owning component
    fn component_transform(&self, bone: BoneIndex) -> BoneTransform;

    /// Placement of the component in the world
    fn component_to_world(&self) -> BoneTransform;

    fn is_valid_index(&self, bone: BoneIndex) -> bool {
        bone < self.bone_count()
    }
}

/// A single bone in a `Pose`
#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    pub parent: Option<BoneIndex>,
    pub local: BoneTransform,
}

/// Bone hierarchy with local transforms
///
/// Parents must be added before their children, so component transforms can
/// be resolved by walking up the chain.
#[derive(Debug, Clone)]
pub struct Pose {
    bones: Vec<Bone>,
    names: HashMap<String, BoneIndex>,
    component_to_world: BoneTransform,
}

impl Default for Pose {
    fn default() -> Self {
        Self::new()
    }
}

impl Pose {
    pub fn new() -> Self {
        Self {
            bones: Vec::new(),
            names: HashMap::new(),
            component_to_world: BoneTransform::IDENTITY,
        }
    }

    /// Add a bone and return its index
    ///
    /// A parent index that doesn't refer to an earlier bone is dropped and the
    /// bone becomes a root.
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        parent: Option<BoneIndex>,
        local: BoneTransform,
    ) -> BoneIndex {
        let index = self.bones.len();
        let name = name.into();
        let parent = parent.filter(|&p| p < index);
        self.names.insert(name.clone(), index);
        self.bones.push(Bone {
            name,
            parent,
            local,
        });
        index
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn set_component_to_world(&mut self, transform: BoneTransform) {
        self.component_to_world = transform;
    }

    pub fn set_local_transform(&mut self, bone: BoneIndex, local: BoneTransform) {
        if let Some(b) = self.bones.get_mut(bone) {
            b.local = local;
        }
    }

    /// Place a bone in component space; descendants follow through their locals
    pub fn set_component_transform(&mut self, bone: BoneIndex, transform: BoneTransform) {
        let Some(parent) = self.bones.get(bone).map(|b| b.parent) else {
            return;
        };
        let local = match parent {
            Some(p) => transform.relative_to(&self.component_transform(p)),
            None => transform,
        };
        self.bones[bone].local = local;
    }

    /// All component transforms, parents resolved before children
    pub fn component_transforms(&self) -> Vec<BoneTransform> {
        let mut out: Vec<BoneTransform> = Vec::with_capacity(self.bones.len());
        for bone in &self.bones {
            let cs = match bone.parent {
                Some(p) => out[p].mul_transform(&bone.local),
                None => bone.local,
            };
            out.push(cs);
        }
        out
    }
}

impl PoseSource for Pose {
    fn bone_count(&self) -> usize {
        self.bones.len()
    }

    fn parent(&self, bone: BoneIndex) -> Option<BoneIndex> {
        self.bones.get(bone).and_then(|b| b.parent)
    }

    fn bone_index(&self, name: &str) -> Option<BoneIndex> {
        self.names.get(name).copied()
    }

    fn local_transform(&self, bone: BoneIndex) -> BoneTransform {
        self.bones
            .get(bone)
            .map(|b| b.local)
            .unwrap_or(BoneTransform::IDENTITY)
    }

    fn component_transform(&self, bone: BoneIndex) -> BoneTransform {
        let Some(b) = self.bones.get(bone) else {
            return BoneTransform::IDENTITY;
        };
        match b.parent {
            Some(p) => self.component_transform(p).mul_transform(&b.local),
            None => b.local,
        }
    }

    fn component_to_world(&self) -> BoneTransform {
        self.component_to_world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn leg() -> Pose {
        let mut pose = Pose::new();
        let pelvis = pose.add_bone(
            "pelvis",
            None,
            BoneTransform::from_translation(Vec3::new(0.0, 0.0, 100.0)),
        );
        let thigh = pose.add_bone(
            "thigh",
            Some(pelvis),
            BoneTransform::from_translation(Vec3::new(0.0, 10.0, 0.0)),
        );
        let calf = pose.add_bone(
            "calf",
            Some(thigh),
            BoneTransform::from_translation(Vec3::new(0.0, 0.0, -50.0)),
        );
        pose.add_bone(
            "foot",
            Some(calf),
            BoneTransform::from_translation(Vec3::new(0.0, 0.0, -45.0)),
        );
        pose
    }

    #[test]
    fn test_component_transform_walks_parents() {
        let pose = leg();
        let foot = pose.bone_index("foot").unwrap();
        assert_eq!(
            pose.component_transform(foot).translation,
            Vec3::new(0.0, 10.0, 5.0)
        );
        let all = pose.component_transforms();
        assert_eq!(all[foot].translation, Vec3::new(0.0, 10.0, 5.0));
    }

    #[test]
    fn test_parent_lookup() {
        let pose = leg();
        let foot = pose.bone_index("foot").unwrap();
        let calf = pose.parent(foot).unwrap();
        assert_eq!(pose.bones()[calf].name, "calf");
        assert_eq!(pose.parent(0), None);
        assert_eq!(pose.parent(99), None);
        assert_eq!(pose.bone_index("tail"), None);
    }

    #[test]
    fn test_forward_parent_reference_becomes_root() {
        let mut pose = Pose::new();
        let a = pose.add_bone("a", Some(5), BoneTransform::IDENTITY);
        assert_eq!(pose.parent(a), None);
    }

    #[test]
    fn test_set_component_transform_moves_children() {
        let mut pose = leg();
        let calf = pose.bone_index("calf").unwrap();
        let foot = pose.bone_index("foot").unwrap();
        let moved = BoneTransform::from_translation(Vec3::new(20.0, 10.0, 50.0));
        pose.set_component_transform(calf, moved);

        assert!((pose.component_transform(calf).translation - moved.translation).length() < 1.0e-4);
        // Foot keeps its local offset from the calf
        let foot_cs = pose.component_transform(foot).translation;
        assert!((foot_cs - Vec3::new(20.0, 10.0, 5.0)).length() < 1.0e-4);
    }
}
