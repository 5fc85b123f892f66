//! Ground probes
//!
//! The tracker asks the world for the ground under the foot through
//! `GroundProbe`. Two terrains are provided: a flat plane and a seeded height
//! field on a regular grid.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Identifies the object a probe hit (or the one to ignore)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// Where a probe touched the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    pub point: Vec3,
    pub normal: Vec3,
    /// Object that was hit, `None` for anonymous geometry
    pub actor: Option<ActorId>,
}

/// Synchronous ray query against the environment
pub trait GroundProbe {
    /// Cast from `origin` along unit `direction` for up to `max_distance`,
    /// ignoring everything owned by `exclude`
    fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude: Option<ActorId>,
    ) -> Option<ProbeHit>;
}

impl<T: GroundProbe + ?Sized> GroundProbe for &T {
    fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude: Option<ActorId>,
    ) -> Option<ProbeHit> {
        (**self).probe(origin, direction, max_distance, exclude)
    }
}

/// Probe that never hits anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGround;

impl GroundProbe for NoGround {
    fn probe(&self, _: Vec3, _: Vec3, _: f32, _: Option<ActorId>) -> Option<ProbeHit> {
        None
    }
}

/// Horizontal plane at a fixed height
#[derive(Debug, Clone, Copy)]
pub struct FlatGround {
    pub height: f32,
    pub actor: Option<ActorId>,
}

impl FlatGround {
    pub fn new(height: f32, actor: ActorId) -> Self {
        Self {
            height,
            actor: Some(actor),
        }
    }
}

impl GroundProbe for FlatGround {
    fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude: Option<ActorId>,
    ) -> Option<ProbeHit> {
        if self.actor.is_some() && self.actor == exclude {
            return None;
        }
        if direction.z.abs() <= f32::EPSILON {
            return None;
        }
        let t = (self.height - origin.z) / direction.z;
        if !(0.0..=max_distance).contains(&t) {
            return None;
        }
        Some(ProbeHit {
            point: origin + direction * t,
            normal: Vec3::Z,
            actor: self.actor,
        })
    }
}

/// Terrain heights sampled on a regular XY grid
///
/// Heights are bilinearly interpolated; outside the grid there is no ground.
/// Only downward rays are supported, which is all foot placement needs.
#[derive(Debug, Clone)]
pub struct HeightField {
    origin: Vec3,
    cell_size: f32,
    width: usize,
    depth: usize,
    heights: Vec<f32>,
    actor: Option<ActorId>,
}

impl HeightField {
    /// Build from explicit heights, row-major along X
    ///
    /// Returns `None` if the grid is smaller than 2x2, the cell size isn't
    /// positive, or `heights` has the wrong length.
    pub fn from_heights(
        origin: Vec3,
        cell_size: f32,
        width: usize,
        depth: usize,
        heights: Vec<f32>,
        actor: ActorId,
    ) -> Option<Self> {
        if width < 2 || depth < 2 || cell_size <= 0.0 || heights.len() != width * depth {
            return None;
        }
        Some(Self {
            origin,
            cell_size,
            width,
            depth,
            heights,
            actor: Some(actor),
        })
    }

    /// Random rolling terrain, identical for identical seeds
    ///
    /// Each cell steps at most `roughness` away from the average of its left
    /// and lower neighbours, which keeps the ground walkable.
    pub fn generate(
        seed: u64,
        origin: Vec3,
        cell_size: f32,
        width: usize,
        depth: usize,
        roughness: f32,
        actor: ActorId,
    ) -> Self {
        let width = width.max(2);
        let depth = depth.max(2);
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut heights = vec![0.0f32; width * depth];

        for y in 0..depth {
            for x in 0..width {
                let left = if x > 0 { Some(heights[y * width + x - 1]) } else { None };
                let below = if y > 0 { Some(heights[(y - 1) * width + x]) } else { None };
                let base = match (left, below) {
                    (Some(l), Some(b)) => (l + b) * 0.5,
                    (Some(l), None) => l,
                    (None, Some(b)) => b,
                    (None, None) => 0.0,
                };
                let step = if roughness > 0.0 {
                    rng.random_range(-roughness..roughness)
                } else {
                    0.0
                };
                heights[y * width + x] = base + step;
            }
        }

        Self {
            origin,
            cell_size: cell_size.max(f32::EPSILON),
            width,
            depth,
            heights,
            actor: Some(actor),
        }
    }

    fn at(&self, x: usize, y: usize) -> f32 {
        self.heights[y * self.width + x]
    }

    /// Interpolated ground height under `(x, y)`, `None` off the grid
    pub fn height_at(&self, x: f32, y: f32) -> Option<f32> {
        let gx = (x - self.origin.x) / self.cell_size;
        let gy = (y - self.origin.y) / self.cell_size;
        let max_x = (self.width - 1) as f32;
        let max_y = (self.depth - 1) as f32;
        if !(0.0..=max_x).contains(&gx) || !(0.0..=max_y).contains(&gy) {
            return None;
        }

        let x0 = (gx.floor() as usize).min(self.width - 2);
        let y0 = (gy.floor() as usize).min(self.depth - 2);
        let fx = gx - x0 as f32;
        let fy = gy - y0 as f32;

        let h00 = self.at(x0, y0);
        let h10 = self.at(x0 + 1, y0);
        let h01 = self.at(x0, y0 + 1);
        let h11 = self.at(x0 + 1, y0 + 1);
        let near = h00 + (h10 - h00) * fx;
        let far = h01 + (h11 - h01) * fx;
        Some(self.origin.z + near + (far - near) * fy)
    }

    /// Surface normal from central differences
    pub fn normal_at(&self, x: f32, y: f32) -> Vec3 {
        let e = self.cell_size * 0.5;
        let h = |px: f32, py: f32| self.height_at(px, py);
        let center = h(x, y).unwrap_or(self.origin.z);
        let dx = h(x + e, y).unwrap_or(center) - h(x - e, y).unwrap_or(center);
        let dy = h(x, y + e).unwrap_or(center) - h(x, y - e).unwrap_or(center);
        Vec3::new(-dx, -dy, 2.0 * e).normalize_or(Vec3::Z)
    }
}

impl GroundProbe for HeightField {
    fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude: Option<ActorId>,
    ) -> Option<ProbeHit> {
        if self.actor.is_some() && self.actor == exclude {
            return None;
        }
        if direction.z >= -f32::EPSILON {
            return None;
        }
        let ground = self.height_at(origin.x, origin.y)?;
        let t = (ground - origin.z) / direction.z;
        if !(0.0..=max_distance).contains(&t) {
            return None;
        }
        let point = origin + direction * t;
        Some(ProbeHit {
            point,
            normal: self.normal_at(point.x, point.y),
            actor: self.actor,
        })
    }
}
