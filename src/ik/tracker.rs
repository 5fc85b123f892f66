//! Effector tracking and blend timing
//!
//! Once per update tick the tracker probes the ground under the foot, picks
//! whether the IK should blend in (plant on the ground) or blend out (let the
//! animation drive the foot), and keeps a smoothed effector location plus the
//! blend alpha the pose blend uses.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::probe::{ActorId, GroundProbe};
use crate::consts::{DEFAULT_BLEND_TIME, PROBE_HALF_LENGTH, SMOOTHING_ALPHA_THRESHOLD};
use crate::safe_normal;

/// Direction the node's influence is moving in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendState {
    /// No tick has run yet
    #[default]
    Unknown,
    BlendIn,
    BlendOut,
}

/// Live-editable tracker parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Seconds to fully blend in or out
    pub blend_time: f32,
    /// Vertical offset added to the ground hit
    pub hit_z_offset: f32,
    /// Whether the limb may stretch to reach targets below the foot
    pub allow_stretch: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            blend_time: DEFAULT_BLEND_TIME,
            hit_z_offset: 0.0,
            allow_stretch: false,
        }
    }
}

/// Tracker output for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectorSample {
    /// Effector location in world space
    pub location: Vec3,
    /// Blend weight in `[0, 1]`
    pub alpha: f32,
}

/// Persistent per-instance tracking state
#[derive(Debug, Clone, Default)]
pub struct EffectorTracker {
    pub config: TrackerConfig,
    state: BlendState,
    /// Tracker clock value of the last state change
    activation_time: f64,
    /// Seconds accumulated from update deltas
    time: f64,
    effector_location: Vec3,
    alpha: f32,
}

impl EffectorTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn blend_state(&self) -> BlendState {
        self.state
    }

    pub fn effector_location(&self) -> Vec3 {
        self.effector_location
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn activation_time(&self) -> f64 {
        self.activation_time
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn sample(&self) -> EffectorSample {
        EffectorSample {
            location: self.effector_location,
            alpha: self.alpha,
        }
    }

    /// Advance one tick
    ///
    /// `end_bone_world` is the animated foot position in world space; the
    /// probe runs vertically through it, ignoring `owner`.
    pub fn update<G: GroundProbe + ?Sized>(
        &mut self,
        delta_time: f32,
        end_bone_world: Vec3,
        ground: &G,
        owner: Option<ActorId>,
    ) -> EffectorSample {
        self.time += f64::from(delta_time.max(0.0));

        let trace_offset = Vec3::new(0.0, 0.0, PROBE_HALF_LENGTH);
        let hit = ground
            .probe(
                end_bone_world + trace_offset,
                -Vec3::Z,
                2.0 * PROBE_HALF_LENGTH,
                owner,
            )
            // Anonymous geometry doesn't count as ground
            .filter(|hit| hit.actor.is_some());

        let old_state = self.state;
        let desired = match hit {
            Some(hit) => {
                let desired = hit.point + Vec3::new(0.0, 0.0, self.config.hit_z_offset);
                let reaching_down = safe_normal(desired - end_bone_world).z <= 0.0;
                self.state = if reaching_down && !self.config.allow_stretch {
                    BlendState::BlendOut
                } else {
                    BlendState::BlendIn
                };
                desired
            }
            None => {
                self.state = BlendState::BlendOut;
                end_bone_world
            }
        };

        if old_state != self.state {
            log::debug!(
                "foot blend {:?} -> {:?} at {:.3}s",
                old_state,
                self.state,
                self.time
            );
            self.activation_time = self.time;
        }

        let raw_alpha = self.raw_alpha();

        if self.state == BlendState::BlendIn && raw_alpha >= SMOOTHING_ALPHA_THRESHOLD {
            // Nearly planted: ease the height so the last stretch of the
            // blend doesn't pop, but keep following the ground in X/Y
            let rate = self.step_rate(delta_time);
            let z = self.effector_location.z + rate * (desired.z - self.effector_location.z);
            self.effector_location = Vec3::new(desired.x, desired.y, z);
        } else if self.state != BlendState::BlendOut {
            self.effector_location = desired;
        } else if self.effector_location == Vec3::ZERO {
            self.effector_location = end_bone_world;
        }

        self.alpha = raw_alpha.clamp(0.0, 1.0);
        self.sample()
    }

    /// Unclamped ramp for the current state
    fn raw_alpha(&self) -> f32 {
        let blend_time = self.config.blend_time;
        let ramp = if blend_time > 0.0 {
            ((self.time - self.activation_time) / f64::from(blend_time)) as f32
        } else {
            f32::INFINITY
        };
        match self.state {
            BlendState::BlendIn => ramp,
            BlendState::BlendOut => 1.0 - ramp,
            BlendState::Unknown => self.alpha,
        }
    }

    fn step_rate(&self, delta_time: f32) -> f32 {
        if self.config.blend_time > 0.0 {
            (delta_time / self.config.blend_time).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ik::probe::{FlatGround, NoGround, ProbeHit};
    use proptest::prelude::*;

    const GROUND: ActorId = ActorId(3);
    const OWNER: ActorId = ActorId(1);

    fn stretchy(blend_time: f32, hit_z_offset: f32) -> EffectorTracker {
        EffectorTracker::new(TrackerConfig {
            blend_time,
            hit_z_offset,
            allow_stretch: true,
        })
    }

    /// Ground without an owning actor
    struct AnonymousGround;

    impl GroundProbe for AnonymousGround {
        fn probe(&self, origin: Vec3, _: Vec3, _: f32, _: Option<ActorId>) -> Option<ProbeHit> {
            Some(ProbeHit {
                point: Vec3::new(origin.x, origin.y, 0.0),
                normal: Vec3::Z,
                actor: None,
            })
        }
    }

    #[test]
    fn test_ground_contact_blend_in() {
        let mut tracker = stretchy(0.2, 2.0);
        let ground = FlatGround::new(-10.0, GROUND);
        let foot = Vec3::new(5.0, 5.0, 0.0);

        let first = tracker.update(0.05, foot, &ground, Some(OWNER));
        assert_eq!(tracker.blend_state(), BlendState::BlendIn);
        assert_eq!(first.alpha, 0.0);

        // 0.2s after the first hit
        let mut sample = first;
        for _ in 0..4 {
            sample = tracker.update(0.05, foot, &ground, Some(OWNER));
        }
        assert!((sample.alpha - 1.0).abs() < 1.0e-4, "alpha {}", sample.alpha);
        assert!((sample.location.z - -8.0).abs() < 1.0e-4);
        assert_eq!(sample.location.x, 5.0);
        assert_eq!(sample.location.y, 5.0);
    }

    #[test]
    fn test_reaching_down_without_stretch_blends_out() {
        let mut tracker = EffectorTracker::new(TrackerConfig {
            blend_time: 0.2,
            hit_z_offset: 2.0,
            allow_stretch: false,
        });
        let ground = FlatGround::new(-10.0, GROUND);
        tracker.update(0.05, Vec3::ZERO, &ground, None);
        assert_eq!(tracker.blend_state(), BlendState::BlendOut);

        // Ground above the foot still blends in
        let raised = FlatGround::new(-45.0, GROUND);
        let foot = Vec3::new(0.0, 0.0, -48.0);
        tracker.update(0.05, foot, &raised, None);
        assert_eq!(tracker.blend_state(), BlendState::BlendIn);
    }

    #[test]
    fn test_target_at_foot_does_not_divide_by_zero() {
        let mut tracker = EffectorTracker::new(TrackerConfig {
            blend_time: 0.2,
            hit_z_offset: 0.0,
            allow_stretch: false,
        });
        let ground = FlatGround::new(0.0, GROUND);
        let sample = tracker.update(0.05, Vec3::ZERO, &ground, None);
        // Zero-length direction counts as level
        assert_eq!(tracker.blend_state(), BlendState::BlendOut);
        assert!(sample.alpha.is_finite());
        assert!(sample.location.is_finite());
    }

    #[test]
    fn test_probe_miss_blends_out_and_freezes() {
        let mut tracker = stretchy(0.2, 0.0);
        let ground = FlatGround::new(-10.0, GROUND);
        let foot = Vec3::new(1.0, 2.0, 0.0);
        for _ in 0..10 {
            tracker.update(0.05, foot, &ground, None);
        }
        assert_eq!(tracker.alpha(), 1.0);
        let planted = tracker.effector_location();

        let moved_foot = Vec3::new(30.0, -4.0, 12.0);
        let sample = tracker.update(0.05, moved_foot, &NoGround, None);
        assert_eq!(tracker.blend_state(), BlendState::BlendOut);
        assert_eq!(sample.alpha, 1.0);
        assert_eq!(sample.location, planted);

        let mut previous = sample.alpha;
        for _ in 0..4 {
            let s = tracker.update(0.05, moved_foot, &NoGround, None);
            assert!(s.alpha < previous);
            assert_eq!(s.location, planted);
            previous = s.alpha;
        }
        assert!(previous.abs() < 1.0e-4);
    }

    #[test]
    fn test_first_blend_out_initializes_location() {
        let mut tracker = stretchy(0.2, 0.0);
        let foot = Vec3::new(4.0, 5.0, 6.0);
        let sample = tracker.update(0.016, foot, &NoGround, None);
        assert_eq!(sample.location, foot);
        assert_eq!(tracker.activation_time(), tracker.time());
    }

    #[test]
    fn test_anonymous_hits_are_misses() {
        let mut tracker = stretchy(0.2, 0.0);
        tracker.update(0.016, Vec3::new(0.0, 0.0, 10.0), &AnonymousGround, None);
        assert_eq!(tracker.blend_state(), BlendState::BlendOut);
    }

    #[test]
    fn test_owner_is_excluded() {
        let mut tracker = stretchy(0.2, 0.0);
        let own_body = FlatGround::new(-5.0, OWNER);
        tracker.update(0.016, Vec3::ZERO, &own_body, Some(OWNER));
        assert_eq!(tracker.blend_state(), BlendState::BlendOut);
    }

    #[test]
    fn test_height_is_eased_near_full_blend() {
        let mut tracker = stretchy(0.2, 0.0);
        let foot = Vec3::ZERO;
        let low = FlatGround::new(-10.0, GROUND);
        for _ in 0..10 {
            tracker.update(0.05, foot, &low, None);
        }
        assert!((tracker.effector_location().z - -10.0).abs() < 1.0e-4);

        // Ground steps up: z moves a quarter of the way (0.05 / 0.2), x/y snap
        let high = FlatGround::new(-2.0, GROUND);
        let moved = Vec3::new(3.0, 0.0, 0.0);
        let sample = tracker.update(0.05, moved, &high, None);
        assert!((sample.location.z - -8.0).abs() < 1.0e-4, "z {}", sample.location.z);
        assert_eq!(sample.location.x, 3.0);
    }

    #[test]
    fn test_zero_blend_time_snaps() {
        let mut tracker = stretchy(0.0, 0.0);
        let ground = FlatGround::new(-10.0, GROUND);
        let sample = tracker.update(0.016, Vec3::ZERO, &ground, None);
        assert_eq!(sample.alpha, 1.0);
        let sample = tracker.update(0.016, Vec3::ZERO, &NoGround, None);
        assert_eq!(sample.alpha, 0.0);
    }

    proptest! {
        #[test]
        fn prop_alpha_bounded_and_continuous(
            steps in proptest::collection::vec((0.001f32..0.1, any::<bool>(), -60.0f32..40.0), 1..120),
            blend_time in 0.05f32..1.0,
            allow_stretch in any::<bool>(),
        ) {
            let mut tracker = EffectorTracker::new(TrackerConfig {
                blend_time,
                hit_z_offset: 1.0,
                allow_stretch,
            });
            let mut previous: Option<(f32, BlendState)> = None;

            for (dt, has_ground, ground_z) in steps {
                let ground = FlatGround::new(ground_z, GROUND);
                let sample = if has_ground {
                    tracker.update(dt, Vec3::ZERO, &ground, None)
                } else {
                    tracker.update(dt, Vec3::ZERO, &NoGround, None)
                };

                prop_assert!((0.0..=1.0).contains(&sample.alpha));
                prop_assert!(sample.location.is_finite());

                if let Some((prev_alpha, prev_state)) = previous {
                    if prev_state == tracker.blend_state() {
                        let max_step = dt / blend_time + 1.0e-4;
                        prop_assert!((sample.alpha - prev_alpha).abs() <= max_step);
                    }
                }
                previous = Some((sample.alpha, tracker.blend_state()));
            }
        }
    }
}
