//! Foot IK demo
//!
//! Walks a single leg across seeded random terrain at a fixed timestep and
//! logs how well the foot tracks the ground. Pass a seed as the first
//! argument to get a different terrain.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed: u64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(12345);

    log::info!("Foot IK demo starting (seed {})", seed);
    walker::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on wasm
}

#[cfg(not(target_arch = "wasm32"))]
mod walker {
    use glam::Vec3;

    use foot_ik::consts::SIM_DT;
    use foot_ik::ik::{
        ActorId, BoneControlSpace, BoneIndex, BoneTransform, FootPlacementIk, GroundProbe,
        HeightField, Pose, PoseSource, SkeletalControl, UpdateContext, apply_bone_outputs,
    };
    use foot_ik::FootIkSettings;

    const CHARACTER: ActorId = ActorId(1);
    const TERRAIN: ActorId = ActorId(2);

    /// Horizontal walking speed (units/s)
    const WALK_SPEED: f32 = 120.0;
    /// Seconds of walking to simulate
    const DURATION: f32 = 4.0;
    /// Hip height above the terrain origin
    const HIP_HEIGHT: f32 = 92.0;

    struct Rig {
        pose: Pose,
        pelvis: BoneIndex,
        foot: BoneIndex,
    }

    /// pelvis -> thigh -> calf -> foot -> toe, leg hanging straight down
    fn build_rig() -> Rig {
        let mut pose = Pose::new();
        let pelvis = pose.add_bone(
            "pelvis",
            None,
            BoneTransform::from_translation(Vec3::new(0.0, 0.0, HIP_HEIGHT)),
        );
        let thigh = pose.add_bone(
            "thigh_l",
            Some(pelvis),
            BoneTransform::from_translation(Vec3::new(0.0, 12.0, 0.0)),
        );
        let calf = pose.add_bone(
            "calf_l",
            Some(thigh),
            BoneTransform::from_translation(Vec3::new(0.0, 0.0, -45.0)),
        );
        let foot = pose.add_bone(
            "foot_l",
            Some(calf),
            BoneTransform::from_translation(Vec3::new(0.0, 0.0, -43.0)),
        );
        pose.add_bone(
            "ball_l",
            Some(foot),
            BoneTransform::from_translation(Vec3::new(12.0, 0.0, -4.0)),
        );
        Rig { pose, pelvis, foot }
    }

    pub fn run(seed: u64) {
        let terrain = HeightField::generate(
            seed,
            Vec3::new(-100.0, -50.0, 0.0),
            10.0,
            80,
            12,
            1.5,
            TERRAIN,
        );

        let settings = FootIkSettings::for_bone("foot_l")
            .with_joint_target(
                Vec3::new(60.0, 0.0, 0.0),
                BoneControlSpace::Bone,
                Some("calf_l".to_string()),
            )
            .with_stretching(1.0, 1.1)
            .with_hit_z_offset(4.0)
            .with_blend_time(0.2);

        let rig = build_rig();
        let mut ik = match FootPlacementIk::new(settings) {
            Ok(ik) => ik,
            Err(e) => {
                log::error!("Invalid settings: {}", e);
                return;
            }
        };
        if let Err(e) = ik.initialize_bone_references(&rig.pose) {
            log::error!("Rig setup failed: {}", e);
            return;
        }

        let ticks = (DURATION / SIM_DT) as u32;
        let mut worst_error = 0.0f32;
        let mut planted_ticks = 0u32;

        for tick in 0..ticks {
            let t = tick as f32 * SIM_DT;

            // Animated pose: pelvis glides forward, leg stays straight
            let mut pose = rig.pose.clone();
            pose.set_local_transform(
                rig.pelvis,
                BoneTransform::from_translation(Vec3::new(WALK_SPEED * t - 60.0, 0.0, HIP_HEIGHT)),
            );

            ik.update(&UpdateContext::new(SIM_DT, Some(CHARACTER)), &pose, &terrain);
            let outputs = ik.evaluate(&pose);
            let alpha = ik.alpha();
            apply_bone_outputs(&mut pose, &outputs, alpha);

            let foot_world = pose
                .component_to_world()
                .transform_point(pose.component_transform(rig.foot).translation);
            let Some(ground_z) = terrain
                .probe(foot_world + Vec3::Z * 200.0, -Vec3::Z, 400.0, Some(CHARACTER))
                .map(|hit| hit.point.z + ik.settings().hit_z_offset)
            else {
                continue;
            };

            if alpha >= 1.0 {
                planted_ticks += 1;
                worst_error = worst_error.max((foot_world.z - ground_z).abs());
            }
            if tick % 30 == 0 {
                log::info!(
                    "t={:.2}s state={:?} alpha={:.2} foot_z={:.2} ground_z={:.2}",
                    t,
                    ik.blend_state(),
                    alpha,
                    foot_world.z,
                    ground_z
                );
            }
        }

        log::info!(
            "Done: {} of {} ticks fully planted, worst foot height error {:.3}",
            planted_ticks,
            ticks,
            worst_error
        );
    }
}
