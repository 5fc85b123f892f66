//! Foot IK - ground-probing foot placement on a two-bone limb
//!
//! Core modules:
//! - `ik`: Limb solver, effector tracking, pose abstraction and the foot placement node
//! - `settings`: Data-driven node configuration
//! - `error`: Configuration error type

pub mod error;
pub mod ik;
pub mod settings;

pub use error::IkError;
pub use settings::{FootIkSettings, LiveTuning};

use glam::Vec3;

/// Solver and tracker constants
pub mod consts {
    /// Tolerance used for degenerate lengths and ratios
    pub const KINDA_SMALL_NUMBER: f32 = 1.0e-4;

    /// Ground probe extends this far above and below the end bone
    pub const PROBE_HALF_LENGTH: f32 = 50.0;

    /// Default time to blend the node's influence in or out (seconds)
    pub const DEFAULT_BLEND_TIME: f32 = 0.2;
    /// Above this alpha the effector height is eased instead of snapped
    pub const SMOOTHING_ALPHA_THRESHOLD: f32 = 0.9;

    /// Default stretch multiplier range applied to the limb's full reach
    pub const DEFAULT_STRETCH_LIMITS: (f32, f32) = (1.0, 1.2);

    /// Fixed update timestep for the demo walker (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
}

/// Normalize a vector, returning zero when it is too short to have a direction
#[inline]
pub fn safe_normal(v: Vec3) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq < consts::KINDA_SMALL_NUMBER * consts::KINDA_SMALL_NUMBER {
        Vec3::ZERO
    } else {
        v / len_sq.sqrt()
    }
}

/// Square root that treats tiny negative inputs (rounding, -0.0) as zero
#[inline]
pub fn clamped_sqrt(x: f32) -> f32 {
    x.max(0.0).sqrt()
}

/// Two unit vectors perpendicular to `dir` and to each other
///
/// Deterministic for a given input, so degenerate bend planes always resolve
/// the same way. `dir` must be normalized.
#[inline]
pub fn perpendicular_axes(dir: Vec3) -> (Vec3, Vec3) {
    dir.any_orthonormal_pair()
}
