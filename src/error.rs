//! Configuration errors
//!
//! Numerical degeneracy is never an error here: the solver resolves it with
//! fallback geometry. Only bad configuration surfaces as `IkError`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IkError {
    #[error("bone '{bone}' not found in skeleton")]
    BoneNotFound { bone: String },

    #[error("invalid stretch limits: min {min} is greater than max {max}")]
    InvalidStretchLimits { min: f32, max: f32 },

    #[error("invalid blend time: {0}")]
    InvalidBlendTime(f32),

    #[error("settings parse error: {0}")]
    Settings(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IkError>;
