//! Math utilities module
//!
//! Provides convenient re-exports from glam, the rig transform type and
//! rotation helpers shared by the solvers.

mod rotation;
mod transform;

pub use rotation::{
    is_nearly_zero, rotation_between, rotation_between_or_flip, slerp_direction,
    KINDA_SMALL_NUMBER, SMALL_NUMBER,
};
pub use transform::Transform;

// Re-export commonly used glam types
pub use glam::{EulerRot, Quat, Vec3};
