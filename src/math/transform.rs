use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::rotation::SMALL_NUMBER;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (point * self.scale) + self.position
    }

    pub fn transform_point_no_scale(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.position
    }

    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * (vector * self.scale)
    }

    pub fn transform_vector_no_scale(&self, vector: Vec3) -> Vec3 {
        self.rotation * vector
    }

    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        safe_divide(self.rotation.inverse() * (point - self.position), self.scale)
    }

    /// Composes `self` (a parent's global) with `local`, yielding the child's global.
    pub fn mul_transform(&self, local: &Self) -> Self {
        Self {
            position: self.transform_point(local.position),
            rotation: (self.rotation * local.rotation).normalize(),
            scale: self.scale * local.scale,
        }
    }

    /// Expresses `self` relative to `parent`, so that
    /// `parent.mul_transform(&self.relative_to(parent)) == self`.
    pub fn relative_to(&self, parent: &Self) -> Self {
        let inverse_rotation = parent.rotation.inverse();
        Self {
            position: safe_divide(inverse_rotation * (self.position - parent.position), parent.scale),
            rotation: (inverse_rotation * self.rotation).normalize(),
            scale: safe_divide(self.scale, parent.scale),
        }
    }

    pub fn inverse(&self) -> Self {
        Self::IDENTITY.relative_to(self)
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn normalized(mut self) -> Self {
        self.rotation = self.rotation.normalize();
        self
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }

    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.position.abs_diff_eq(other.position, max_abs_diff)
            && (self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
                || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff))
            && self.scale.abs_diff_eq(other.scale, max_abs_diff)
    }

    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            rotation: self.rotation.slerp(other.rotation, t).normalize(),
            scale: self.scale.lerp(other.scale, t),
        }
    }
}

fn safe_divide(value: Vec3, divisor: Vec3) -> Vec3 {
    let component = |v: f32, d: f32| if d.abs() <= SMALL_NUMBER { 0.0 } else { v / d };
    Vec3::new(
        component(value.x, divisor.x),
        component(value.y, divisor.y),
        component(value.z, divisor.z),
    )
}
