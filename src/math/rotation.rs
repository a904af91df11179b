use glam::{Quat, Vec3};

pub const SMALL_NUMBER: f32 = 1.0e-8;
pub const KINDA_SMALL_NUMBER: f32 = 1.0e-4;

/// Shortest rotation taking direction `from` onto direction `to`.
///
/// Both inputs are normalized here; a zero input yields identity.
pub fn rotation_between(from: Vec3, to: Vec3) -> Quat {
    let from = from.normalize_or_zero();
    let to = to.normalize_or_zero();
    if from == Vec3::ZERO || to == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(from, to)
}

/// Like [`rotation_between`], but when the two directions are opposite the
/// result is a half turn about `flip_axis` instead of an arbitrary axis.
pub fn rotation_between_or_flip(from: Vec3, to: Vec3, flip_axis: Vec3) -> Quat {
    let from = from.normalize_or_zero();
    let to = to.normalize_or_zero();
    let flip_axis = flip_axis.normalize_or_zero();
    if from.dot(to) + 1.0 < KINDA_SMALL_NUMBER && flip_axis != Vec3::ZERO {
        return Quat::from_axis_angle(flip_axis, std::f32::consts::PI);
    }
    rotation_between(from, to)
}

/// Spherical interpolation between two directions. The result is unit length.
pub fn slerp_direction(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    let from = from.normalize_or_zero();
    let to = to.normalize_or_zero();
    if from == Vec3::ZERO {
        return to;
    }
    let partial = Quat::IDENTITY.slerp(rotation_between(from, to), t.clamp(0.0, 1.0));
    (partial * from).normalize_or_zero()
}

pub fn is_nearly_zero(v: Vec3) -> bool {
    v.length_squared() <= KINDA_SMALL_NUMBER * KINDA_SMALL_NUMBER
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    #[test]
    fn x_onto_y_is_quarter_turn_about_z() {
        let q = rotation_between(Vec3::X, Vec3::Y * 10.0);
        let (axis, angle) = q.to_axis_angle();
        assert_relative_eq!(angle, FRAC_PI_2, epsilon = 1e-5);
        assert!(axis.abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn opposite_directions_flip_about_given_axis() {
        let q = rotation_between_or_flip(Vec3::Y, Vec3::NEG_Y, Vec3::X);
        assert!((q * Vec3::Y).abs_diff_eq(Vec3::NEG_Y, 1e-5));
        assert!((q * Vec3::X).abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn slerp_direction_halfway() {
        let d = slerp_direction(Vec3::X, Vec3::Y, 0.5);
        assert_relative_eq!(d.angle_between(Vec3::X), FRAC_PI_4, epsilon = 1e-5);
        assert_relative_eq!(d.length(), 1.0, epsilon = 1e-5);
    }
}
