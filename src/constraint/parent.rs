use serde::{Deserialize, Serialize};

use super::{gather_parents, ConstraintParent};
use crate::context::ExecuteContext;
use crate::hierarchy::{CachedElement, ElementKey, ParentWeight, Pose};
use crate::math::{EulerRot, Quat, Transform, Vec3, KINDA_SMALL_NUMBER};
use crate::solver::{Solve, SolveOutcome};

/// Which components of a vector a constraint may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisFilter {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl Default for AxisFilter {
    fn default() -> Self {
        Self::ALL
    }
}

impl AxisFilter {
    pub const ALL: Self = Self {
        x: true,
        y: true,
        z: true,
    };
    pub const NONE: Self = Self {
        x: false,
        y: false,
        z: false,
    };

    pub fn has_no_effect(&self) -> bool {
        self.x && self.y && self.z
    }

    /// Takes the enabled components from `desired` and the rest from `current`.
    pub fn apply(&self, current: Vec3, desired: Vec3) -> Vec3 {
        Vec3::new(
            if self.x { desired.x } else { current.x },
            if self.y { desired.y } else { current.y },
            if self.z { desired.z } else { current.z },
        )
    }

    /// Filters a rotation per Euler axis in the given order.
    pub fn apply_rotation(&self, current: Quat, desired: Quat, order: RotationOrder) -> Quat {
        if self.has_no_effect() {
            return desired;
        }
        let current = order.to_euler(current);
        let desired = order.to_euler(desired);
        order.from_euler(self.apply(current, desired)).normalize()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransformFilter {
    pub translation: AxisFilter,
    pub rotation: AxisFilter,
    pub scale: AxisFilter,
}

/// Euler order used when filtering rotations per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RotationOrder {
    Xyz,
    #[default]
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
}

impl RotationOrder {
    fn euler_rot(self) -> EulerRot {
        match self {
            RotationOrder::Xyz => EulerRot::XYZ,
            RotationOrder::Xzy => EulerRot::XZY,
            RotationOrder::Yxz => EulerRot::YXZ,
            RotationOrder::Yzx => EulerRot::YZX,
            RotationOrder::Zxy => EulerRot::ZXY,
            RotationOrder::Zyx => EulerRot::ZYX,
        }
    }

    /// Euler angles (radians) keyed by axis: x, y and z components.
    pub fn to_euler(self, rotation: Quat) -> Vec3 {
        let (a, b, c) = rotation.to_euler(self.euler_rot());
        match self {
            RotationOrder::Xyz => Vec3::new(a, b, c),
            RotationOrder::Xzy => Vec3::new(a, c, b),
            RotationOrder::Yxz => Vec3::new(b, a, c),
            RotationOrder::Yzx => Vec3::new(c, a, b),
            RotationOrder::Zxy => Vec3::new(b, c, a),
            RotationOrder::Zyx => Vec3::new(c, b, a),
        }
    }

    pub fn from_euler(self, angles: Vec3) -> Quat {
        let (a, b, c) = match self {
            RotationOrder::Xyz => (angles.x, angles.y, angles.z),
            RotationOrder::Xzy => (angles.x, angles.z, angles.y),
            RotationOrder::Yxz => (angles.y, angles.x, angles.z),
            RotationOrder::Yzx => (angles.y, angles.z, angles.x),
            RotationOrder::Zxy => (angles.z, angles.x, angles.y),
            RotationOrder::Zyx => (angles.z, angles.y, angles.x),
        };
        Quat::from_euler(self.euler_rot(), a, b, c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParentInterpolation {
    /// Weighted component sum; quaternions are sign-aligned before summing.
    #[default]
    Average,
    /// Parents folded in one at a time by slerp.
    Shortest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParentConstraintSettings {
    pub child: ElementKey,
    /// When empty, the child's weighted parents from the hierarchy are used.
    pub parents: Vec<ConstraintParent>,
    pub maintain_offset: bool,
    pub filter: TransformFilter,
    pub interpolation: ParentInterpolation,
    pub rotation_order: RotationOrder,
    pub weight: f32,
    pub propagate_to_children: bool,
}

impl Default for ParentConstraintSettings {
    fn default() -> Self {
        Self {
            child: ElementKey::default(),
            parents: Vec::new(),
            maintain_offset: true,
            filter: TransformFilter::default(),
            interpolation: ParentInterpolation::Average,
            rotation_order: RotationOrder::default(),
            weight: 1.0,
            propagate_to_children: true,
        }
    }
}

/// Blends several parent transforms into the child's pose.
#[derive(Debug, Clone, Default)]
pub struct ParentConstraint {
    pub settings: ParentConstraintSettings,
    child: CachedElement,
    parent_caches: Vec<CachedElement>,
    parents: Vec<ParentWeight>,
}

impl ParentConstraint {
    pub fn new(settings: ParentConstraintSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }
}

/// Mixes weighted transforms. Weights must already be normalized.
pub fn blend_parent_transforms(
    parents: impl IntoIterator<Item = (Transform, f32)>,
    interpolation: ParentInterpolation,
) -> Option<Transform> {
    let mut mixed: Option<Transform> = None;
    let mut accumulated = 0.0;

    for (transform, weight) in parents {
        accumulated += weight;
        let Some(current) = mixed.as_mut() else {
            mixed = Some(match interpolation {
                ParentInterpolation::Average => Transform::new(
                    transform.position * weight,
                    transform.rotation * weight,
                    transform.scale * weight,
                ),
                ParentInterpolation::Shortest => transform,
            });
            continue;
        };

        match interpolation {
            ParentInterpolation::Average => {
                current.position += transform.position * weight;
                current.scale += transform.scale * weight;
                let rotation = if current.rotation.dot(transform.rotation) < 0.0 {
                    -transform.rotation
                } else {
                    transform.rotation
                };
                current.rotation = current.rotation + rotation * weight;
            }
            ParentInterpolation::Shortest => {
                let alpha = if accumulated > KINDA_SMALL_NUMBER {
                    weight / accumulated
                } else {
                    0.0
                };
                current.position = current.position.lerp(transform.position, alpha);
                current.scale = current.scale.lerp(transform.scale, alpha);
                current.rotation = current.rotation.slerp(transform.rotation, weight);
            }
        }
    }

    mixed.map(Transform::normalized)
}

impl Solve for ParentConstraint {
    fn solve(&mut self, ctx: &mut ExecuteContext<'_>) -> SolveOutcome {
        let settings = &self.settings;
        let weight = settings.weight.clamp(0.0, 1.0);
        if weight < KINDA_SMALL_NUMBER {
            return SolveOutcome::Skipped;
        }

        let Some(child) = ctx.resolve(&mut self.child, &settings.child) else {
            return SolveOutcome::Skipped;
        };
        gather_parents(ctx, child, &settings.parents, &mut self.parent_caches, &mut self.parents);
        if self.parents.is_empty() {
            return SolveOutcome::Skipped;
        }

        let child_initial = ctx.hierarchy.initial_global_transform(child);
        let mut offset_parents = Vec::with_capacity(self.parents.len());
        for parent in &self.parents {
            let mut transform = ctx.hierarchy.global_transform(parent.index);
            if settings.maintain_offset {
                let parent_initial = ctx.hierarchy.initial_global_transform(parent.index);
                let offset = child_initial.relative_to(&parent_initial);
                transform = transform.mul_transform(&offset);
            }
            offset_parents.push((transform, parent.weight));
        }

        let Some(mixed_global) = blend_parent_transforms(offset_parents, settings.interpolation) else {
            return SolveOutcome::Skipped;
        };

        let parent_global = ctx.hierarchy.parent_transform(child, Pose::Current);
        let child_local = ctx.hierarchy.local_transform(child);
        let mut mixed_local = mixed_global.relative_to(&parent_global);

        let filter = &settings.filter;
        mixed_local.position = filter.translation.apply(child_local.position, mixed_local.position);
        mixed_local.rotation =
            filter
                .rotation
                .apply_rotation(child_local.rotation, mixed_local.rotation, settings.rotation_order);
        mixed_local.scale = filter.scale.apply(child_local.scale, mixed_local.scale);

        if weight < 1.0 - KINDA_SMALL_NUMBER {
            mixed_local = child_local.lerp(&mixed_local, weight);
        }

        ctx.hierarchy
            .set_local_transform(child, mixed_local, settings.propagate_to_children);
        SolveOutcome::Solved
    }
}
