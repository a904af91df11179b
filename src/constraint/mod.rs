//! Orientation and multi-parent constraints.

pub mod aim;
pub mod aim_constraint;
pub mod parent;

pub use aim::{aim_transform, AimItem, AimItemSettings, AimTarget};
pub use aim_constraint::{AimConstraint, AimConstraintSettings, ConstraintParent, WorldUp};
pub use parent::{
    blend_parent_transforms, AxisFilter, ParentConstraint, ParentConstraintSettings,
    ParentInterpolation, RotationOrder, TransformFilter,
};

use serde::{Deserialize, Serialize};

use crate::context::ExecuteContext;
use crate::hierarchy::{CachedElement, ParentWeight};
use crate::math::{Transform, Vec3, KINDA_SMALL_NUMBER};

/// How a target vector is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// A direction; a space only rotates it.
    Direction,
    /// A point; a space fully transforms it (ignoring scale).
    Location,
}

impl TargetKind {
    /// Moves `target` from `space` into world space.
    pub fn to_world(self, space: &Transform, target: Vec3) -> Vec3 {
        match self {
            TargetKind::Direction => space.transform_vector_no_scale(target),
            TargetKind::Location => space.transform_point_no_scale(target),
        }
    }
}

/// Normalizes `weights` in place so the entries above `threshold` sum to one.
/// Negative values clamp to zero and entries at or below `threshold` become
/// zero. Returns false when nothing is left to normalize.
pub(crate) fn normalize_weights(weights: &mut [f32], threshold: f32) -> bool {
    let mut total = 0.0;
    for weight in weights.iter_mut() {
        *weight = weight.max(0.0);
        if *weight <= threshold {
            *weight = 0.0;
        }
        total += *weight;
    }
    if total <= threshold {
        return false;
    }
    for weight in weights.iter_mut() {
        *weight /= total;
    }
    true
}

/// Resolves the parents a constraint blends, with normalized weights.
///
/// An explicit list is resolved through `caches`; an empty list falls back
/// to the child's weighted parents in the hierarchy. Parents whose weight
/// rounds to zero are dropped. Returns true when the cache list was rebuilt.
pub(crate) fn gather_parents(
    ctx: &mut ExecuteContext<'_>,
    child: usize,
    listed: &[ConstraintParent],
    caches: &mut Vec<CachedElement>,
    out: &mut Vec<ParentWeight>,
) -> bool {
    out.clear();
    let mut rebuilt = false;

    if listed.is_empty() {
        if !caches.is_empty() {
            caches.clear();
            rebuilt = true;
        }
        if let Some(element) = ctx.hierarchy.element(child) {
            out.extend(element.weighted_parents().iter().copied());
        }
    } else {
        if caches.len() != listed.len() {
            caches.clear();
            caches.extend(listed.iter().map(|p| CachedElement::new(p.item.clone())));
            rebuilt = true;
        }
        for (parent, cache) in listed.iter().zip(caches.iter_mut()) {
            if let Some(index) = ctx.resolve(cache, &parent.item) {
                out.push(ParentWeight {
                    index,
                    weight: parent.weight,
                });
            }
        }
    }

    let mut weights: Vec<f32> = out.iter().map(|p| p.weight).collect();
    if !normalize_weights(&mut weights, KINDA_SMALL_NUMBER) {
        out.clear();
        return rebuilt;
    }
    for (parent, weight) in out.iter_mut().zip(weights) {
        parent.weight = weight;
    }
    out.retain(|p| p.weight > 0.0);
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn weights_normalize_and_drop_negatives() {
        let mut weights = [2.0, -1.0, 0.0, 2.0];
        assert!(normalize_weights(&mut weights, 1e-4));
        assert_relative_eq!(weights[0], 0.5);
        assert_relative_eq!(weights[1], 0.0);
        assert_relative_eq!(weights[3], 0.5);

        let mut nothing = [0.0, -3.0];
        assert!(!normalize_weights(&mut nothing, 1e-4));
    }
}
