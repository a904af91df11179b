use serde::{Deserialize, Serialize};

use super::aim::{aim_transform, solve_aim, AimTarget};
use super::parent::{AxisFilter, RotationOrder};
use super::{gather_parents, TargetKind};
use crate::context::{DebugSettings, ExecuteContext};
use crate::hierarchy::{CachedElement, ElementKey, ParentWeight, Pose};
use crate::math::{Quat, Vec3, KINDA_SMALL_NUMBER};
use crate::solver::{Solve, SolveOutcome};

/// One weighted parent of a constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintParent {
    pub item: ElementKey,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

impl ConstraintParent {
    pub fn new(item: ElementKey, weight: f32) -> Self {
        Self { item, weight }
    }
}

/// The target the up axis is rolled toward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldUp {
    pub target: Vec3,
    pub kind: TargetKind,
    pub space: ElementKey,
}

impl Default for WorldUp {
    fn default() -> Self {
        Self {
            target: Vec3::Z,
            kind: TargetKind::Direction,
            space: ElementKey::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimConstraintSettings {
    pub child: ElementKey,
    /// When empty, the child's weighted parents from the hierarchy are used.
    pub parents: Vec<ConstraintParent>,
    pub maintain_offset: bool,
    pub aim_axis: Vec3,
    pub up_axis: Vec3,
    pub world_up: WorldUp,
    pub filter: AxisFilter,
    pub rotation_order: RotationOrder,
    pub weight: f32,
    pub propagate_to_children: bool,
    pub debug: DebugSettings,
}

impl Default for AimConstraintSettings {
    fn default() -> Self {
        Self {
            child: ElementKey::default(),
            parents: Vec::new(),
            maintain_offset: false,
            aim_axis: Vec3::X,
            up_axis: Vec3::Z,
            world_up: WorldUp::default(),
            filter: AxisFilter::default(),
            rotation_order: RotationOrder::default(),
            weight: 1.0,
            propagate_to_children: true,
            debug: DebugSettings::default(),
        }
    }
}

impl AimConstraintSettings {
    fn secondary(&self) -> AimTarget {
        AimTarget {
            weight: 1.0,
            axis: self.up_axis,
            target: self.world_up.target,
            kind: self.world_up.kind,
            space: self.world_up.space.clone(),
        }
    }
}

/// Rotates the child so its aim axis points at the weighted mix of its
/// parents' positions.
#[derive(Debug, Clone, Default)]
pub struct AimConstraint {
    pub settings: AimConstraintSettings,
    child: CachedElement,
    parent_caches: Vec<CachedElement>,
    parents: Vec<ParentWeight>,
    spaces: [CachedElement; 2],
    offset: Option<Quat>,
    offset_child: Option<usize>,
}

impl AimConstraint {
    pub fn new(settings: AimConstraintSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Local rotation offset captured from the initial pose, once computed.
    pub fn offset(&self) -> Option<Quat> {
        self.offset
    }

    fn mixed_position(&self, ctx: &mut ExecuteContext<'_>, pose: Pose) -> Vec3 {
        self.parents.iter().fold(Vec3::ZERO, |sum, parent| {
            let transform = match pose {
                Pose::Current => ctx.hierarchy.global_transform(parent.index),
                Pose::Initial => ctx.hierarchy.initial_global_transform(parent.index),
            };
            sum + transform.position * parent.weight
        })
    }

    fn compute_offset(&mut self, ctx: &mut ExecuteContext<'_>, child: usize) -> Quat {
        let settings = &self.settings;
        let primary = AimTarget::location(settings.aim_axis, self.mixed_position(ctx, Pose::Initial));

        let mut secondary = settings.secondary();
        if let Some(space) = ctx.resolve_optional(&mut self.spaces[1], &settings.world_up.space) {
            let space = ctx.hierarchy.initial_global_transform(space);
            secondary.target = secondary.kind.to_world(&space, secondary.target);
        }

        let child_initial = ctx.hierarchy.initial_global_transform(child);
        let (aimed, _) = aim_transform(&child_initial, &primary, &secondary, 1.0);

        let parent_initial = ctx.hierarchy.parent_transform(child, Pose::Initial);
        let mixed_local = parent_initial.rotation.inverse() * aimed.rotation;
        let child_local = ctx.hierarchy.initial_local_transform(child).rotation;
        (mixed_local.inverse() * child_local).normalize()
    }
}

impl Solve for AimConstraint {
    fn solve(&mut self, ctx: &mut ExecuteContext<'_>) -> SolveOutcome {
        let weight = self.settings.weight.clamp(0.0, 1.0);
        if weight < KINDA_SMALL_NUMBER {
            return SolveOutcome::Skipped;
        }

        let Some(child) = ctx.resolve(&mut self.child, &self.settings.child) else {
            return SolveOutcome::Skipped;
        };
        let rebuilt = gather_parents(
            ctx,
            child,
            &self.settings.parents,
            &mut self.parent_caches,
            &mut self.parents,
        );
        if rebuilt || self.offset_child != Some(child) || !self.settings.maintain_offset {
            self.offset = None;
        }
        if self.parents.is_empty() {
            return SolveOutcome::Skipped;
        }

        if self.settings.maintain_offset && self.offset.is_none() {
            let offset = self.compute_offset(ctx, child);
            log::debug!("aim constraint offset for {} captured", self.settings.child);
            self.offset = Some(offset);
            self.offset_child = Some(child);
        }

        let primary = AimTarget::location(self.settings.aim_axis, self.mixed_position(ctx, Pose::Current));
        let secondary = self.settings.secondary();
        let child_global = ctx.hierarchy.global_transform(child);
        let aimed = solve_aim(
            ctx,
            &child_global,
            &primary,
            &secondary,
            1.0,
            &self.settings.debug,
            &mut self.spaces,
        );

        let parent_global = ctx.hierarchy.parent_transform(child, Pose::Current);
        let mut mixed = parent_global.rotation.inverse() * aimed.rotation;
        if let Some(offset) = self.offset {
            mixed = mixed * offset;
        }

        let child_local = ctx.hierarchy.local_transform(child);
        let settings = &self.settings;
        let mut rotation = settings
            .filter
            .apply_rotation(child_local.rotation, mixed.normalize(), settings.rotation_order);
        if weight < 1.0 - KINDA_SMALL_NUMBER {
            rotation = child_local.rotation.slerp(rotation, weight).normalize();
        }

        ctx.hierarchy.set_local_transform(
            child,
            child_local.with_rotation(rotation),
            settings.propagate_to_children,
        );
        SolveOutcome::Solved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CollectWarnings;
    use crate::hierarchy::{Hierarchy, Space};
    use crate::math::Transform;

    fn rig() -> Hierarchy {
        let mut h = Hierarchy::new();
        let child = ElementKey::bone("child");
        h.add_element(child.clone(), None, Transform::IDENTITY, Space::Global)
            .unwrap();
        h.add_element(
            ElementKey::bone("child_target"),
            Some(&child),
            Transform::from_position(Vec3::new(0.0, 10.0, 0.0)),
            Space::Local,
        )
        .unwrap();
        for (name, x) in [("parent1", 10.0), ("parent2", -10.0)] {
            h.add_element(
                ElementKey::bone(name),
                None,
                Transform::from_position(Vec3::new(x, 10.0, 10.0)),
                Space::Global,
            )
            .unwrap();
        }
        h
    }

    fn constraint(maintain_offset: bool) -> AimConstraint {
        AimConstraint::new(AimConstraintSettings {
            child: ElementKey::bone("child"),
            parents: vec![
                ConstraintParent::new(ElementKey::bone("parent1"), 1.0),
                ConstraintParent::new(ElementKey::bone("parent2"), 1.0),
            ],
            maintain_offset,
            aim_axis: Vec3::Y,
            up_axis: Vec3::Z,
            ..AimConstraintSettings::default()
        })
    }

    fn target_position(h: &mut Hierarchy) -> Vec3 {
        h.global_transform_by_key(&ElementKey::bone("child_target")).position
    }

    #[test]
    fn aims_at_the_mixed_parent_position() {
        let mut h = rig();
        let mut solver = constraint(false);
        let mut sink = CollectWarnings::default();
        assert_eq!(solver.solve(&mut ExecuteContext::new(&mut h, &mut sink)), SolveOutcome::Solved);
        assert!(target_position(&mut h).abs_diff_eq(Vec3::new(0.0, 7.071, 7.071), 1e-3));
        assert!(sink.warnings.is_empty());
    }

    #[test]
    fn maintain_offset_only_applies_the_change() {
        let mut h = rig();
        for name in ["parent1", "parent2"] {
            let key = ElementKey::bone(name);
            let mut transform = h.global_transform_by_key(&key);
            transform.position.z = 20.0;
            h.set_global_transform_by_key(&key, transform, true).unwrap();
        }

        let mut solver = constraint(true);
        let mut sink = CollectWarnings::default();
        solver.solve(&mut ExecuteContext::new(&mut h, &mut sink));
        assert!(target_position(&mut h).abs_diff_eq(Vec3::new(0.0, 9.487, 3.162), 1e-3));
        assert!(solver.offset().is_some());
    }

    #[test]
    fn maintain_offset_does_not_snap_at_rest() {
        let mut h = rig();
        let mut solver = constraint(true);
        let mut sink = CollectWarnings::default();
        solver.solve(&mut ExecuteContext::new(&mut h, &mut sink));
        assert!(target_position(&mut h).abs_diff_eq(Vec3::new(0.0, 10.0, 0.0), 1e-3));
    }

    #[test]
    fn offset_is_recomputed_when_parents_change() {
        let mut h = rig();
        let mut solver = constraint(true);
        let mut sink = CollectWarnings::default();
        solver.solve(&mut ExecuteContext::new(&mut h, &mut sink));
        let first = solver.offset().unwrap();

        solver.settings.parents.truncate(1);
        solver.solve(&mut ExecuteContext::new(&mut h, &mut sink));
        let second = solver.offset().unwrap();
        assert!(!first.abs_diff_eq(second, 1e-4));
    }

    #[test]
    fn zero_weight_leaves_the_pose_alone() {
        let mut h = rig();
        let mut solver = constraint(false);
        solver.settings.weight = 0.0;
        let mut sink = CollectWarnings::default();
        assert_eq!(solver.solve(&mut ExecuteContext::new(&mut h, &mut sink)), SolveOutcome::Skipped);
        assert!(target_position(&mut h).abs_diff_eq(Vec3::new(0.0, 10.0, 0.0), 1e-6));
    }
}
