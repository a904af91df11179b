use serde::{Deserialize, Serialize};

use super::TargetKind;
use crate::config::SolverConfig;
use crate::context::{Color, DebugSettings, ExecuteContext, SolverWarning};
use crate::hierarchy::{CachedElement, ElementKey};
use crate::math::{
    is_nearly_zero, rotation_between, rotation_between_or_flip, slerp_direction, Quat, Transform,
    Vec3, SMALL_NUMBER,
};
use crate::solver::{Solve, SolveOutcome};

const PRIMARY_COLOR: Color = [0.0, 1.0, 1.0, 1.0];
const SECONDARY_COLOR: Color = [0.0, 0.2, 1.0, 1.0];

/// An axis of the aimed element and where it should point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimTarget {
    pub weight: f32,
    /// Axis in the element's own space.
    pub axis: Vec3,
    pub target: Vec3,
    pub kind: TargetKind,
    /// Optional element the target is expressed in.
    pub space: ElementKey,
}

impl Default for AimTarget {
    fn default() -> Self {
        Self::primary()
    }
}

impl AimTarget {
    pub fn primary() -> Self {
        Self {
            weight: 1.0,
            axis: Vec3::X,
            target: Vec3::X,
            kind: TargetKind::Location,
            space: ElementKey::default(),
        }
    }

    pub fn secondary() -> Self {
        Self {
            weight: 1.0,
            axis: Vec3::Z,
            target: Vec3::Z,
            kind: TargetKind::Direction,
            space: ElementKey::default(),
        }
    }

    pub fn location(axis: Vec3, target: Vec3) -> Self {
        Self {
            axis,
            target,
            kind: TargetKind::Location,
            ..Self::primary()
        }
    }

    pub fn direction(axis: Vec3, target: Vec3) -> Self {
        Self {
            axis,
            target,
            kind: TargetKind::Direction,
            ..Self::primary()
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }
}

/// Which sub-solves were skipped because their target or axis was degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AimReport {
    pub primary_invalid: bool,
    pub secondary_invalid: bool,
}

/// Rotates `input` so `primary.axis` points at the primary target and, within
/// that constraint, `secondary.axis` points at the secondary target.
///
/// Targets are taken as world space; their `space` is not consulted.
pub fn aim_transform(input: &Transform, primary: &AimTarget, secondary: &AimTarget, weight: f32) -> (Transform, AimReport) {
    let mut result = *input;
    let mut report = AimReport::default();

    if weight <= SMALL_NUMBER || (primary.weight <= SMALL_NUMBER && secondary.weight <= SMALL_NUMBER) {
        return (result, report);
    }

    if primary.weight > SMALL_NUMBER {
        let target = relative_target(&result, primary);
        if is_nearly_zero(target) || is_nearly_zero(primary.axis) {
            report.primary_invalid = true;
        } else {
            let axis = result.transform_vector_no_scale(primary.axis).normalize();
            let target = weighted_target(axis, target, primary.weight * weight);
            result.rotation = (rotation_between(axis, target) * result.rotation).normalize();
        }
    }

    if secondary.weight > SMALL_NUMBER {
        let primary_axis = (!is_nearly_zero(primary.axis))
            .then(|| result.transform_vector_no_scale(primary.axis).normalize());
        let remove_primary = |v: Vec3| match primary_axis {
            Some(p) => v - p * v.dot(p),
            None => v,
        };

        let target = remove_primary(relative_target(&result, secondary));
        let axis = remove_primary(result.transform_vector_no_scale(secondary.axis));
        if is_nearly_zero(target) || is_nearly_zero(axis) {
            report.secondary_invalid = true;
        } else {
            // Weight the full roll so a half turn stays about the primary axis.
            let mut rotation = match primary_axis {
                Some(flip_axis) => rotation_between_or_flip(axis, target, flip_axis),
                None => rotation_between(axis, target),
            };
            let secondary_weight = secondary.weight * weight;
            if secondary_weight < 1.0 - SMALL_NUMBER {
                rotation = Quat::IDENTITY.slerp(rotation, secondary_weight);
            }
            result.rotation = (rotation * result.rotation).normalize();
        }
    }

    (result, report)
}

fn relative_target(transform: &Transform, target: &AimTarget) -> Vec3 {
    match target.kind {
        TargetKind::Direction => target.target,
        TargetKind::Location => target.target - transform.position,
    }
}

/// The weight moves the target toward the axis rather than scaling the rotation.
fn weighted_target(axis: Vec3, target: Vec3, weight: f32) -> Vec3 {
    if weight < 1.0 - SMALL_NUMBER {
        slerp_direction(axis, target, weight)
    } else {
        target.normalize()
    }
}

/// Resolves both targets' spaces, draws debug primitives and reports invalid
/// targets around [`aim_transform`].
pub(crate) fn solve_aim(
    ctx: &mut ExecuteContext<'_>,
    input: &Transform,
    primary: &AimTarget,
    secondary: &AimTarget,
    weight: f32,
    debug: &DebugSettings,
    spaces: &mut [CachedElement; 2],
) -> Transform {
    let [primary_space, secondary_space] = spaces;
    let primary = to_world(ctx, primary, primary_space);
    let secondary = to_world(ctx, secondary, secondary_space);

    if let Some(draw) = ctx.debug_draw(debug) {
        let origin = input.position;
        for (target, color) in [(&primary, PRIMARY_COLOR), (&secondary, SECONDARY_COLOR)] {
            if target.weight <= SMALL_NUMBER {
                continue;
            }
            match target.kind {
                TargetKind::Direction => {
                    draw.draw_line(&debug.world_offset, origin, origin + target.target * debug.scale, color);
                }
                TargetKind::Location => {
                    draw.draw_line(&debug.world_offset, origin, target.target, color);
                    let marker = Transform::new(target.target, Quat::IDENTITY, Vec3::splat(debug.scale * 0.1));
                    draw.draw_box(&debug.world_offset, &marker, color);
                }
            }
        }
    }

    let (result, report) = aim_transform(input, &primary, &secondary, weight);
    if report.primary_invalid {
        ctx.warn(SolverWarning::InvalidPrimaryTarget);
    }
    if report.secondary_invalid {
        ctx.warn(SolverWarning::InvalidSecondaryTarget);
    }
    result
}

fn to_world(ctx: &mut ExecuteContext<'_>, target: &AimTarget, space: &mut CachedElement) -> AimTarget {
    let mut resolved = target.clone();
    if target.weight <= SMALL_NUMBER {
        return resolved;
    }
    if let Some(index) = ctx.resolve_optional(space, &target.space) {
        let space = ctx.hierarchy.global_transform(index);
        resolved.target = target.kind.to_world(&space, target.target);
    }
    resolved
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimItemSettings {
    pub item: ElementKey,
    pub primary: AimTarget,
    pub secondary: AimTarget,
    pub weight: f32,
    pub propagate_to_children: bool,
    pub debug: DebugSettings,
}

impl Default for AimItemSettings {
    fn default() -> Self {
        Self {
            item: ElementKey::default(),
            primary: AimTarget::primary(),
            secondary: AimTarget::secondary(),
            weight: 1.0,
            propagate_to_children: true,
            debug: DebugSettings::default(),
        }
    }
}

impl AimItemSettings {
    pub fn from_config(config: &SolverConfig) -> Self {
        let aim = &config.aim;
        let mut settings = Self {
            weight: aim.weight,
            propagate_to_children: aim.propagate_to_children,
            debug: config.debug,
            ..Self::default()
        };
        settings.primary.axis = aim.primary_axis;
        settings.secondary.axis = aim.secondary_axis;
        settings
    }
}

/// Aims one hierarchy element, writing its global transform.
#[derive(Debug, Clone, Default)]
pub struct AimItem {
    pub settings: AimItemSettings,
    item: CachedElement,
    spaces: [CachedElement; 2],
}

impl AimItem {
    pub fn new(settings: AimItemSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }
}

impl Solve for AimItem {
    fn solve(&mut self, ctx: &mut ExecuteContext<'_>) -> SolveOutcome {
        let settings = &self.settings;
        let Some(index) = ctx.resolve(&mut self.item, &settings.item) else {
            return SolveOutcome::Skipped;
        };

        let weight = settings.weight.clamp(0.0, 1.0);
        if weight <= SMALL_NUMBER
            || (settings.primary.weight <= SMALL_NUMBER && settings.secondary.weight <= SMALL_NUMBER)
        {
            return SolveOutcome::Skipped;
        }

        let input = ctx.hierarchy.global_transform(index);
        let result = solve_aim(
            ctx,
            &input,
            &settings.primary,
            &settings.secondary,
            weight,
            &settings.debug,
            &mut self.spaces,
        );
        ctx.hierarchy
            .set_global_transform(index, result, settings.propagate_to_children);
        SolveOutcome::Solved
    }
}
