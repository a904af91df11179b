use serde::{Deserialize, Serialize};

use super::blend_chain;
use crate::config::SolverConfig;
use crate::constraint::TargetKind;
use crate::context::{Color, DebugSettings, ExecuteContext, SolverWarning};
use crate::hierarchy::{CachedElement, ElementKey, Hierarchy};
use crate::math::{
    is_nearly_zero, rotation_between, rotation_between_or_flip, Quat, Transform, Vec3,
    KINDA_SMALL_NUMBER, SMALL_NUMBER,
};
use crate::solver::{Solve, SolveOutcome};

const BONE_COLOR: Color = [0.0, 0.2, 1.0, 1.0];
const POLE_COLOR: Color = [0.0, 1.0, 1.0, 1.0];

/// Segment lengths, alignment axes and stretch behaviour for a two-bone solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoBoneParams {
    pub length_a: f32,
    pub length_b: f32,
    pub primary_axis: Vec3,
    pub secondary_axis: Vec3,
    pub secondary_axis_weight: f32,
    pub enable_stretch: bool,
    pub stretch_start_ratio: f32,
    pub stretch_maximum_ratio: f32,
}

impl Default for TwoBoneParams {
    fn default() -> Self {
        Self {
            length_a: 0.0,
            length_b: 0.0,
            primary_axis: Vec3::X,
            secondary_axis: Vec3::Y,
            secondary_axis_weight: 1.0,
            enable_stretch: false,
            stretch_start_ratio: 0.75,
            stretch_maximum_ratio: 1.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoBonePositions {
    pub elbow: Vec3,
    pub effector: Vec3,
    /// The pole coincided with the root, so the bend plane was picked arbitrarily.
    pub pole_degenerate: bool,
}

/// Solves the elbow and effector positions of a two-segment limb rooted at
/// `root`, bending toward `pole` (a world-space point).
pub fn solve_two_bone_positions(root: Vec3, pole: Vec3, target: Vec3, params: &TwoBoneParams) -> TwoBonePositions {
    let mut upper = params.length_a;
    let mut lower = params.length_b;

    let delta = target - root;
    let mut distance = delta.length();
    let desired_dir = if distance < KINDA_SMALL_NUMBER {
        distance = KINDA_SMALL_NUMBER;
        Vec3::X
    } else {
        delta / distance
    };

    let pole_delta = pole - root;
    let pole_degenerate = is_nearly_zero(pole_delta);
    let planar = pole_delta - desired_dir * pole_delta.dot(desired_dir);
    let bend_dir = if pole_degenerate || is_nearly_zero(planar) {
        desired_dir.any_orthonormal_pair().1
    } else {
        planar.normalize()
    };

    let mut max_length = upper + lower;
    if params.enable_stretch {
        let range = params.stretch_maximum_ratio - params.stretch_start_ratio;
        if range > KINDA_SMALL_NUMBER && max_length > KINDA_SMALL_NUMBER {
            let reach = distance / max_length;
            let scale = (params.stretch_maximum_ratio - 1.0)
                * ((reach - params.stretch_start_ratio) / range).clamp(0.0, 1.0);
            if scale > KINDA_SMALL_NUMBER {
                upper *= 1.0 + scale;
                lower *= 1.0 + scale;
                max_length *= 1.0 + scale;
            }
        }
    }

    if distance >= max_length {
        return TwoBonePositions {
            elbow: root + desired_dir * upper,
            effector: root + desired_dir * max_length,
            pole_degenerate,
        };
    }

    // keep the triangle solvable when the target is too close to the root
    let distance = distance.max((upper - lower).abs() + KINDA_SMALL_NUMBER).min(max_length);

    let two_ab = 2.0 * upper * distance;
    let cos_angle = if two_ab > SMALL_NUMBER {
        ((upper * upper + distance * distance - lower * lower) / two_ab).clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let angle = cos_angle.acos();
    let line_distance = upper * angle.sin();
    let projected_distance = upper * cos_angle;

    TwoBonePositions {
        elbow: root + desired_dir * projected_distance + bend_dir * line_distance,
        effector: root + desired_dir * distance,
        pole_degenerate,
    }
}

/// Solves bone A, bone B and the effector in place.
///
/// Positions come from [`solve_two_bone_positions`]. Each bone's primary axis
/// is then aimed at its child and its secondary axis rolled toward the pole,
/// unless the pole is degenerate.
pub fn solve_two_bone_transforms(
    bone_a: &mut Transform,
    bone_b: &mut Transform,
    effector: &mut Transform,
    pole: Vec3,
    params: &TwoBoneParams,
) -> TwoBonePositions {
    let solved = solve_two_bone_positions(bone_a.position, pole, effector.position, params);
    bone_b.position = solved.elbow;
    effector.position = solved.effector;

    let roll_to_pole = !solved.pole_degenerate;
    align_bone(bone_a, solved.elbow, pole, params, roll_to_pole);
    align_bone(bone_b, solved.effector, pole, params, roll_to_pole);
    solved
}

fn align_bone(bone: &mut Transform, child: Vec3, pole: Vec3, params: &TwoBoneParams, roll_to_pole: bool) {
    let target = child - bone.position;
    let axis = bone.transform_vector_no_scale(params.primary_axis);
    if is_nearly_zero(target) || is_nearly_zero(axis) {
        return;
    }
    bone.rotation = (rotation_between(axis, target) * bone.rotation).normalize();

    if !roll_to_pole || params.secondary_axis_weight <= SMALL_NUMBER {
        return;
    }

    let primary = bone.transform_vector_no_scale(params.primary_axis).normalize_or_zero();
    let axis = bone.transform_vector_no_scale(params.secondary_axis);
    let axis = axis - primary * axis.dot(primary);
    let to_pole = pole - bone.position;
    let target = to_pole - primary * to_pole.dot(primary);
    if is_nearly_zero(target) || is_nearly_zero(axis) {
        return;
    }

    let mut rotation = rotation_between_or_flip(axis, target, primary);
    if params.secondary_axis_weight < 1.0 - SMALL_NUMBER {
        rotation = Quat::IDENTITY.slerp(rotation, params.secondary_axis_weight);
    }
    bone.rotation = (rotation * bone.rotation).normalize();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoBoneIkSettings {
    pub item_a: ElementKey,
    pub item_b: ElementKey,
    /// Optional. When set it receives the solved effector transform and lets
    /// the length of bone B be derived from the initial pose.
    pub effector_item: ElementKey,
    pub effector: Transform,
    pub primary_axis: Vec3,
    pub secondary_axis: Vec3,
    pub secondary_axis_weight: f32,
    pub pole_vector: Vec3,
    pub pole_vector_kind: TargetKind,
    pub pole_vector_space: ElementKey,
    pub enable_stretch: bool,
    pub stretch_start_ratio: f32,
    pub stretch_maximum_ratio: f32,
    pub weight: f32,
    /// Zero derives the length from the initial pose.
    pub item_a_length: f32,
    pub item_b_length: f32,
    pub propagate_to_children: bool,
    pub debug: DebugSettings,
}

impl Default for TwoBoneIkSettings {
    fn default() -> Self {
        let params = TwoBoneParams::default();
        Self {
            item_a: ElementKey::default(),
            item_b: ElementKey::default(),
            effector_item: ElementKey::default(),
            effector: Transform::IDENTITY,
            primary_axis: params.primary_axis,
            secondary_axis: params.secondary_axis,
            secondary_axis_weight: params.secondary_axis_weight,
            pole_vector: Vec3::Z,
            pole_vector_kind: TargetKind::Direction,
            pole_vector_space: ElementKey::default(),
            enable_stretch: params.enable_stretch,
            stretch_start_ratio: params.stretch_start_ratio,
            stretch_maximum_ratio: params.stretch_maximum_ratio,
            weight: 1.0,
            item_a_length: 0.0,
            item_b_length: 0.0,
            propagate_to_children: true,
            debug: DebugSettings::default(),
        }
    }
}

impl TwoBoneIkSettings {
    pub fn from_config(config: &SolverConfig) -> Self {
        let two_bone = &config.two_bone;
        Self {
            primary_axis: two_bone.primary_axis,
            secondary_axis: two_bone.secondary_axis,
            secondary_axis_weight: two_bone.secondary_axis_weight,
            enable_stretch: two_bone.enable_stretch,
            stretch_start_ratio: two_bone.stretch_start_ratio,
            stretch_maximum_ratio: two_bone.stretch_maximum_ratio,
            propagate_to_children: two_bone.propagate_to_children,
            debug: config.debug,
            ..Self::default()
        }
    }

    fn params(&self, length_a: f32, length_b: f32) -> TwoBoneParams {
        TwoBoneParams {
            length_a,
            length_b,
            primary_axis: self.primary_axis,
            secondary_axis: self.secondary_axis,
            secondary_axis_weight: self.secondary_axis_weight.clamp(0.0, 1.0),
            enable_stretch: self.enable_stretch,
            stretch_start_ratio: self.stretch_start_ratio,
            stretch_maximum_ratio: self.stretch_maximum_ratio,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct TwoBoneWorkData {
    item_a: CachedElement,
    item_b: CachedElement,
    effector_item: CachedElement,
    pole_space: CachedElement,
}

/// Two-bone IK against hierarchy elements.
#[derive(Debug, Clone, Default)]
pub struct TwoBoneIk {
    pub settings: TwoBoneIkSettings,
    work: TwoBoneWorkData,
}

impl TwoBoneIk {
    pub fn new(settings: TwoBoneIkSettings) -> Self {
        Self {
            settings,
            work: TwoBoneWorkData::default(),
        }
    }
}

impl Solve for TwoBoneIk {
    fn solve(&mut self, ctx: &mut ExecuteContext<'_>) -> SolveOutcome {
        let settings = &self.settings;
        let work = &mut self.work;

        let Some(a) = ctx.resolve(&mut work.item_a, &settings.item_a) else {
            return SolveOutcome::Skipped;
        };
        let Some(b) = ctx.resolve(&mut work.item_b, &settings.item_b) else {
            return SolveOutcome::Skipped;
        };
        let effector_index = ctx.resolve_optional(&mut work.effector_item, &settings.effector_item);
        let pole_space = ctx.resolve_optional(&mut work.pole_space, &settings.pole_vector_space);

        let weight = settings.weight.clamp(0.0, 1.0);
        if weight <= SMALL_NUMBER {
            return SolveOutcome::Skipped;
        }

        let pre_a = ctx.hierarchy.global_transform(a);
        let pre_b = ctx.hierarchy.global_transform(b);
        let pre_effector = match effector_index {
            Some(index) => ctx.hierarchy.global_transform(index),
            None => settings.effector,
        };

        let mut length_a = settings.item_a_length;
        let mut length_b = settings.item_b_length;
        if length_a < SMALL_NUMBER {
            length_a = initial_length(ctx.hierarchy, a, b, &pre_a);
        }
        if length_b < SMALL_NUMBER {
            if let Some(effector_index) = effector_index {
                length_b = initial_length(ctx.hierarchy, b, effector_index, &pre_b);
            }
        }
        if length_a < SMALL_NUMBER || length_b < SMALL_NUMBER {
            ctx.warn(SolverWarning::LengthsNotProvided);
            return SolveOutcome::Skipped;
        }

        let mut pole = settings.pole_vector;
        if let Some(space) = pole_space {
            let space = ctx.hierarchy.global_transform(space);
            pole = settings.pole_vector_kind.to_world(&space, pole);
        }
        // a direction pole hangs off bone A, with or without a space
        if settings.pole_vector_kind == TargetKind::Direction {
            pole += pre_a.position;
        }

        let mut bone_a = pre_a;
        let mut bone_b = Transform::new(pre_b.position, pre_a.rotation, pre_b.scale);
        let mut effector = settings.effector;
        let params = settings.params(length_a, length_b);
        let solved = solve_two_bone_transforms(&mut bone_a, &mut bone_b, &mut effector, pole, &params);
        if solved.pole_degenerate {
            ctx.warn(SolverWarning::DegeneratePoleVector);
        }

        if let Some(draw) = ctx.debug_draw(&settings.debug) {
            let offset = settings.debug.world_offset;
            draw.draw_line(&offset, bone_a.position, bone_b.position, BONE_COLOR);
            draw.draw_line(&offset, bone_b.position, effector.position, BONE_COLOR);
            draw.draw_line(&offset, bone_b.position, pole, POLE_COLOR);
            let marker = Transform::new(pole, Quat::IDENTITY, Vec3::splat(settings.debug.scale * 0.1));
            draw.draw_box(&offset, &marker, POLE_COLOR);
        }

        let mut result = [bone_a, bone_b, effector];
        if weight < 1.0 - SMALL_NUMBER {
            blend_chain(&[pre_a, pre_b, pre_effector], &mut result, weight);
        }

        let propagate = settings.propagate_to_children;
        ctx.hierarchy.set_global_transform(a, result[0], propagate);
        ctx.hierarchy.set_global_transform(b, result[1], propagate);
        if let Some(effector_index) = effector_index {
            ctx.hierarchy.set_global_transform(effector_index, result[2], propagate);
        }

        log::debug!(
            "two-bone ik solved {} / {} (lengths {length_a:.3}, {length_b:.3})",
            settings.item_a,
            settings.item_b
        );
        SolveOutcome::Solved
    }
}

/// Initial-pose distance between two elements, scaled by how much `from`
/// has been scaled since.
fn initial_length(hierarchy: &mut Hierarchy, from: usize, to: usize, current_from: &Transform) -> f32 {
    let initial_from = hierarchy.initial_global_transform(from);
    let initial_to = hierarchy.initial_global_transform(to);

    let ratio = |current: f32, initial: f32| {
        if initial.abs() > SMALL_NUMBER {
            current / initial
        } else {
            1.0
        }
    };
    let scale = Vec3::new(
        ratio(current_from.scale.x, initial_from.scale.x),
        ratio(current_from.scale.y, initial_from.scale.y),
        ratio(current_from.scale.z, initial_from.scale.z),
    );
    ((initial_from.position - initial_to.position) * scale).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CollectWarnings, RecordDraw};
    use crate::hierarchy::Space;
    use approx::assert_relative_eq;

    fn params(length_a: f32, length_b: f32) -> TwoBoneParams {
        TwoBoneParams {
            length_a,
            length_b,
            ..TwoBoneParams::default()
        }
    }

    fn limb() -> Hierarchy {
        let mut h = Hierarchy::new();
        let positions = [("upper", Vec3::ZERO), ("lower", Vec3::new(0.0, 10.0, 0.0)), ("hand", Vec3::new(0.0, 20.0, 0.0))];
        let mut parent: Option<ElementKey> = None;
        for (name, position) in positions {
            let key = ElementKey::bone(name);
            h.add_element(key.clone(), parent.as_ref(), Transform::from_position(position), Space::Global)
                .unwrap();
            parent = Some(key);
        }
        h
    }

    #[test]
    fn reachable_target_keeps_bone_lengths() {
        let target = Vec3::new(5.0, 12.0, 3.0);
        let solved = solve_two_bone_positions(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), target, &params(10.0, 8.0));
        assert_relative_eq!(solved.elbow.length(), 10.0, epsilon = 1e-4);
        assert_relative_eq!(solved.elbow.distance(solved.effector), 8.0, epsilon = 1e-4);
        assert!(solved.effector.abs_diff_eq(target, 1e-4));
        assert!(solved.elbow.x > 0.0);
    }

    #[test]
    fn unreachable_target_straightens_the_limb() {
        let solved = solve_two_bone_positions(Vec3::ZERO, Vec3::X, Vec3::new(0.0, 50.0, 0.0), &params(10.0, 10.0));
        assert!(solved.elbow.abs_diff_eq(Vec3::new(0.0, 10.0, 0.0), 1e-5));
        assert!(solved.effector.abs_diff_eq(Vec3::new(0.0, 20.0, 0.0), 1e-5));
    }

    #[test]
    fn stretch_grows_both_segments() {
        let stretchy = TwoBoneParams {
            enable_stretch: true,
            stretch_start_ratio: 1.0,
            stretch_maximum_ratio: 1.5,
            ..params(10.0, 10.0)
        };
        // reach ratio 1.25 is halfway through the stretch range
        let solved = solve_two_bone_positions(Vec3::ZERO, Vec3::X, Vec3::new(0.0, 25.0, 0.0), &stretchy);
        assert_relative_eq!(solved.elbow.y, 12.5, epsilon = 1e-4);
        assert_relative_eq!(solved.effector.y, 25.0, epsilon = 1e-4);
    }

    #[test]
    fn degenerate_pole_still_reaches() {
        let target = Vec3::new(0.0, 12.0, 0.0);
        let solved = solve_two_bone_positions(Vec3::ZERO, Vec3::ZERO, target, &params(10.0, 10.0));
        assert!(solved.pole_degenerate);
        assert!(solved.effector.abs_diff_eq(target, 1e-4));
        assert_relative_eq!(solved.elbow.length(), 10.0, epsilon = 1e-4);
    }

    #[test]
    fn zero_weight_leaves_hierarchy_untouched() {
        let mut h = limb();
        let before: Vec<_> = (0..3).map(|i| h.global_transform(i)).collect();

        let mut solver = TwoBoneIk::new(TwoBoneIkSettings {
            item_a: ElementKey::bone("upper"),
            item_b: ElementKey::bone("lower"),
            effector_item: ElementKey::bone("hand"),
            effector: Transform::from_position(Vec3::new(5.0, 5.0, 0.0)),
            weight: 0.0,
            ..TwoBoneIkSettings::default()
        });
        let mut sink = CollectWarnings::default();
        let outcome = solver.solve(&mut ExecuteContext::new(&mut h, &mut sink));

        assert_eq!(outcome, SolveOutcome::Skipped);
        for (i, expected) in before.iter().enumerate() {
            assert_eq!(h.global_transform(i), *expected);
        }
    }

    #[test]
    fn lengths_come_from_initial_pose() {
        let mut h = limb();
        let target = Vec3::new(12.0, 0.0, 0.0);
        let mut solver = TwoBoneIk::new(TwoBoneIkSettings {
            item_a: ElementKey::bone("upper"),
            item_b: ElementKey::bone("lower"),
            effector_item: ElementKey::bone("hand"),
            effector: Transform::from_position(target),
            pole_vector: Vec3::new(0.0, 0.0, 10.0),
            pole_vector_kind: TargetKind::Location,
            ..TwoBoneIkSettings::default()
        });
        let mut sink = CollectWarnings::default();
        assert_eq!(solver.solve(&mut ExecuteContext::new(&mut h, &mut sink)), SolveOutcome::Solved);
        assert!(sink.warnings.is_empty());

        let elbow = h.global_transform(1).position;
        assert_relative_eq!(elbow.length(), 10.0, epsilon = 1e-3);
        assert!(elbow.z > 0.0);
        assert!(h.global_transform(2).position.abs_diff_eq(target, 1e-3));

        // primary axis of bone A points at the elbow
        let upper = h.global_transform(0);
        assert!((upper.rotation * Vec3::X).abs_diff_eq(elbow.normalize(), 1e-4));
    }

    fn reach_along_x(settings: TwoBoneIkSettings) -> TwoBoneIk {
        TwoBoneIk::new(TwoBoneIkSettings {
            item_a: ElementKey::bone("upper"),
            item_b: ElementKey::bone("lower"),
            effector_item: ElementKey::bone("hand"),
            effector: Transform::from_position(Vec3::new(12.0, 0.0, 0.0)),
            pole_vector: Vec3::new(0.0, 0.0, 10.0),
            pole_vector_kind: TargetKind::Location,
            ..settings
        })
    }

    #[test]
    fn degenerate_pole_warns_through_solver() {
        let mut h = limb();
        let mut solver = reach_along_x(TwoBoneIkSettings {
            pole_vector: Vec3::ZERO,
            pole_vector_kind: TargetKind::Direction,
            ..TwoBoneIkSettings::default()
        });
        let mut sink = CollectWarnings::default();
        assert_eq!(solver.solve(&mut ExecuteContext::new(&mut h, &mut sink)), SolveOutcome::Solved);

        assert_eq!(sink.warnings, vec![SolverWarning::DegeneratePoleVector]);
        assert!(h.global_transform(2).position.abs_diff_eq(Vec3::new(12.0, 0.0, 0.0), 1e-3));
    }

    #[test]
    fn debug_draws_bones_and_pole() {
        let mut h = limb();
        let mut solver = reach_along_x(TwoBoneIkSettings {
            debug: DebugSettings {
                enabled: true,
                ..DebugSettings::default()
            },
            ..TwoBoneIkSettings::default()
        });
        let mut sink = CollectWarnings::default();
        let mut draw = RecordDraw::default();
        solver.solve(&mut ExecuteContext::new(&mut h, &mut sink).with_draw(&mut draw));

        let elbow = h.global_transform(1).position;
        let pole = Vec3::new(0.0, 0.0, 10.0);
        assert_eq!(draw.lines.len(), 3);
        let colors: Vec<_> = draw.lines.iter().map(|line| line.2).collect();
        assert_eq!(colors, vec![BONE_COLOR, BONE_COLOR, POLE_COLOR]);
        assert!(draw.lines[0].0.abs_diff_eq(Vec3::ZERO, 1e-5));
        assert!(draw.lines[0].1.abs_diff_eq(elbow, 1e-4));
        assert!(draw.lines[1].1.abs_diff_eq(Vec3::new(12.0, 0.0, 0.0), 1e-3));
        assert!(draw.lines[2].0.abs_diff_eq(elbow, 1e-4));
        assert!(draw.lines[2].1.abs_diff_eq(pole, 1e-5));

        assert_eq!(draw.boxes.len(), 1);
        let (marker, color) = draw.boxes[0];
        assert_eq!(color, POLE_COLOR);
        assert!(marker.position.abs_diff_eq(pole, 1e-5));
    }

    #[test]
    fn half_weight_keeps_lengths_and_halves_rotation() {
        let mut full = limb();
        let mut sink = CollectWarnings::default();
        reach_along_x(TwoBoneIkSettings::default()).solve(&mut ExecuteContext::new(&mut full, &mut sink));
        let solved_upper = full.global_transform(0).rotation;

        let mut h = limb();
        let pre_upper = h.global_transform(0).rotation;
        let mut solver = reach_along_x(TwoBoneIkSettings {
            weight: 0.5,
            ..TwoBoneIkSettings::default()
        });
        assert_eq!(solver.solve(&mut ExecuteContext::new(&mut h, &mut sink)), SolveOutcome::Solved);

        let upper = h.global_transform(0);
        let lower = h.global_transform(1);
        let hand = h.global_transform(2);
        assert!(upper.position.abs_diff_eq(Vec3::ZERO, 1e-6));
        assert_relative_eq!(lower.position.distance(upper.position), 10.0, epsilon = 1e-3);
        assert_relative_eq!(hand.position.distance(lower.position), 10.0, epsilon = 1e-3);

        let total = pre_upper.angle_between(solved_upper);
        assert!(total > 0.1);
        assert_relative_eq!(pre_upper.angle_between(upper.rotation), total * 0.5, epsilon = 1e-3);
        assert_relative_eq!(upper.rotation.angle_between(solved_upper), total * 0.5, epsilon = 1e-3);
    }

    #[test]
    fn direction_pole_in_space_is_anchored_at_bone_a() {
        let mut h = limb();
        h.add_element(
            ElementKey::null("far"),
            None,
            Transform::from_position(Vec3::new(100.0, 0.0, 0.0)),
            Space::Global,
        )
        .unwrap();

        let mut solver = TwoBoneIk::new(TwoBoneIkSettings {
            item_a: ElementKey::bone("upper"),
            item_b: ElementKey::bone("lower"),
            effector_item: ElementKey::bone("hand"),
            effector: Transform::from_position(Vec3::new(0.0, 15.0, 0.0)),
            pole_vector: Vec3::Z,
            pole_vector_kind: TargetKind::Direction,
            pole_vector_space: ElementKey::null("far"),
            ..TwoBoneIkSettings::default()
        });
        let mut sink = CollectWarnings::default();
        solver.solve(&mut ExecuteContext::new(&mut h, &mut sink));

        // bends toward +Z from the root, not toward the space's position
        let elbow = h.global_transform(1).position;
        assert_relative_eq!(elbow.x, 0.0, epsilon = 1e-3);
        assert_relative_eq!(elbow.y, 7.5, epsilon = 1e-3);
        assert_relative_eq!(elbow.z, (100.0f32 - 56.25).sqrt(), epsilon = 1e-3);
    }

    #[test]
    fn missing_lengths_warn_and_no_op() {
        let mut h = limb();
        let mut solver = TwoBoneIk::new(TwoBoneIkSettings {
            item_a: ElementKey::bone("upper"),
            item_b: ElementKey::bone("lower"),
            effector: Transform::from_position(Vec3::new(5.0, 5.0, 0.0)),
            ..TwoBoneIkSettings::default()
        });
        let mut sink = CollectWarnings::default();
        let outcome = solver.solve(&mut ExecuteContext::new(&mut h, &mut sink));

        assert_eq!(outcome, SolveOutcome::Skipped);
        assert_eq!(sink.warnings, vec![SolverWarning::LengthsNotProvided]);
        assert!(h.global_transform(1).position.abs_diff_eq(Vec3::new(0.0, 10.0, 0.0), 1e-6));
    }
}
