use approx::assert_relative_eq;
use rig_solvers::prelude::*;
use rig_solvers::{CollectWarnings, SolveResult, SolverKind};
use std::f32::consts::FRAC_PI_2;

fn add(h: &mut Hierarchy, name: &str, parent: Option<&str>, transform: Transform) {
    let parent = parent.map(ElementKey::bone);
    h.add_element(ElementKey::bone(name), parent.as_ref(), transform, Space::Global)
        .unwrap();
}

fn run(h: &mut Hierarchy, solver: &mut RigSolver) -> (SolveOutcome, CollectWarnings) {
    let mut sink = CollectWarnings::default();
    let outcome = solver.solve(&mut ExecuteContext::new(h, &mut sink));
    (outcome, sink)
}

fn global(h: &mut Hierarchy, name: &str) -> Transform {
    h.global_transform_by_key(&ElementKey::bone(name))
}

fn local(h: &mut Hierarchy, name: &str) -> Transform {
    h.try_transform_by_key(&ElementKey::bone(name), Pose::Current, Space::Local)
        .unwrap()
}

#[test]
fn two_bone_straight_extension() {
    let mut h = Hierarchy::new();
    add(&mut h, "a", None, Transform::IDENTITY);
    add(&mut h, "b", Some("a"), Transform::from_position(Vec3::new(0.0, 10.0, 0.0)));

    let mut solver: RigSolver = TwoBoneIk::new(TwoBoneIkSettings {
        item_a: ElementKey::bone("a"),
        item_b: ElementKey::bone("b"),
        item_b_length: 10.0,
        effector: Transform::from_position(Vec3::new(0.0, 20.0, 0.0)),
        pole_vector: Vec3::new(10.0, 10.0, 0.0),
        pole_vector_kind: TargetKind::Location,
        ..TwoBoneIkSettings::default()
    })
    .into();

    let (outcome, warnings) = run(&mut h, &mut solver);
    assert_eq!(outcome, SolveOutcome::Solved);
    assert!(warnings.warnings.is_empty());

    let a = global(&mut h, "a");
    let b = global(&mut h, "b");
    assert!(b.position.abs_diff_eq(Vec3::new(0.0, 10.0, 0.0), 1e-4));
    // primary axis follows the bone: zero bend between the two segments
    let dir_a = a.rotation * Vec3::X;
    let dir_b = b.rotation * Vec3::X;
    assert!(dir_a.abs_diff_eq(Vec3::Y, 1e-4));
    assert_relative_eq!(dir_a.dot(dir_b), 1.0, epsilon = 1e-4);
}

#[test]
fn two_bone_reachable_target_keeps_lengths() {
    let mut h = Hierarchy::new();
    add(&mut h, "a", None, Transform::IDENTITY);
    add(&mut h, "b", Some("a"), Transform::from_position(Vec3::new(10.0, 0.0, 0.0)));
    add(&mut h, "c", Some("b"), Transform::from_position(Vec3::new(20.0, 0.0, 0.0)));

    let target = Vec3::new(6.0, 9.0, 4.0);
    let mut solver: RigSolver = TwoBoneIk::new(TwoBoneIkSettings {
        item_a: ElementKey::bone("a"),
        item_b: ElementKey::bone("b"),
        effector_item: ElementKey::bone("c"),
        effector: Transform::from_position(target),
        pole_vector: Vec3::new(0.0, 0.0, 1.0),
        ..TwoBoneIkSettings::default()
    })
    .into();
    run(&mut h, &mut solver);

    let a = global(&mut h, "a").position;
    let b = global(&mut h, "b").position;
    let c = global(&mut h, "c").position;
    assert_relative_eq!(a.distance(b), 10.0, epsilon = 1e-3);
    assert_relative_eq!(b.distance(c), 10.0, epsilon = 1e-3);
    assert_relative_eq!(a.distance(c), target.length(), epsilon = 1e-3);
}

fn bent_chain() -> Hierarchy {
    let mut h = Hierarchy::new();
    let bend = Quat::from_rotation_z(30f32.to_radians());
    add(&mut h, "a", None, Transform::IDENTITY);
    add(&mut h, "b", Some("a"), Transform::from_position(Vec3::new(0.0, 10.0, 0.0)));
    add(
        &mut h,
        "c",
        Some("b"),
        Transform::from_position_rotation(Vec3::new(0.0, 20.0, 0.0), bend),
    );
    add(
        &mut h,
        "d",
        Some("c"),
        Transform::from_position_rotation(Vec3::new(0.0, 20.0, 0.0) + bend * Vec3::new(0.0, 10.0, 0.0), bend),
    );
    h
}

fn ccd_solver(weight: f32) -> RigSolver {
    CcdIk::new(CcdIkSettings {
        source: ChainSource::Items(["a", "b", "c", "d"].map(ElementKey::bone).to_vec()),
        effector: Transform::from_position(Vec3::new(0.0, 30.0, 0.0)),
        precision: 0.01,
        max_iterations: 10,
        weight,
        ..CcdIkSettings::default()
    })
    .into()
}

#[test]
fn ccd_extends_the_chain_to_a_target_at_full_reach() {
    let mut h = bent_chain();
    let mut solver = ccd_solver(1.0);
    assert_eq!(solver.kind(), SolverKind::CcdIk);

    let (outcome, warnings) = run(&mut h, &mut solver);
    let SolveOutcome::Iterative(result) = outcome else {
        panic!("expected an iterative outcome, got {outcome:?}");
    };
    assert!(result.converged());
    assert!(result.iterations <= 10);
    assert!(warnings.warnings.is_empty());

    assert!(global(&mut h, "d").position.abs_diff_eq(Vec3::new(0.0, 30.0, 0.0), 0.01));
    let positions: Vec<Vec3> = ["a", "b", "c", "d"].iter().map(|n| global(&mut h, n).position).collect();
    for pair in positions.windows(2) {
        assert_relative_eq!(pair[0].distance(pair[1]), 10.0, epsilon = 1e-3);
    }

    // a converged pose is a fixed point
    let before: Vec<Transform> = ["a", "b", "c", "d"].iter().map(|n| global(&mut h, n)).collect();
    let (again, _) = run(&mut h, &mut solver);
    assert!(matches!(
        again,
        SolveOutcome::Iterative(SolveResult { iterations: 0, .. })
    ));
    for (name, expected) in ["a", "b", "c", "d"].iter().zip(&before) {
        assert!(global(&mut h, name).abs_diff_eq(expected, 1e-4));
    }
}

fn aim_solver(target: Vec3) -> RigSolver {
    AimItem::new(AimItemSettings {
        item: ElementKey::bone("eye"),
        primary: AimTarget::location(Vec3::X, target),
        secondary: AimTarget::secondary().with_weight(0.0),
        ..AimItemSettings::default()
    })
    .into()
}

#[test]
fn aim_at_an_aligned_target_is_identity() {
    let mut h = Hierarchy::new();
    add(&mut h, "eye", None, Transform::IDENTITY);
    run(&mut h, &mut aim_solver(Vec3::new(10.0, 0.0, 0.0)));
    assert!(global(&mut h, "eye").rotation.abs_diff_eq(Quat::IDENTITY, 1e-5));
}

#[test]
fn aim_quarter_turn_about_z() {
    let mut h = Hierarchy::new();
    add(&mut h, "eye", None, Transform::IDENTITY);
    run(&mut h, &mut aim_solver(Vec3::new(0.0, 10.0, 0.0)));

    let rotation = global(&mut h, "eye").rotation;
    assert!(rotation.abs_diff_eq(Quat::from_rotation_z(FRAC_PI_2), 1e-4));
    assert!((rotation * Vec3::X).abs_diff_eq(Vec3::Y, 1e-4));
}

fn aim_constraint_rig() -> Hierarchy {
    let mut h = Hierarchy::new();
    add(&mut h, "child", None, Transform::IDENTITY);
    add(&mut h, "tip", Some("child"), Transform::from_position(Vec3::new(0.0, 10.0, 0.0)));
    add(&mut h, "left", None, Transform::from_position(Vec3::new(-10.0, 10.0, 10.0)));
    add(&mut h, "right", None, Transform::from_position(Vec3::new(10.0, 10.0, 10.0)));
    h
}

#[test]
fn aim_constraint_offset_survives_moving_parents() {
    let mut h = aim_constraint_rig();
    let mut solver: RigSolver = AimConstraint::new(AimConstraintSettings {
        child: ElementKey::bone("child"),
        parents: vec![
            ConstraintParent::new(ElementKey::bone("left"), 1.0),
            ConstraintParent::new(ElementKey::bone("right"), 1.0),
        ],
        maintain_offset: true,
        aim_axis: Vec3::Y,
        up_axis: Vec3::Z,
        ..AimConstraintSettings::default()
    })
    .into();

    let rest = local(&mut h, "child");
    run(&mut h, &mut solver);
    assert!(local(&mut h, "child").abs_diff_eq(&rest, 1e-4));

    // push both parents outward along the line from the child; the mixed
    // aim direction is unchanged
    for name in ["left", "right"] {
        let key = ElementKey::bone(name);
        let moved = h.global_transform_by_key(&key);
        h.set_global_transform_by_key(&key, moved.with_position(moved.position * 2.0), true)
            .unwrap();
    }
    run(&mut h, &mut solver);
    assert!(local(&mut h, "child").abs_diff_eq(&rest, 1e-4));
    assert!(global(&mut h, "tip").position.abs_diff_eq(Vec3::new(0.0, 10.0, 0.0), 1e-3));
}

#[test]
fn zero_weight_solvers_leave_the_pose_untouched() {
    let mut h = bent_chain();
    add(&mut h, "driver", None, Transform::from_position(Vec3::new(5.0, 5.0, 5.0)));
    let names = ["a", "b", "c", "d", "driver"];
    let before: Vec<(Transform, Transform)> = names
        .iter()
        .map(|n| (global(&mut h, n), local(&mut h, n)))
        .collect();

    let mut solvers: Vec<RigSolver> = vec![
        TwoBoneIk::new(TwoBoneIkSettings {
            item_a: ElementKey::bone("a"),
            item_b: ElementKey::bone("b"),
            effector_item: ElementKey::bone("c"),
            effector: Transform::from_position(Vec3::new(3.0, 3.0, 0.0)),
            weight: 0.0,
            ..TwoBoneIkSettings::default()
        })
        .into(),
        ccd_solver(0.0),
        AimItem::new(AimItemSettings {
            item: ElementKey::bone("a"),
            primary: AimTarget::location(Vec3::X, Vec3::new(0.0, 0.0, 9.0)),
            weight: 0.0,
            ..AimItemSettings::default()
        })
        .into(),
        AimConstraint::new(AimConstraintSettings {
            child: ElementKey::bone("b"),
            parents: vec![ConstraintParent::new(ElementKey::bone("driver"), 1.0)],
            weight: 0.0,
            ..AimConstraintSettings::default()
        })
        .into(),
        ParentConstraint::new(ParentConstraintSettings {
            child: ElementKey::bone("c"),
            parents: vec![ConstraintParent::new(ElementKey::bone("driver"), 1.0)],
            maintain_offset: false,
            weight: 0.0,
            ..ParentConstraintSettings::default()
        })
        .into(),
    ];

    for solver in &mut solvers {
        let (outcome, _) = run(&mut h, solver);
        assert!(
            !matches!(outcome, SolveOutcome::Solved),
            "{:?} wrote with zero weight",
            solver.kind()
        );
    }
    for (name, (global_before, local_before)) in names.iter().zip(&before) {
        assert!(global(&mut h, name).abs_diff_eq(global_before, 1e-6), "{name} global moved");
        assert!(local(&mut h, name).abs_diff_eq(local_before, 1e-6), "{name} local moved");
    }
}

#[test]
fn hierarchy_round_trips_the_last_written_space() {
    let mut h = Hierarchy::new();
    add(&mut h, "root", None, Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
    add(&mut h, "mid", Some("root"), Transform::from_position(Vec3::new(1.0, 5.0, 3.0)));
    add(&mut h, "leaf", Some("mid"), Transform::from_position(Vec3::new(1.0, 5.0, 8.0)));

    let local_write = Transform::from_position_rotation(Vec3::new(0.5, 1.5, -2.0), Quat::from_rotation_x(0.7));
    h.set_local_transform_by_key(&ElementKey::bone("mid"), local_write, false)
        .unwrap();
    assert_eq!(local(&mut h, "mid"), local_write);

    let root = global(&mut h, "root");
    assert!(global(&mut h, "mid").abs_diff_eq(&root.mul_transform(&local_write), 1e-5));

    let global_write = Transform::from_position_rotation(Vec3::new(-4.0, 0.0, 2.0), Quat::from_rotation_y(1.1));
    h.set_global_transform_by_key(&ElementKey::bone("leaf"), global_write, false)
        .unwrap();
    assert_eq!(global(&mut h, "leaf"), global_write);

    let mid = global(&mut h, "mid");
    assert!(mid.mul_transform(&local(&mut h, "leaf")).abs_diff_eq(&global_write, 1e-5));
    assert!(h.is_consistent());
}
