use rig_solvers::context::{Color, DrawInterface};
use rig_solvers::prelude::*;
use rig_solvers::{HierarchyError, SolverConfig};

/// Forwards debug primitives to the log.
struct LogDraw;

impl DrawInterface for LogDraw {
    fn draw_line(&mut self, offset: &Transform, from: Vec3, to: Vec3, color: Color) {
        let (from, to) = (offset.transform_point(from), offset.transform_point(to));
        log::debug!("line {from:?} -> {to:?} {color:?}");
    }

    fn draw_box(&mut self, offset: &Transform, transform: &Transform, color: Color) {
        let at = offset.mul_transform(transform);
        log::debug!("box at {:?} size {:?} {color:?}", at.position, at.scale);
    }
}

fn build_arm() -> Result<Hierarchy, HierarchyError> {
    let mut h = Hierarchy::new();
    let root = ElementKey::null("root");
    let upperarm = ElementKey::bone("upperarm");
    let lowerarm = ElementKey::bone("lowerarm");
    let head = ElementKey::bone("head");

    h.add_element(root.clone(), None, Transform::IDENTITY, Space::Global)?;
    h.add_element(
        upperarm.clone(),
        Some(&root),
        Transform::from_position(Vec3::new(0.0, 0.0, 10.0)),
        Space::Global,
    )?;
    h.add_element(
        lowerarm.clone(),
        Some(&upperarm),
        Transform::from_position(Vec3::new(0.0, 10.0, 10.0)),
        Space::Global,
    )?;
    h.add_element(
        ElementKey::bone("hand"),
        Some(&lowerarm),
        Transform::from_position(Vec3::new(0.0, 20.0, 10.0)),
        Space::Global,
    )?;
    h.add_element(
        head.clone(),
        Some(&root),
        Transform::from_position(Vec3::new(0.0, 0.0, 20.0)),
        Space::Global,
    )?;
    h.add_element(
        ElementKey::bone("eye"),
        Some(&head),
        Transform::from_position(Vec3::new(0.0, 1.0, 1.0)),
        Space::Local,
    )?;
    h.add_element(
        ElementKey::null("look_target"),
        None,
        Transform::from_position(Vec3::new(5.0, 12.0, 5.0)),
        Space::Global,
    )?;
    h.add_element(
        ElementKey::bone("weapon"),
        None,
        Transform::from_position(Vec3::new(0.0, 22.0, 10.0)),
        Space::Global,
    )?;
    Ok(h)
}

fn build_solvers(config: &SolverConfig) -> Vec<RigSolver> {
    let debug = config.debug;

    let two_bone = TwoBoneIk::new(TwoBoneIkSettings {
        item_a: ElementKey::bone("upperarm"),
        item_b: ElementKey::bone("lowerarm"),
        effector_item: ElementKey::bone("hand"),
        effector: Transform::from_position(Vec3::new(8.0, 12.0, 10.0)),
        pole_vector: Vec3::new(0.0, 0.0, -1.0),
        debug,
        ..TwoBoneIkSettings::from_config(config)
    });

    let ccd = CcdIk::new(CcdIkSettings {
        source: ChainSource::Range {
            start: ElementKey::bone("upperarm"),
            end: ElementKey::bone("hand"),
        },
        effector: Transform::from_position(Vec3::new(6.0, 14.0, 14.0)),
        ..CcdIkSettings::from_config(config)
    });

    let mut aim = AimItemSettings::from_config(config);
    aim.item = ElementKey::bone("head");
    aim.primary.axis = Vec3::Y;
    aim.primary.target = Vec3::ZERO;
    aim.primary.space = ElementKey::null("look_target");
    aim.debug = debug;

    let eye = AimConstraint::new(AimConstraintSettings {
        child: ElementKey::bone("eye"),
        parents: vec![ConstraintParent::new(ElementKey::null("look_target"), 1.0)],
        maintain_offset: true,
        aim_axis: Vec3::Y,
        debug,
        ..AimConstraintSettings::default()
    });

    let weapon = ParentConstraint::new(ParentConstraintSettings {
        child: ElementKey::bone("weapon"),
        parents: vec![ConstraintParent::new(ElementKey::bone("hand"), 1.0)],
        ..ParentConstraintSettings::default()
    });

    vec![
        two_bone.into(),
        ccd.into(),
        AimItem::new(aim).into(),
        eye.into(),
        weapon.into(),
    ]
}

fn main() {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SolverConfig::load(&path).unwrap_or_else(|err| {
            log::error!("Failed to load {path}: {err}");
            SolverConfig::default()
        }),
        None => SolverConfig::default(),
    };

    let mut hierarchy = match build_arm() {
        Ok(hierarchy) => hierarchy,
        Err(err) => {
            log::error!("Failed to build rig: {err}");
            return;
        }
    };

    let mut solvers = build_solvers(&config);
    let mut warnings = LogWarnings;
    let mut draw = LogDraw;
    let mut ctx = ExecuteContext::new(&mut hierarchy, &mut warnings).with_draw(&mut draw);

    for solver in &mut solvers {
        let outcome = solver.solve(&mut ctx);
        log::info!("{:?}: {:?}", solver.kind(), outcome);
    }

    for name in ["upperarm", "lowerarm", "hand", "head", "eye", "weapon"] {
        let transform = hierarchy.global_transform_by_key(&ElementKey::bone(name));
        log::info!(
            "{name:>9}: position {:?} rotation {:?}",
            transform.position,
            transform.rotation
        );
    }
}
