//! # rig-solvers
//!
//! Kinematics solvers for character rigs, running over a transform hierarchy
//! with lazily cached local and global poses.
//!
//! ## Features
//! - Hierarchy store with current/initial poses and dirty-slot caching
//! - Cached element references revalidated by topology version
//! - Analytic two-bone IK with pole vector and stretch
//! - CCD IK with per-link rotation limits
//! - Aim solver, multi-parent aim constraint and parent constraint
//! - Schema upgrades for legacy name-based nodes
//!
//! ## Example
//! ```rust,ignore
//! use rig_solvers::prelude::*;
//!
//! let mut hierarchy = Hierarchy::new();
//! let root = ElementKey::bone("upperarm");
//! hierarchy.add_element(root.clone(), None, Transform::IDENTITY, Space::Global)?;
//! hierarchy.add_element(
//!     ElementKey::bone("lowerarm"),
//!     Some(&root),
//!     Transform::from_position(Vec3::new(0.0, 10.0, 0.0)),
//!     Space::Local,
//! )?;
//!
//! let mut solver: RigSolver = TwoBoneIk::new(TwoBoneIkSettings {
//!     item_a: root,
//!     item_b: ElementKey::bone("lowerarm"),
//!     item_b_length: 10.0,
//!     effector: Transform::from_position(Vec3::new(12.0, 6.0, 0.0)),
//!     ..TwoBoneIkSettings::default()
//! })
//! .into();
//!
//! let mut warnings = LogWarnings;
//! let outcome = solver.solve(&mut ExecuteContext::new(&mut hierarchy, &mut warnings));
//! println!("{outcome:?}");
//! ```

pub mod config;
pub mod constraint;
pub mod context;
pub mod error;
pub mod hierarchy;
pub mod ik;
pub mod math;
pub mod schema;
pub mod solver;

pub use config::SolverConfig;
pub use constraint::{
    AimConstraint, AimConstraintSettings, AimItem, AimItemSettings, AimTarget, ParentConstraint,
    ParentConstraintSettings, TargetKind,
};
pub use context::{CollectWarnings, ExecuteContext, LogWarnings, SolverWarning, WarningSink};
pub use error::{ConfigError, HierarchyError};
pub use hierarchy::{CachedElement, ElementKey, ElementKind, Hierarchy, Pose, Space};
pub use ik::{CcdIk, CcdIkSettings, Chain, SolveResult, TwoBoneIk, TwoBoneIkSettings};
pub use math::Transform;
pub use solver::{RigSolver, Solve, SolveOutcome, SolverKind};

/// Everything needed to build a hierarchy and run solvers over it.
pub mod prelude {
    pub use crate::constraint::{
        AimConstraint, AimConstraintSettings, AimItem, AimItemSettings, AimTarget,
        ConstraintParent, ParentConstraint, ParentConstraintSettings, TargetKind,
    };
    pub use crate::context::{ExecuteContext, LogWarnings, WarningSink};
    pub use crate::hierarchy::{ElementKey, Hierarchy, Pose, Space};
    pub use crate::ik::{CcdIk, CcdIkSettings, ChainSource, TwoBoneIk, TwoBoneIkSettings};
    pub use crate::math::{Quat, Transform, Vec3};
    pub use crate::solver::{RigSolver, Solve, SolveOutcome};
}
