use crate::constraint::{AimConstraint, AimItem, ParentConstraint};
use crate::context::ExecuteContext;
use crate::ik::{CcdIk, SolveResult, TwoBoneIk};

/// What a single solver invocation did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveOutcome {
    /// Nothing was written: zero weight, or a required element was missing.
    Skipped,
    Solved,
    /// An iterative solver ran; carries its convergence summary.
    Iterative(SolveResult),
}

impl SolveOutcome {
    pub fn wrote_pose(&self) -> bool {
        !matches!(self, SolveOutcome::Skipped)
    }
}

/// A solver that reads and writes the hierarchy through an execute context.
pub trait Solve {
    fn solve(&mut self, ctx: &mut ExecuteContext<'_>) -> SolveOutcome;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverKind {
    TwoBoneIk,
    CcdIk,
    Aim,
    AimConstraint,
    ParentConstraint,
}

/// All solver kinds behind one dispatchable value.
#[derive(Debug, Clone)]
pub enum RigSolver {
    TwoBoneIk(TwoBoneIk),
    CcdIk(CcdIk),
    Aim(AimItem),
    AimConstraint(AimConstraint),
    ParentConstraint(ParentConstraint),
}

impl RigSolver {
    pub fn kind(&self) -> SolverKind {
        match self {
            RigSolver::TwoBoneIk(_) => SolverKind::TwoBoneIk,
            RigSolver::CcdIk(_) => SolverKind::CcdIk,
            RigSolver::Aim(_) => SolverKind::Aim,
            RigSolver::AimConstraint(_) => SolverKind::AimConstraint,
            RigSolver::ParentConstraint(_) => SolverKind::ParentConstraint,
        }
    }
}

impl Solve for RigSolver {
    fn solve(&mut self, ctx: &mut ExecuteContext<'_>) -> SolveOutcome {
        let outcome = match self {
            RigSolver::TwoBoneIk(solver) => solver.solve(ctx),
            RigSolver::CcdIk(solver) => solver.solve(ctx),
            RigSolver::Aim(solver) => solver.solve(ctx),
            RigSolver::AimConstraint(solver) => solver.solve(ctx),
            RigSolver::ParentConstraint(solver) => solver.solve(ctx),
        };
        log::trace!("{:?} -> {:?}", self.kind(), outcome);
        outcome
    }
}

macro_rules! impl_from_solver {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for RigSolver {
                fn from(solver: $ty) -> Self {
                    RigSolver::$variant(solver)
                }
            }
        )*
    };
}

impl_from_solver!(
    TwoBoneIk(TwoBoneIk),
    CcdIk(CcdIk),
    Aim(AimItem),
    AimConstraint(AimConstraint),
    ParentConstraint(ParentConstraint),
);

/// Runs `solvers` in order against the same context.
pub fn solve_all(solvers: &mut [RigSolver], ctx: &mut ExecuteContext<'_>) -> Vec<SolveOutcome> {
    solvers.iter_mut().map(|solver| solver.solve(ctx)).collect()
}
