//! Inverse Kinematics module
//!
//! This module contains chain extraction and the analytic two-bone and
//! iterative CCD solvers.

pub mod ccd;
pub mod chain;
pub mod two_bone;

pub use ccd::{CcdIk, CcdIkSettings, CcdState, ChainSource, RotationLimit, SolveResult};
pub use chain::{Chain, ChainLink};
pub use two_bone::{
    solve_two_bone_positions, solve_two_bone_transforms, TwoBoneIk, TwoBoneIkSettings,
    TwoBoneParams, TwoBonePositions,
};

use crate::math::Transform;

/// Blends solved chain globals toward the pre-solve pose.
///
/// Rotations are slerped by `weight`. Positions are re-derived from each
/// link's solved offset to its parent link, so the chain stays connected.
pub(crate) fn blend_chain(pre: &[Transform], solved: &mut [Transform], weight: f32) {
    if solved.is_empty() || weight >= 1.0 {
        return;
    }

    let mut previous_solved = solved[0];
    solved[0].rotation = pre[0].rotation.slerp(solved[0].rotation, weight).normalize();

    for i in 1..solved.len().min(pre.len()) {
        let current_solved = solved[i];
        let offset = previous_solved.inverse_transform_point(current_solved.position);
        solved[i].rotation = pre[i].rotation.slerp(current_solved.rotation, weight).normalize();
        solved[i].position = solved[i - 1].transform_point(offset);
        previous_solved = current_solved;
    }
}
