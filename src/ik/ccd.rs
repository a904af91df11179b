use serde::{Deserialize, Serialize};

use super::blend_chain;
use super::chain::Chain;
use crate::config::SolverConfig;
use crate::context::{ExecuteContext, SolverWarning};
use crate::hierarchy::{CachedElement, ElementKey};
use crate::math::{Quat, Transform, Vec3, KINDA_SMALL_NUMBER, SMALL_NUMBER};
use crate::solver::{Solve, SolveOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CcdState {
    #[default]
    Idle,
    Iterating,
    Converged,
    /// The iteration cap was hit, or no link could rotate any further.
    MaxIterationsReached,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveResult {
    pub state: CcdState,
    pub iterations: u32,
    pub final_distance: f32,
}

impl SolveResult {
    pub fn converged(&self) -> bool {
        self.state == CcdState::Converged
    }
}

/// One link of a CCD chain. `local` is relative to the previous link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CcdLink {
    pub global: Transform,
    pub local: Transform,
    /// Rotation applied so far in this solve, in radians.
    pub angle_delta: f32,
}

impl CcdLink {
    pub fn new(global: Transform, parent_global: &Transform) -> Self {
        Self {
            global,
            local: global.relative_to(parent_global),
            angle_delta: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CcdParams {
    pub precision: f32,
    pub max_iterations: u32,
    pub start_from_tail: bool,
    /// When set, the total rotation per link over the whole solve is capped at
    /// its limit, not just every single step.
    pub cap_accumulated_rotation: bool,
}

/// Runs CCD over `links`. The first link is fixed and the last is the tip;
/// only the links in between rotate. `limits` holds one limit in degrees per
/// link.
pub fn solve_ccd(links: &mut [CcdLink], target: Vec3, limits: &[f32], params: &CcdParams) -> SolveResult {
    let Some(tip) = links.len().checked_sub(1) else {
        return SolveResult {
            state: CcdState::Idle,
            iterations: 0,
            final_distance: 0.0,
        };
    };

    let mut distance = links[tip].global.position.distance(target);
    let mut iterations = 0;
    while distance > params.precision && iterations < params.max_iterations {
        iterations += 1;

        let mut updated = false;
        if params.start_from_tail {
            for index in (1..tip).rev() {
                updated |= update_link(links, index, target, limits, params);
            }
        } else {
            for index in 1..tip {
                updated |= update_link(links, index, target, limits, params);
            }
        }

        distance = links[tip].global.position.distance(target);
        log::trace!("ccd iteration {iterations}: distance {distance:.4}");
        if !updated {
            break;
        }
    }

    let state = if distance <= params.precision {
        CcdState::Converged
    } else {
        CcdState::MaxIterationsReached
    };
    SolveResult {
        state,
        iterations,
        final_distance: distance,
    }
}

fn update_link(links: &mut [CcdLink], index: usize, target: Vec3, limits: &[f32], params: &CcdParams) -> bool {
    let tip = links.len() - 1;
    let origin = links[index].global.position;

    // a zero-length segment has no meaningful orientation to rotate
    if links[index + 1].global.position.distance_squared(origin) <= SMALL_NUMBER {
        return false;
    }

    let to_end = (links[tip].global.position - origin).normalize_or_zero();
    let to_target = (target - origin).normalize_or_zero();
    if to_end == Vec3::ZERO || to_target == Vec3::ZERO {
        return false;
    }

    let limit = limits.get(index).copied().unwrap_or(180.0).to_radians();
    let mut angle = to_end.dot(to_target).clamp(-1.0, 1.0).acos().min(limit);
    if angle <= KINDA_SMALL_NUMBER {
        return false;
    }

    if params.cap_accumulated_rotation {
        let link = &mut links[index];
        if link.angle_delta + angle > limit {
            angle = limit - link.angle_delta;
            if angle <= KINDA_SMALL_NUMBER {
                return false;
            }
        }
        link.angle_delta += angle;
    }

    let axis = to_end.cross(to_target);
    let axis = if axis.length_squared() > SMALL_NUMBER {
        axis.normalize()
    } else {
        to_end.any_orthonormal_vector()
    };

    let rotated = (Quat::from_axis_angle(axis, angle) * links[index].global.rotation).normalize();
    links[index].global.rotation = rotated;
    if index > 0 {
        let parent = links[index - 1].global;
        links[index].local = links[index].global.relative_to(&parent);
    }

    for child in index + 1..=tip {
        let parent = links[child - 1].global;
        links[child].global = parent.mul_transform(&links[child].local);
    }

    log::trace!("ccd link {index} rotated by {:.3} deg", angle.to_degrees());
    true
}

/// Where the rotated elements come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChainSource {
    /// Explicit list, ordered root to effector.
    Items(Vec<ElementKey>),
    /// Every element on the parent path from `start` down to `end`.
    Range { start: ElementKey, end: ElementKey },
}

impl Default for ChainSource {
    fn default() -> Self {
        ChainSource::Items(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationLimit {
    pub item: ElementKey,
    /// Degrees.
    pub limit: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcdIkSettings {
    pub source: ChainSource,
    pub effector: Transform,
    pub precision: f32,
    pub weight: f32,
    pub max_iterations: u32,
    pub start_from_tail: bool,
    /// Degrees, applied to every link without an override.
    pub base_rotation_limit: f32,
    pub rotation_limits: Vec<RotationLimit>,
    pub propagate_to_children: bool,
}

impl Default for CcdIkSettings {
    fn default() -> Self {
        Self {
            source: ChainSource::default(),
            effector: Transform::IDENTITY,
            precision: 1.0,
            weight: 1.0,
            max_iterations: 10,
            start_from_tail: true,
            base_rotation_limit: 30.0,
            rotation_limits: Vec::new(),
            propagate_to_children: true,
        }
    }
}

impl CcdIkSettings {
    pub fn from_config(config: &SolverConfig) -> Self {
        let ccd = &config.ccd;
        Self {
            precision: ccd.precision,
            weight: ccd.weight,
            max_iterations: ccd.max_iterations,
            start_from_tail: ccd.start_from_tail,
            base_rotation_limit: ccd.base_rotation_limit,
            propagate_to_children: ccd.propagate_to_children,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
struct CcdWorkData {
    item_caches: Vec<CachedElement>,
    start: CachedElement,
    end: CachedElement,
    chain: Chain,
    /// Resolved items, root to effector.
    items: Vec<usize>,
    /// Items the rotation-limit lookup was built for.
    lookup_items: Vec<usize>,
    /// Per rotation limit, its link in the internal chain.
    limit_slots: Vec<Option<usize>>,
    limits_per_link: Vec<f32>,
    links: Vec<CcdLink>,
    pre: Vec<Transform>,
}

impl CcdWorkData {
    fn reset(&mut self) {
        self.lookup_items.clear();
        self.limit_slots.clear();
        self.limits_per_link.clear();
        self.links.clear();
    }
}

/// CCD IK against hierarchy elements.
#[derive(Debug, Clone, Default)]
pub struct CcdIk {
    pub settings: CcdIkSettings,
    state: CcdState,
    work: CcdWorkData,
}

impl CcdIk {
    pub fn new(settings: CcdIkSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn state(&self) -> CcdState {
        self.state
    }

    /// Fills `work.items`. Returns false (after warning) when they cannot be resolved.
    fn gather_items(&mut self, ctx: &mut ExecuteContext<'_>) -> bool {
        let work = &mut self.work;
        work.items.clear();

        match &self.settings.source {
            ChainSource::Items(keys) => {
                work.item_caches.resize_with(keys.len(), CachedElement::default);
                for (cache, key) in work.item_caches.iter_mut().zip(keys) {
                    match ctx.resolve(cache, key) {
                        Some(index) => work.items.push(index),
                        None => return false,
                    }
                }
            }
            ChainSource::Range { start, end } => {
                let (Some(start_index), Some(end_index)) =
                    (ctx.resolve(&mut work.start, start), ctx.resolve(&mut work.end, end))
                else {
                    return false;
                };
                work.chain.rebuild_if_changed(ctx.hierarchy, start_index, end_index);
                if work.chain.is_empty() {
                    ctx.warn(SolverWarning::ChainNotFound {
                        start: start.clone(),
                        end: end.clone(),
                    });
                    return false;
                }
                work.items.extend(work.chain.indices());
            }
        }

        if work.items.len() < 2 {
            ctx.warn(SolverWarning::NoBonesFound);
            return false;
        }
        true
    }
}

impl Solve for CcdIk {
    fn solve(&mut self, ctx: &mut ExecuteContext<'_>) -> SolveOutcome {
        if !self.gather_items(ctx) {
            self.state = CcdState::Idle;
            return SolveOutcome::Skipped;
        }

        let settings = &self.settings;
        let work = &mut self.work;

        if work.limit_slots.len() != settings.rotation_limits.len() || work.lookup_items != work.items {
            log::debug!("resetting ccd work data for {} items", work.items.len());
            work.reset();
            work.lookup_items.extend_from_slice(&work.items);
            for limit in &settings.rotation_limits {
                let slot = ctx
                    .hierarchy
                    .index_of(&limit.item)
                    .and_then(|index| work.items.iter().position(|&item| item == index))
                    .map(|position| position + 1);
                work.limit_slots.push(slot);
            }
        }

        let link_count = work.items.len() + 1;
        work.limits_per_link.clear();
        work.limits_per_link.resize(link_count, settings.base_rotation_limit);
        for (limit, slot) in settings.rotation_limits.iter().zip(&work.limit_slots) {
            if let Some(slot) = slot {
                work.limits_per_link[*slot] = limit.limit;
            }
        }

        let fixed_parent = ctx.hierarchy.first_parent(work.items[0]);
        let mut parent_global = match fixed_parent {
            Some(parent) => ctx.hierarchy.global_transform(parent),
            None => Transform::IDENTITY,
        };

        work.links.clear();
        work.pre.clear();
        work.links.push(CcdLink::new(parent_global, &Transform::IDENTITY));
        for &item in &work.items {
            let global = ctx.hierarchy.global_transform(item);
            work.links.push(CcdLink::new(global, &parent_global));
            work.pre.push(global);
            parent_global = global;
        }

        let params = CcdParams {
            precision: settings.precision.max(0.0),
            max_iterations: settings.max_iterations,
            start_from_tail: settings.start_from_tail,
            cap_accumulated_rotation: !settings.rotation_limits.is_empty(),
        };

        self.state = CcdState::Iterating;
        let result = solve_ccd(&mut work.links, settings.effector.position, &work.limits_per_link, &params);
        self.state = result.state;

        let weight = settings.weight.clamp(0.0, 1.0);
        if weight <= SMALL_NUMBER {
            return SolveOutcome::Iterative(result);
        }

        let mut solved: Vec<Transform> = work.links[1..].iter().map(|link| link.global).collect();
        if let Some(effector) = solved.last_mut() {
            effector.rotation = settings.effector.rotation;
        }
        if weight < 1.0 - SMALL_NUMBER {
            blend_chain(&work.pre, &mut solved, weight);
        }

        for (&item, transform) in work.items.iter().zip(&solved) {
            ctx.hierarchy
                .set_global_transform(item, *transform, settings.propagate_to_children);
        }

        log::debug!(
            "ccd ik finished after {} iterations ({:?}, distance {:.4})",
            result.iterations,
            result.state,
            result.final_distance
        );
        SolveOutcome::Iterative(result)
    }
}
