//! Schema versioning for solver node configurations.
//!
//! Older rigs addressed bones by bare name. These shapes are kept only so
//! they can be read and upgraded to the current settings, keyed by
//! [`ElementKey`]. Each upgrade reports which fields were renamed so that
//! callers can rewrite links into the old fields.

use serde::{Deserialize, Serialize};

use crate::constraint::{AimItem, AimItemSettings, AimTarget, TargetKind};
use crate::context::DebugSettings;
use crate::hierarchy::ElementKey;
use crate::ik::{CcdIk, CcdIkSettings, ChainSource, RotationLimit, TwoBoneIk, TwoBoneIkSettings};
use crate::math::{Transform, Vec3};
use crate::solver::RigSolver;

/// A field of a legacy node and the path it moved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemappedField {
    pub old: &'static str,
    pub new: &'static str,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpgradeInfo {
    pub remapped: Vec<RemappedField>,
}

impl UpgradeInfo {
    fn remap(mut self, old: &'static str, new: &'static str) -> Self {
        self.remapped.push(RemappedField { old, new });
        self
    }

    /// New path for `old`, if it was renamed.
    pub fn remapped_path(&self, old: &str) -> Option<&'static str> {
        self.remapped.iter().find(|r| r.old == old).map(|r| r.new)
    }
}

/// Current settings produced by an upgrade.
#[derive(Debug, Clone, PartialEq)]
pub enum UpgradedSettings {
    TwoBoneIk(TwoBoneIkSettings),
    CcdIk(CcdIkSettings),
    Aim(AimItemSettings),
}

impl UpgradedSettings {
    pub fn into_solver(self) -> RigSolver {
        match self {
            UpgradedSettings::TwoBoneIk(settings) => TwoBoneIk::new(settings).into(),
            UpgradedSettings::CcdIk(settings) => CcdIk::new(settings).into(),
            UpgradedSettings::Aim(settings) => AimItem::new(settings).into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyAimTarget {
    pub weight: f32,
    pub axis: Vec3,
    pub target: Vec3,
    pub kind: TargetKind,
    /// Bone name; empty for world space.
    pub space: String,
}

impl Default for LegacyAimTarget {
    fn default() -> Self {
        AimTarget::primary().into()
    }
}

impl From<AimTarget> for LegacyAimTarget {
    fn from(target: AimTarget) -> Self {
        Self {
            weight: target.weight,
            axis: target.axis,
            target: target.target,
            kind: target.kind,
            space: target.space.name,
        }
    }
}

impl LegacyAimTarget {
    fn upgrade(&self) -> AimTarget {
        AimTarget {
            weight: self.weight,
            axis: self.axis,
            target: self.target,
            kind: self.kind,
            space: bone_key(&self.space),
        }
    }
}

/// Bone key for a legacy name. An empty name stays unset.
fn bone_key(name: &str) -> ElementKey {
    if name.is_empty() {
        ElementKey::default()
    } else {
        ElementKey::bone(name)
    }
}

/// Node shapes from before elements were addressed by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node")]
pub enum LegacyNode {
    TwoBoneIkByName {
        bone_a: String,
        bone_b: String,
        #[serde(default)]
        effector_bone: String,
        #[serde(default)]
        effector: Transform,
        #[serde(default)]
        pole_vector: Option<Vec3>,
        #[serde(default)]
        pole_vector_kind: Option<TargetKind>,
        #[serde(default)]
        pole_vector_space: String,
        #[serde(default)]
        enable_stretch: bool,
        #[serde(default)]
        weight: Option<f32>,
        #[serde(default)]
        bone_a_length: f32,
        #[serde(default)]
        bone_b_length: f32,
        #[serde(default)]
        propagate_to_children: Option<bool>,
        #[serde(default)]
        debug: DebugSettings,
    },
    /// Chain addressed by start and end bone names. No longer supported.
    CcdIkByName {
        start_bone: String,
        effector_bone: String,
    },
    CcdIkPerItem {
        items: Vec<ElementKey>,
        #[serde(default)]
        effector_transform: Transform,
        #[serde(default)]
        precision: Option<f32>,
        #[serde(default)]
        weight: Option<f32>,
        #[serde(default)]
        max_iterations: Option<u32>,
        #[serde(default)]
        start_from_tail: Option<bool>,
        #[serde(default)]
        base_rotation_limit: Option<f32>,
        #[serde(default)]
        rotation_limits: Vec<RotationLimit>,
        #[serde(default)]
        propagate_to_children: Option<bool>,
    },
    AimBoneByName {
        bone: String,
        #[serde(default)]
        primary: Option<LegacyAimTarget>,
        #[serde(default)]
        secondary: Option<LegacyAimTarget>,
        #[serde(default)]
        weight: Option<f32>,
        #[serde(default)]
        debug: DebugSettings,
    },
}

impl LegacyNode {
    pub fn name(&self) -> &'static str {
        match self {
            LegacyNode::TwoBoneIkByName { .. } => "TwoBoneIkByName",
            LegacyNode::CcdIkByName { .. } => "CcdIkByName",
            LegacyNode::CcdIkPerItem { .. } => "CcdIkPerItem",
            LegacyNode::AimBoneByName { .. } => "AimBoneByName",
        }
    }

    /// Maps the node to current settings. `None` when the node is deprecated
    /// without an upgrade path.
    pub fn upgrade(&self) -> Option<(UpgradedSettings, UpgradeInfo)> {
        let upgraded = match self {
            LegacyNode::TwoBoneIkByName {
                bone_a,
                bone_b,
                effector_bone,
                effector,
                pole_vector,
                pole_vector_kind,
                pole_vector_space,
                enable_stretch,
                weight,
                bone_a_length,
                bone_b_length,
                propagate_to_children,
                debug,
            } => {
                let defaults = TwoBoneIkSettings::default();
                let settings = TwoBoneIkSettings {
                    item_a: ElementKey::bone(bone_a.as_str()),
                    item_b: ElementKey::bone(bone_b.as_str()),
                    effector_item: bone_key(effector_bone),
                    effector: *effector,
                    pole_vector: pole_vector.unwrap_or(defaults.pole_vector),
                    pole_vector_kind: pole_vector_kind.unwrap_or(defaults.pole_vector_kind),
                    pole_vector_space: bone_key(pole_vector_space),
                    enable_stretch: *enable_stretch,
                    weight: weight.unwrap_or(defaults.weight),
                    item_a_length: *bone_a_length,
                    item_b_length: *bone_b_length,
                    propagate_to_children: propagate_to_children.unwrap_or(defaults.propagate_to_children),
                    debug: *debug,
                    ..defaults
                };
                let info = UpgradeInfo::default()
                    .remap("bone_a", "item_a.name")
                    .remap("bone_b", "item_b.name")
                    .remap("effector_bone", "effector_item.name")
                    .remap("bone_a_length", "item_a_length")
                    .remap("bone_b_length", "item_b_length");
                (UpgradedSettings::TwoBoneIk(settings), info)
            }
            LegacyNode::CcdIkByName { .. } => return None,
            LegacyNode::CcdIkPerItem {
                items,
                effector_transform,
                precision,
                weight,
                max_iterations,
                start_from_tail,
                base_rotation_limit,
                rotation_limits,
                propagate_to_children,
            } => {
                let defaults = CcdIkSettings::default();
                let settings = CcdIkSettings {
                    source: ChainSource::Items(items.clone()),
                    effector: *effector_transform,
                    precision: precision.unwrap_or(defaults.precision),
                    weight: weight.unwrap_or(defaults.weight),
                    max_iterations: max_iterations.unwrap_or(defaults.max_iterations),
                    start_from_tail: start_from_tail.unwrap_or(defaults.start_from_tail),
                    base_rotation_limit: base_rotation_limit.unwrap_or(defaults.base_rotation_limit),
                    rotation_limits: rotation_limits.clone(),
                    propagate_to_children: propagate_to_children.unwrap_or(defaults.propagate_to_children),
                };
                let info = UpgradeInfo::default()
                    .remap("items", "source.items")
                    .remap("effector_transform", "effector");
                (UpgradedSettings::CcdIk(settings), info)
            }
            LegacyNode::AimBoneByName {
                bone,
                primary,
                secondary,
                weight,
                debug,
            } => {
                let defaults = AimItemSettings::default();
                let settings = AimItemSettings {
                    item: ElementKey::bone(bone.as_str()),
                    primary: primary.as_ref().map_or(defaults.primary.clone(), LegacyAimTarget::upgrade),
                    secondary: secondary
                        .as_ref()
                        .map_or(defaults.secondary.clone(), LegacyAimTarget::upgrade),
                    weight: weight.unwrap_or(defaults.weight),
                    debug: *debug,
                    ..defaults
                };
                let info = UpgradeInfo::default()
                    .remap("bone", "item.name")
                    .remap("primary.space", "primary.space.name")
                    .remap("secondary.space", "secondary.space.name");
                (UpgradedSettings::Aim(settings), info)
            }
        };

        log::debug!("upgraded legacy {} node", self.name());
        Some(upgraded)
    }
}
