use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::context::DebugSettings;
use crate::error::ConfigError;
use crate::math::Vec3;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Defaults for two-bone solvers built with `TwoBoneIkSettings::from_config`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoBoneConfig {
    pub primary_axis: Vec3,
    pub secondary_axis: Vec3,
    pub secondary_axis_weight: f32,
    pub enable_stretch: bool,
    pub stretch_start_ratio: f32,
    pub stretch_maximum_ratio: f32,
    pub propagate_to_children: bool,
}

impl Default for TwoBoneConfig {
    fn default() -> Self {
        Self {
            primary_axis: Vec3::X,
            secondary_axis: Vec3::Y,
            secondary_axis_weight: 1.0,
            enable_stretch: false,
            stretch_start_ratio: 0.75,
            stretch_maximum_ratio: 1.25,
            propagate_to_children: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcdConfig {
    /// Effector-to-target distance considered converged.
    pub precision: f32,
    pub weight: f32,
    pub max_iterations: u32,
    pub start_from_tail: bool,
    /// Degrees.
    pub base_rotation_limit: f32,
    pub propagate_to_children: bool,
}

impl Default for CcdConfig {
    fn default() -> Self {
        Self {
            precision: 1.0,
            weight: 1.0,
            max_iterations: 10,
            start_from_tail: true,
            base_rotation_limit: 30.0,
            propagate_to_children: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimConfig {
    pub primary_axis: Vec3,
    pub secondary_axis: Vec3,
    pub weight: f32,
    pub propagate_to_children: bool,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            primary_axis: Vec3::X,
            secondary_axis: Vec3::Z,
            weight: 1.0,
            propagate_to_children: true,
        }
    }
}

// ---------------------------------------------------------------------------
// SolverConfig
// ---------------------------------------------------------------------------

/// Solver defaults, usually read from a TOML file with `[two_bone]`, `[ccd]`,
/// `[aim]` and `[debug]` tables. Missing keys take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub two_bone: TwoBoneConfig,
    pub ccd: CcdConfig,
    pub aim: AimConfig,
    pub debug: DebugSettings,
}

impl SolverConfig {
    /// Parses a TOML document and clamps out-of-range values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config.clamped())
    }

    /// Load from TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Pulls every value back into its usable range.
    pub fn clamped(mut self) -> Self {
        let defaults = Self::default();

        let two_bone = &mut self.two_bone;
        two_bone.secondary_axis_weight = two_bone.secondary_axis_weight.clamp(0.0, 1.0);
        two_bone.stretch_start_ratio = two_bone.stretch_start_ratio.max(0.0);
        two_bone.stretch_maximum_ratio = two_bone.stretch_maximum_ratio.max(two_bone.stretch_start_ratio);
        if two_bone.primary_axis.length_squared() <= f32::EPSILON {
            two_bone.primary_axis = defaults.two_bone.primary_axis;
        }
        if two_bone.secondary_axis.length_squared() <= f32::EPSILON {
            two_bone.secondary_axis = defaults.two_bone.secondary_axis;
        }

        let ccd = &mut self.ccd;
        ccd.precision = ccd.precision.max(0.0);
        ccd.weight = ccd.weight.clamp(0.0, 1.0);
        ccd.max_iterations = ccd.max_iterations.max(1);
        ccd.base_rotation_limit = ccd.base_rotation_limit.clamp(0.0, 180.0);

        let aim = &mut self.aim;
        aim.weight = aim.weight.clamp(0.0, 1.0);
        if aim.primary_axis.length_squared() <= f32::EPSILON {
            aim.primary_axis = defaults.aim.primary_axis;
        }
        if aim.secondary_axis.length_squared() <= f32::EPSILON {
            aim.secondary_axis = defaults.aim.secondary_axis;
        }

        self.debug.scale = self.debug.scale.max(0.0);
        self
    }
}
