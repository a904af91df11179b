//! Everything a solver touches while it runs: the hierarchy, a sink for
//! non-fatal warnings and an optional debug draw interface.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hierarchy::{CachedElement, ElementKey, Hierarchy};
use crate::math::{Transform, Vec3};

/// Non-fatal anomalies. Solvers report these and then either no-op or
/// continue with a degraded result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverWarning {
    #[error("Element not found: {0}")]
    ElementNotFound(ElementKey),

    #[error("Bone lengths not provided: either set item_b and effector_item or the lengths")]
    LengthsNotProvided,

    #[error("No bones found: the chain needs at least two items")]
    NoBonesFound,

    #[error("Invalid primary target or axis")]
    InvalidPrimaryTarget,

    #[error("Invalid secondary target or axis")]
    InvalidSecondaryTarget,

    #[error("Pole vector is degenerate, skipping secondary axis alignment")]
    DegeneratePoleVector,

    #[error("No chain found between {start} and {end}")]
    ChainNotFound { start: ElementKey, end: ElementKey },
}

pub trait WarningSink {
    fn report_warning(&mut self, warning: SolverWarning);
}

/// Forwards warnings to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWarnings;

impl WarningSink for LogWarnings {
    fn report_warning(&mut self, warning: SolverWarning) {
        log::warn!("{warning}");
    }
}

/// Keeps every reported warning, mostly useful in tests.
#[derive(Debug, Default, Clone)]
pub struct CollectWarnings {
    pub warnings: Vec<SolverWarning>,
}

impl CollectWarnings {
    pub fn contains(&self, warning: &SolverWarning) -> bool {
        self.warnings.contains(warning)
    }
}

impl WarningSink for CollectWarnings {
    fn report_warning(&mut self, warning: SolverWarning) {
        self.warnings.push(warning);
    }
}

pub type Color = [f32; 4];

/// Receiver for debug primitives. Only called when a solver's debug settings
/// are enabled.
pub trait DrawInterface {
    fn draw_line(&mut self, offset: &Transform, from: Vec3, to: Vec3, color: Color);
    fn draw_box(&mut self, offset: &Transform, transform: &Transform, color: Color);
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    pub enabled: bool,
    pub scale: f32,
    pub world_offset: Transform,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            scale: 10.0,
            world_offset: Transform::IDENTITY,
        }
    }
}

pub struct ExecuteContext<'a> {
    pub hierarchy: &'a mut Hierarchy,
    pub warnings: &'a mut dyn WarningSink,
    pub draw: Option<&'a mut dyn DrawInterface>,
}

impl<'a> ExecuteContext<'a> {
    pub fn new(hierarchy: &'a mut Hierarchy, warnings: &'a mut dyn WarningSink) -> Self {
        Self {
            hierarchy,
            warnings,
            draw: None,
        }
    }

    pub fn with_draw(mut self, draw: &'a mut dyn DrawInterface) -> Self {
        self.draw = Some(draw);
        self
    }

    pub fn warn(&mut self, warning: SolverWarning) {
        self.warnings.report_warning(warning);
    }

    /// Revalidates `cache` against `key`, reporting a missing element.
    pub fn resolve(&mut self, cache: &mut CachedElement, key: &ElementKey) -> Option<usize> {
        if cache.update(key, &*self.hierarchy) {
            cache.index()
        } else {
            self.warn(SolverWarning::ElementNotFound(key.clone()));
            None
        }
    }

    /// Like [`resolve`](Self::resolve) but an unset key is silently absent.
    pub fn resolve_optional(&mut self, cache: &mut CachedElement, key: &ElementKey) -> Option<usize> {
        if !key.is_set() {
            cache.reset();
            return None;
        }
        self.resolve(cache, key)
    }

    /// Draw interface to use for this call, if debugging is on.
    pub fn debug_draw(&mut self, settings: &DebugSettings) -> Option<&mut (dyn DrawInterface + 'a)> {
        if settings.enabled {
            self.draw.as_deref_mut()
        } else {
            None
        }
    }
}

/// Keeps every drawn primitive in world space.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordDraw {
    pub lines: Vec<(Vec3, Vec3, Color)>,
    pub boxes: Vec<(Transform, Color)>,
}

#[cfg(test)]
impl DrawInterface for RecordDraw {
    fn draw_line(&mut self, offset: &Transform, from: Vec3, to: Vec3, color: Color) {
        self.lines
            .push((offset.transform_point(from), offset.transform_point(to), color));
    }

    fn draw_box(&mut self, offset: &Transform, transform: &Transform, color: Color) {
        self.boxes.push((offset.mul_transform(transform), color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_element_is_reported_once_per_resolve() {
        let mut hierarchy = Hierarchy::new();
        let mut sink = CollectWarnings::default();
        let mut ctx = ExecuteContext::new(&mut hierarchy, &mut sink);

        let mut cache = CachedElement::default();
        let key = ElementKey::bone("ghost");
        assert_eq!(ctx.resolve(&mut cache, &key), None);
        assert_eq!(ctx.resolve_optional(&mut cache, &ElementKey::default()), None);

        assert_eq!(sink.warnings, vec![SolverWarning::ElementNotFound(key)]);
    }
}
