use super::key::ElementKey;
use crate::math::Transform;

/// Which of the two poses an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pose {
    Current,
    Initial,
}

/// Which space a transform is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    Local,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Slot {
    pub(crate) transform: Transform,
    pub(crate) dirty: bool,
}

/// The local/global pair of one pose. At most one side is dirty: the clean
/// side is the source of truth, the dirty side is derived on the next read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PoseSlots {
    pub(crate) local: Slot,
    pub(crate) global: Slot,
}

impl PoseSlots {
    pub(crate) fn from_local(local: Transform) -> Self {
        Self {
            local: Slot {
                transform: local,
                dirty: false,
            },
            global: Slot {
                transform: Transform::IDENTITY,
                dirty: true,
            },
        }
    }

    pub(crate) fn from_global(global: Transform) -> Self {
        Self {
            local: Slot {
                transform: Transform::IDENTITY,
                dirty: true,
            },
            global: Slot {
                transform: global,
                dirty: false,
            },
        }
    }

    pub(crate) fn slot(&self, space: Space) -> &Slot {
        match space {
            Space::Local => &self.local,
            Space::Global => &self.global,
        }
    }

    /// Stores `transform` as the authoritative value for `space`.
    pub(crate) fn set(&mut self, space: Space, transform: Transform) {
        let (written, derived) = match space {
            Space::Local => (&mut self.local, &mut self.global),
            Space::Global => (&mut self.global, &mut self.local),
        };
        written.transform = transform;
        written.dirty = false;
        derived.dirty = true;
    }

    pub(crate) fn is_consistent(&self) -> bool {
        !(self.local.dirty && self.global.dirty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParentWeight {
    pub index: usize,
    pub weight: f32,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub(crate) key: ElementKey,
    pub(crate) parent: Option<usize>,
    /// Additional weighted parents consumed by constraints. They never
    /// take part in local/global composition.
    pub(crate) weighted_parents: Vec<ParentWeight>,
    pub(crate) children: Vec<usize>,
    pub(crate) current: PoseSlots,
    pub(crate) initial: PoseSlots,
}

impl Element {
    pub(crate) fn new(key: ElementKey, parent: Option<usize>, slots: PoseSlots) -> Self {
        Self {
            key,
            parent,
            weighted_parents: Vec::new(),
            children: Vec::new(),
            current: slots,
            initial: slots,
        }
    }

    pub fn key(&self) -> &ElementKey {
        &self.key
    }

    pub fn first_parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn weighted_parents(&self) -> &[ParentWeight] {
        &self.weighted_parents
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// True when `space` of `pose` holds the authoritative value.
    pub fn is_clean(&self, pose: Pose, space: Space) -> bool {
        !self.slots(pose).slot(space).dirty
    }

    pub(crate) fn slots(&self, pose: Pose) -> &PoseSlots {
        match pose {
            Pose::Current => &self.current,
            Pose::Initial => &self.initial,
        }
    }

    pub(crate) fn slots_mut(&mut self, pose: Pose) -> &mut PoseSlots {
        match pose {
            Pose::Current => &mut self.current,
            Pose::Initial => &mut self.initial,
        }
    }
}
