use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ElementKind {
    #[default]
    Bone,
    Null,
    Control,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Bone => "Bone",
            ElementKind::Null => "Null",
            ElementKind::Control => "Control",
        };
        f.write_str(name)
    }
}

/// Identity of an element: its kind plus a name unique within that kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct ElementKey {
    pub kind: ElementKind,
    pub name: String,
}

impl ElementKey {
    pub fn new(kind: ElementKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn bone(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Bone, name)
    }

    pub fn null(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Null, name)
    }

    pub fn control(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Control, name)
    }

    /// An unset key never resolves against any hierarchy.
    pub fn is_set(&self) -> bool {
        !self.name.is_empty()
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}
