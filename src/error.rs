use thiserror::Error;

use crate::hierarchy::ElementKey;

/// Errors raised by authoring operations on a [`Hierarchy`](crate::hierarchy::Hierarchy).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("Element not found: {0}")]
    ElementNotFound(ElementKey),

    #[error("Element already exists: {0}")]
    DuplicateKey(ElementKey),

    #[error("Parenting {child} under {parent} would create a cycle")]
    CycleDetected { child: ElementKey, parent: ElementKey },

    #[error("Invalid element index: {0}")]
    InvalidIndex(usize),

    #[error("Parent walk exceeded depth limit of {0}")]
    DepthLimitExceeded(usize),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
