//! Element hierarchy with lazily cached local and global transforms.

mod cache;
mod element;
mod key;
mod store;

pub use cache::CachedElement;
pub use element::{Element, ParentWeight, Pose, Space};
pub use key::{ElementKey, ElementKind};
pub use store::Hierarchy;
