use super::key::ElementKey;
use super::store::Hierarchy;

/// A key paired with its last resolved index.
///
/// Re-resolution is skipped while the hierarchy's topology version is
/// unchanged. When the version moves, the remembered index is re-checked
/// before falling back to a full lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedElement {
    key: ElementKey,
    index: Option<usize>,
    version: Option<u32>,
}

impl CachedElement {
    pub fn new(key: ElementKey) -> Self {
        Self {
            key,
            index: None,
            version: None,
        }
    }

    pub fn key(&self) -> &ElementKey {
        &self.key
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn is_valid(&self) -> bool {
        self.index.is_some()
    }

    /// Resolves `key` against `hierarchy`, returning whether it is valid.
    pub fn update(&mut self, key: &ElementKey, hierarchy: &Hierarchy) -> bool {
        let version = hierarchy.topology_version();
        if *key == self.key && self.version == Some(version) {
            return self.index.is_some();
        }

        if *key != self.key {
            self.key = key.clone();
            self.index = None;
        }
        self.version = Some(version);

        if let Some(index) = self.index {
            if hierarchy.key(index) == Some(&self.key) {
                return true;
            }
        }

        self.index = if self.key.is_set() {
            hierarchy.index_of(&self.key)
        } else {
            None
        };
        self.index.is_some()
    }

    /// Re-resolves the stored key.
    pub fn refresh(&mut self, hierarchy: &Hierarchy) -> bool {
        let key = self.key.clone();
        self.update(&key, hierarchy)
    }

    pub fn reset(&mut self) {
        self.index = None;
        self.version = None;
    }
}
