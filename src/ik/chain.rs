use crate::hierarchy::Hierarchy;
use crate::math::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainLink {
    pub index: usize,
    /// Initial-pose distance from the previous link. Zero for the first link.
    pub length: f32,
    /// Cumulative length up to this link divided by the chain length.
    pub ratio: f32,
}

/// Elements between a start and an end element, ordered root to tip.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    links: Vec<ChainLink>,
    total_length: f32,
    topology_version: Option<u32>,
}

impl Chain {
    /// Walks primary parents from `end` up to `start`. The chain is empty when
    /// `start` is not an ancestor of (or equal to) `end`.
    pub fn extract(hierarchy: &mut Hierarchy, start: usize, end: usize) -> Self {
        let mut chain = Self::default();
        chain.rebuild_if_changed(hierarchy, start, end);
        chain
    }

    /// Recomputes the chain only when its membership changed. Returns whether
    /// the links were rebuilt.
    pub fn rebuild_if_changed(&mut self, hierarchy: &mut Hierarchy, start: usize, end: usize) -> bool {
        let version = hierarchy.topology_version();
        if self.topology_version == Some(version)
            && self.links.first().map(|l| l.index) == Some(start)
            && self.links.last().map(|l| l.index) == Some(end)
        {
            return false;
        }
        self.topology_version = Some(version);

        let mut indices = Vec::with_capacity(self.links.len().max(4));
        let mut cursor = Some(end);
        while let Some(index) = cursor {
            if index >= hierarchy.len() || indices.len() > hierarchy.len() {
                break;
            }
            indices.push(index);
            if index == start {
                break;
            }
            cursor = hierarchy.first_parent(index);
        }
        if indices.last() != Some(&start) {
            indices.clear();
        }
        indices.reverse();

        let unchanged = indices.len() == self.links.len()
            && indices.iter().zip(&self.links).all(|(&i, l)| i == l.index);
        if unchanged {
            return false;
        }

        self.links.clear();
        let mut previous = None;
        let mut cumulative = 0.0;
        for &index in &indices {
            let position = hierarchy.initial_global_transform(index).position;
            let length = previous.map_or(0.0, |p: Vec3| p.distance(position));
            cumulative += length;
            self.links.push(ChainLink {
                index,
                length,
                ratio: cumulative,
            });
            previous = Some(position);
        }

        self.total_length = cumulative;
        for link in &mut self.links {
            link.ratio = if cumulative > f32::EPSILON {
                link.ratio / cumulative
            } else {
                0.0
            };
        }

        log::debug!("rebuilt chain with {} links", self.links.len());
        true
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.links.iter().map(|l| l.index)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }
}
