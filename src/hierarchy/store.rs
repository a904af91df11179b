use std::collections::HashMap;

use super::element::{Element, ParentWeight, Pose, PoseSlots, Slot, Space};
use super::key::ElementKey;
use crate::error::HierarchyError;
use crate::math::Transform;

const POSES: [Pose; 2] = [Pose::Current, Pose::Initial];

/// Arena of rig elements addressed by stable indices.
///
/// Every element carries a current and an initial pose, each stored as a
/// local/global pair. Writes make one side authoritative and mark the other
/// dirty; reads of a dirty side recompute it lazily by walking toward the
/// nearest clean ancestor.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    elements: Vec<Element>,
    lookup: HashMap<ElementKey, usize>,
    topology_version: u32,
    scratch: Vec<usize>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Bumped by every add, remove and reparent.
    pub fn topology_version(&self) -> u32 {
        self.topology_version
    }

    pub fn index_of(&self, key: &ElementKey) -> Option<usize> {
        self.lookup.get(key).copied()
    }

    pub fn contains(&self, key: &ElementKey) -> bool {
        self.lookup.contains_key(key)
    }

    pub fn key(&self, index: usize) -> Option<&ElementKey> {
        self.elements.get(index).map(|e| &e.key)
    }

    pub fn element(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn first_parent(&self, index: usize) -> Option<usize> {
        self.elements.get(index).and_then(|e| e.parent)
    }

    /// Primary parent (weight 1) followed by the weighted constraint parents.
    pub fn parents(&self, index: usize) -> Vec<ParentWeight> {
        let Some(element) = self.elements.get(index) else {
            return Vec::new();
        };
        element
            .parent
            .map(|index| ParentWeight { index, weight: 1.0 })
            .into_iter()
            .chain(element.weighted_parents.iter().copied())
            .collect()
    }

    pub fn children(&self, index: usize) -> &[usize] {
        self.elements
            .get(index)
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
    }

    // ------------------------------------------------------------------
    // Authoring
    // ------------------------------------------------------------------

    /// Adds an element whose initial and current pose are both `transform`,
    /// interpreted in `space`.
    pub fn add_element(
        &mut self,
        key: ElementKey,
        parent: Option<&ElementKey>,
        transform: Transform,
        space: Space,
    ) -> Result<usize, HierarchyError> {
        if self.lookup.contains_key(&key) {
            return Err(HierarchyError::DuplicateKey(key));
        }
        let parent = parent.map(|p| self.require(p)).transpose()?;

        let slots = match space {
            Space::Local => PoseSlots::from_local(transform),
            Space::Global => PoseSlots::from_global(transform),
        };

        let index = self.elements.len();
        if let Some(parent) = parent {
            self.elements[parent].children.push(index);
        }
        self.lookup.insert(key.clone(), index);
        self.elements.push(Element::new(key, parent, slots));
        self.topology_version = self.topology_version.wrapping_add(1);
        Ok(index)
    }

    /// Adds or updates a weighted constraint parent. Negative weights clamp to 0.
    pub fn add_parent(
        &mut self,
        child: &ElementKey,
        parent: &ElementKey,
        weight: f32,
    ) -> Result<(), HierarchyError> {
        let child_index = self.require(child)?;
        let parent_index = self.require(parent)?;
        if child_index == parent_index {
            return Err(HierarchyError::CycleDetected {
                child: child.clone(),
                parent: parent.clone(),
            });
        }

        let weight = weight.max(0.0);
        let weighted = &mut self.elements[child_index].weighted_parents;
        match weighted.iter_mut().find(|p| p.index == parent_index) {
            Some(existing) => existing.weight = weight,
            None => weighted.push(ParentWeight {
                index: parent_index,
                weight,
            }),
        }
        self.topology_version = self.topology_version.wrapping_add(1);
        Ok(())
    }

    /// Moves `child` under `parent` (or to the root). With `keep_global` the
    /// element stays put in world space, otherwise it keeps its local pose.
    pub fn set_parent(
        &mut self,
        child: &ElementKey,
        parent: Option<&ElementKey>,
        keep_global: bool,
    ) -> Result<(), HierarchyError> {
        let child_index = self.require(child)?;
        let parent_index = parent.map(|p| self.require(p)).transpose()?;

        if let Some(parent_index) = parent_index {
            if parent_index == child_index || self.is_ancestor(child_index, parent_index)? {
                return Err(HierarchyError::CycleDetected {
                    child: child.clone(),
                    parent: self.elements[parent_index].key.clone(),
                });
            }
        }

        for pose in POSES {
            if keep_global {
                self.resolve_global(child_index, pose)?;
            } else {
                self.capture_locals(child_index, pose, true)?;
            }
        }

        if let Some(old) = self.elements[child_index].parent {
            self.elements[old].children.retain(|&c| c != child_index);
        }
        if let Some(new) = parent_index {
            self.elements[new].children.push(child_index);
        }
        let element = &mut self.elements[child_index];
        element.parent = parent_index;
        element.weighted_parents.retain(|p| Some(p.index) != parent_index);

        if keep_global {
            for pose in POSES {
                self.elements[child_index].slots_mut(pose).local.dirty = true;
            }
        }

        self.topology_version = self.topology_version.wrapping_add(1);
        Ok(())
    }

    /// Removes an element. Its children are re-parented to its own parent and
    /// keep their global pose. Outstanding indices above it shift down by one.
    pub fn remove_element(&mut self, key: &ElementKey) -> Result<(), HierarchyError> {
        let index = self.require(key)?;
        let grand_parent = self.elements[index].parent;
        let children = self.elements[index].children.clone();

        for &child in &children {
            for pose in POSES {
                self.resolve_global(child, pose)?;
            }
        }

        if let Some(grand_parent) = grand_parent {
            self.elements[grand_parent].children.retain(|&c| c != index);
        }
        for &child in &children {
            let element = &mut self.elements[child];
            element.parent = grand_parent;
            for pose in POSES {
                element.slots_mut(pose).local.dirty = true;
            }
            if let Some(grand_parent) = grand_parent {
                self.elements[grand_parent].children.push(child);
            }
        }
        for element in &mut self.elements {
            element.weighted_parents.retain(|p| p.index != index);
        }

        self.elements.remove(index);
        self.lookup.remove(key);

        let remap = |i: usize| if i > index { i - 1 } else { i };
        for element in &mut self.elements {
            element.parent = element.parent.map(remap);
            for parent in &mut element.weighted_parents {
                parent.index = remap(parent.index);
            }
            for child in &mut element.children {
                *child = remap(*child);
            }
        }
        for value in self.lookup.values_mut() {
            *value = remap(*value);
        }

        self.topology_version = self.topology_version.wrapping_add(1);
        Ok(())
    }

    /// Copies every element's initial pose over its current pose.
    pub fn reset_pose_to_initial(&mut self) {
        for element in &mut self.elements {
            element.current = element.initial;
        }
    }

    // ------------------------------------------------------------------
    // Transform access
    // ------------------------------------------------------------------

    pub fn get_transform(
        &mut self,
        index: usize,
        pose: Pose,
        space: Space,
    ) -> Result<Transform, HierarchyError> {
        self.check_index(index)?;
        match space {
            Space::Global => self.resolve_global(index, pose),
            Space::Local => self.resolve_local(index, pose),
        }
    }

    /// Writes `transform` as the authoritative value of `space`.
    ///
    /// Without `propagate_to_children` every direct child keeps its global
    /// transform. With it, descendants keep their local transforms and their
    /// globals are recomputed immediately.
    pub fn set_transform(
        &mut self,
        index: usize,
        pose: Pose,
        space: Space,
        transform: Transform,
        propagate_to_children: bool,
    ) -> Result<(), HierarchyError> {
        self.check_index(index)?;

        if propagate_to_children {
            self.capture_locals(index, pose, false)?;
        } else {
            for i in 0..self.elements[index].children.len() {
                let child = self.elements[index].children[i];
                self.resolve_global(child, pose)?;
                self.elements[child].slots_mut(pose).local.dirty = true;
            }
        }

        self.elements[index].slots_mut(pose).set(space, transform);

        if propagate_to_children {
            let mut subtree = std::mem::take(&mut self.scratch);
            self.collect_descendants(index, &mut subtree);
            let result = subtree
                .iter()
                .try_for_each(|&d| self.resolve_global(d, pose).map(|_| ()));
            self.scratch = subtree;
            result?;
        }
        Ok(())
    }

    pub fn global_transform(&mut self, index: usize) -> Transform {
        self.transform_or_identity(index, Pose::Current, Space::Global)
    }

    pub fn local_transform(&mut self, index: usize) -> Transform {
        self.transform_or_identity(index, Pose::Current, Space::Local)
    }

    pub fn initial_global_transform(&mut self, index: usize) -> Transform {
        self.transform_or_identity(index, Pose::Initial, Space::Global)
    }

    pub fn initial_local_transform(&mut self, index: usize) -> Transform {
        self.transform_or_identity(index, Pose::Initial, Space::Local)
    }

    pub fn set_global_transform(&mut self, index: usize, transform: Transform, propagate_to_children: bool) {
        self.set_or_warn(index, Pose::Current, Space::Global, transform, propagate_to_children);
    }

    pub fn set_local_transform(&mut self, index: usize, transform: Transform, propagate_to_children: bool) {
        self.set_or_warn(index, Pose::Current, Space::Local, transform, propagate_to_children);
    }

    pub fn set_initial_global_transform(&mut self, index: usize, transform: Transform, propagate_to_children: bool) {
        self.set_or_warn(index, Pose::Initial, Space::Global, transform, propagate_to_children);
    }

    pub fn set_initial_local_transform(&mut self, index: usize, transform: Transform, propagate_to_children: bool) {
        self.set_or_warn(index, Pose::Initial, Space::Local, transform, propagate_to_children);
    }

    /// Global transform of the primary parent, or identity for root elements.
    pub fn parent_transform(&mut self, index: usize, pose: Pose) -> Transform {
        match self.first_parent(index) {
            Some(parent) => self.transform_or_identity(parent, pose, Space::Global),
            None => Transform::IDENTITY,
        }
    }

    pub fn try_transform_by_key(
        &mut self,
        key: &ElementKey,
        pose: Pose,
        space: Space,
    ) -> Result<Transform, HierarchyError> {
        let index = self.require(key)?;
        self.get_transform(index, pose, space)
    }

    pub fn global_transform_by_key(&mut self, key: &ElementKey) -> Transform {
        self.try_transform_by_key(key, Pose::Current, Space::Global)
            .unwrap_or_else(|err| {
                log::warn!("{err}");
                Transform::IDENTITY
            })
    }

    pub fn set_global_transform_by_key(
        &mut self,
        key: &ElementKey,
        transform: Transform,
        propagate_to_children: bool,
    ) -> Result<(), HierarchyError> {
        let index = self.require(key)?;
        self.set_transform(index, Pose::Current, Space::Global, transform, propagate_to_children)
    }

    pub fn set_local_transform_by_key(
        &mut self,
        key: &ElementKey,
        transform: Transform,
        propagate_to_children: bool,
    ) -> Result<(), HierarchyError> {
        let index = self.require(key)?;
        self.set_transform(index, Pose::Current, Space::Local, transform, propagate_to_children)
    }

    /// True when no element has both sides of a pose dirty.
    pub fn is_consistent(&self) -> bool {
        self.elements
            .iter()
            .all(|e| e.current.is_consistent() && e.initial.is_consistent())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require(&self, key: &ElementKey) -> Result<usize, HierarchyError> {
        self.index_of(key)
            .ok_or_else(|| HierarchyError::ElementNotFound(key.clone()))
    }

    fn check_index(&self, index: usize) -> Result<(), HierarchyError> {
        if index < self.elements.len() {
            Ok(())
        } else {
            Err(HierarchyError::InvalidIndex(index))
        }
    }

    fn transform_or_identity(&mut self, index: usize, pose: Pose, space: Space) -> Transform {
        self.get_transform(index, pose, space).unwrap_or_else(|err| {
            log::warn!("{err}");
            Transform::IDENTITY
        })
    }

    fn set_or_warn(
        &mut self,
        index: usize,
        pose: Pose,
        space: Space,
        transform: Transform,
        propagate_to_children: bool,
    ) {
        if let Err(err) = self.set_transform(index, pose, space, transform, propagate_to_children) {
            log::warn!("{err}");
        }
    }

    fn is_ancestor(&self, ancestor: usize, of: usize) -> Result<bool, HierarchyError> {
        let limit = self.elements.len();
        let mut cursor = self.elements[of].parent;
        let mut depth = 0;
        while let Some(index) = cursor {
            if index == ancestor {
                return Ok(true);
            }
            depth += 1;
            if depth > limit {
                return Err(HierarchyError::DepthLimitExceeded(limit));
            }
            cursor = self.elements[index].parent;
        }
        Ok(false)
    }

    /// Recomputes a dirty global by composing down from the nearest clean ancestor.
    fn resolve_global(&mut self, index: usize, pose: Pose) -> Result<Transform, HierarchyError> {
        let limit = self.elements.len();
        let mut pending = std::mem::take(&mut self.scratch);
        pending.clear();

        let mut parent_global = Transform::IDENTITY;
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            let element = &self.elements[i];
            let slots = element.slots(pose);
            if !slots.global.dirty {
                parent_global = slots.global.transform;
                break;
            }
            pending.push(i);
            if pending.len() > limit {
                self.scratch = pending;
                return Err(HierarchyError::DepthLimitExceeded(limit));
            }
            cursor = element.parent;
        }

        for &i in pending.iter().rev() {
            let slots = self.elements[i].slots_mut(pose);
            let global = parent_global.mul_transform(&slots.local.transform);
            slots.global = Slot {
                transform: global,
                dirty: false,
            };
            parent_global = global;
        }

        self.scratch = pending;
        Ok(self.elements[index].slots(pose).global.transform)
    }

    fn resolve_local(&mut self, index: usize, pose: Pose) -> Result<Transform, HierarchyError> {
        let slots = self.elements[index].slots(pose);
        if !slots.local.dirty {
            return Ok(slots.local.transform);
        }

        let parent_global = match self.elements[index].parent {
            Some(parent) => self.resolve_global(parent, pose)?,
            None => Transform::IDENTITY,
        };

        let slots = self.elements[index].slots_mut(pose);
        let local = slots.global.transform.relative_to(&parent_global);
        slots.local = Slot {
            transform: local,
            dirty: false,
        };
        Ok(local)
    }

    /// Makes the locals of the subtree below `root` authoritative and marks
    /// their globals dirty, so they follow the root on the next read.
    fn capture_locals(&mut self, root: usize, pose: Pose, include_root: bool) -> Result<(), HierarchyError> {
        let mut subtree = std::mem::take(&mut self.scratch);
        self.collect_descendants(root, &mut subtree);
        if include_root {
            subtree.insert(0, root);
        }

        // parents come before children, so each local is taken against the
        // parent's global before that global is invalidated
        let result = subtree.iter().try_for_each(|&index| {
            self.resolve_local(index, pose)?;
            self.resolve_global(index, pose).map(|_| ())
        });
        if result.is_ok() {
            for &index in &subtree {
                self.elements[index].slots_mut(pose).global.dirty = true;
            }
        }
        self.scratch = subtree;
        result
    }

    /// Pre-order list of all descendants of `root` (excluding `root`).
    fn collect_descendants(&self, root: usize, out: &mut Vec<usize>) {
        out.clear();
        let mut stack: Vec<usize> = self.elements[root].children.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            out.push(index);
            stack.extend(self.elements[index].children.iter().rev().copied());
        }
    }
}
