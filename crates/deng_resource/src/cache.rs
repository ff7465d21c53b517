//! Deferred preparation (precache) queue and material groups
//!
//! Map setup requests every material variant it will need. Requests are
//! queued here and prepared in one batch by
//! [`ResourceSystem::process_cache_queue`](crate::ResourceSystem::process_cache_queue),
//! strictly in request order.

use core::fmt;
use std::collections::VecDeque;
use std::sync::Arc;

use deng_core::Id;

use crate::error::{ResourceError, ResourceResult};
use crate::variant::MaterialVariantSpec;

/// Request to prepare one material variant
#[derive(Clone, Debug)]
pub struct CacheTask {
    pub material: Id,
    pub spec: Arc<MaterialVariantSpec>,
}

impl CacheTask {
    fn matches(&self, material: Id, spec: &Arc<MaterialVariantSpec>) -> bool {
        self.material == material && Arc::ptr_eq(&self.spec, spec)
    }
}

/// FIFO of pending cache tasks, deduplicated by (material, spec identity)
#[derive(Debug, Default)]
pub struct CacheQueue {
    tasks: VecDeque<CacheTask>,
}

impl CacheQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task. Returns false if an identical task is already pending.
    pub fn enqueue(&mut self, material: Id, spec: &Arc<MaterialVariantSpec>) -> bool {
        if self.contains(material, spec) {
            return false;
        }
        self.tasks.push_back(CacheTask {
            material,
            spec: spec.clone(),
        });
        true
    }

    /// Check if an identical task is pending
    pub fn contains(&self, material: Id, spec: &Arc<MaterialVariantSpec>) -> bool {
        self.tasks.iter().any(|task| task.matches(material, spec))
    }

    /// Take the oldest task
    pub fn pop(&mut self) -> Option<CacheTask> {
        self.tasks.pop_front()
    }

    /// Discard every pending task. Returns how many were dropped.
    pub fn purge(&mut self) -> usize {
        let count = self.tasks.len();
        self.tasks.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CacheTask> {
        self.tasks.iter()
    }
}

/// Outcome of draining the cache queue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheReport {
    /// Tasks prepared successfully
    pub prepared: usize,
    /// Tasks whose preparation failed
    pub failed: usize,
    /// Tasks whose material was cleared before processing
    pub skipped: usize,
}

impl CacheReport {
    pub fn total(&self) -> usize {
        self.prepared + self.failed + self.skipped
    }
}

impl fmt::Display for CacheReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} prepared, {} failed, {} skipped",
            self.prepared, self.failed, self.skipped
        )
    }
}

/// A precache group: materials that are always cached together
/// (e.g. the frames of an animated wall)
#[derive(Clone, Debug)]
pub struct MaterialGroup {
    id: u32,
    members: Vec<Id>,
}

impl MaterialGroup {
    /// 1-based group id
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Add a member; adding a present member is a no-op
    pub fn add(&mut self, material: Id) {
        if !self.has(material) {
            self.members.push(material);
        }
    }

    pub fn has(&self, material: Id) -> bool {
        self.members.contains(&material)
    }

    pub fn members(&self) -> &[Id] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Registry of precache groups, addressed by 1-based id
#[derive(Debug, Default)]
pub struct MaterialGroups {
    groups: Vec<MaterialGroup>,
}

impl MaterialGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty group and return its id
    pub fn create(&mut self) -> u32 {
        let id = self.groups.len() as u32 + 1;
        self.groups.push(MaterialGroup {
            id,
            members: Vec::new(),
        });
        id
    }

    pub fn get(&self, id: u32) -> ResourceResult<&MaterialGroup> {
        Self::index(id)
            .and_then(|index| self.groups.get(index))
            .ok_or(ResourceError::UnknownMaterialGroup(id))
    }

    pub fn get_mut(&mut self, id: u32) -> ResourceResult<&mut MaterialGroup> {
        Self::index(id)
            .and_then(|index| self.groups.get_mut(index))
            .ok_or(ResourceError::UnknownMaterialGroup(id))
    }

    /// Groups that contain `material`
    pub fn containing(&self, material: Id) -> impl Iterator<Item = &MaterialGroup> {
        self.groups.iter().filter(move |group| group.has(material))
    }

    /// Remove a material from every group
    pub fn forget(&mut self, material: Id) {
        for group in &mut self.groups {
            group.members.retain(|m| *m != material);
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    fn index(id: u32) -> Option<usize> {
        (id as usize).checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{MaterialContext, TextureUsageContext, TextureVariantSpec, VariantSpecs};

    fn spec(specs: &mut VariantSpecs, context: MaterialContext) -> Arc<MaterialVariantSpec> {
        specs.material_spec(context, TextureVariantSpec::new(TextureUsageContext::MapSurface))
    }

    #[test]
    fn test_queue_dedupes_by_spec_identity() {
        let mut specs = VariantSpecs::new();
        let wall = spec(&mut specs, MaterialContext::MapSurface);
        let sky = spec(&mut specs, MaterialContext::SkySphere);
        let mut queue = CacheQueue::new();

        assert!(queue.enqueue(Id::new(1), &wall));
        assert!(!queue.enqueue(Id::new(1), &wall));
        assert!(queue.enqueue(Id::new(1), &sky));
        assert!(queue.enqueue(Id::new(2), &wall));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut specs = VariantSpecs::new();
        let wall = spec(&mut specs, MaterialContext::MapSurface);
        let mut queue = CacheQueue::new();
        for raw in [3, 1, 2] {
            queue.enqueue(Id::new(raw), &wall);
        }

        let order: Vec<u32> = std::iter::from_fn(|| queue.pop()).map(|t| t.material.raw()).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn test_purge() {
        let mut specs = VariantSpecs::new();
        let wall = spec(&mut specs, MaterialContext::MapSurface);
        let mut queue = CacheQueue::new();
        queue.enqueue(Id::new(1), &wall);
        queue.enqueue(Id::new(2), &wall);

        assert_eq!(queue.purge(), 2);
        assert!(queue.is_empty());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_groups_are_one_based() {
        let mut groups = MaterialGroups::new();
        assert!(matches!(groups.get(0), Err(ResourceError::UnknownMaterialGroup(0))));

        let id = groups.create();
        assert_eq!(id, 1);
        groups.get_mut(id).unwrap().add(Id::new(5));
        groups.get_mut(id).unwrap().add(Id::new(5));
        assert_eq!(groups.get(id).unwrap().len(), 1);
        assert!(matches!(groups.get(2), Err(ResourceError::UnknownMaterialGroup(2))));
    }

    #[test]
    fn test_containing() {
        let mut groups = MaterialGroups::new();
        let a = groups.create();
        let b = groups.create();
        groups.get_mut(a).unwrap().add(Id::new(1));
        groups.get_mut(b).unwrap().add(Id::new(1));
        groups.get_mut(b).unwrap().add(Id::new(2));

        assert_eq!(groups.containing(Id::new(1)).count(), 2);
        groups.forget(Id::new(1));
        assert_eq!(groups.containing(Id::new(1)).count(), 0);
        assert_eq!(groups.get(b).unwrap().members(), &[Id::new(2)]);
    }
}
