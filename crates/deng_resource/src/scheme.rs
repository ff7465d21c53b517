//! Manifest schemes
//!
//! A scheme is a namespace ("Textures", "Flats", "System"...) mapping
//! symbolic paths to manifests. Paths are unique within a scheme and looked
//! up case-insensitively in O(log n).

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use deng_core::{Id, IdGenerator, Path, ResourceUri};

use crate::error::{ResourceError, ResourceResult};
use crate::lifecycle::ResourceState;
use crate::manifest::Manifest;

/// A named namespace of manifests
#[derive(Debug)]
pub struct Scheme<R> {
    name: Box<str>,
    ids: Arc<IdGenerator>,
    manifests: BTreeMap<Box<str>, Manifest<R>>,
    /// Paths whose manifests were cleared and not declared since
    cleared: BTreeSet<Box<str>>,
}

impl<R> Scheme<R> {
    /// Create a scheme with its own id sequence
    pub fn new(name: &str) -> ResourceResult<Self> {
        Self::with_ids(name, Arc::new(IdGenerator::new()))
    }

    /// Create a scheme drawing ids from a shared sequence
    pub fn with_ids(name: &str, ids: Arc<IdGenerator>) -> ResourceResult<Self> {
        // Validates the name the same way a URI would.
        ResourceUri::new(name, "-")?;
        Ok(Self {
            name: name.into(),
            ids,
            manifests: BTreeMap::new(),
            cleared: BTreeSet::new(),
        })
    }

    /// Scheme name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a manifest. Returns the existing one if the path is known.
    pub fn declare(&mut self, path: impl Into<Path>) -> ResourceResult<&mut Manifest<R>> {
        let path = path.into();
        let uri = ResourceUri::new(&self.name, path)?;
        let key: Box<str> = uri.path().key().into();

        self.cleared.remove(&key);
        match self.manifests.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let id = self.ids.next();
                log::debug!("Declared {} (id {})", uri, id);
                Ok(entry.insert(Manifest::new(id, uri)))
            }
        }
    }

    /// Find a manifest by path
    pub fn find(&self, path: &Path) -> ResourceResult<&Manifest<R>> {
        self.try_find(path)
            .ok_or_else(|| self.missing(path))
    }

    /// Find a manifest by path, mutable
    pub fn find_mut(&mut self, path: &Path) -> ResourceResult<&mut Manifest<R>> {
        let name = &self.name;
        self.manifests
            .get_mut(path.key())
            .ok_or_else(|| ResourceError::MissingResource(format!("{}:{}", name, path)))
    }

    /// Find a manifest by path, `None` on miss
    pub fn try_find(&self, path: &Path) -> Option<&Manifest<R>> {
        self.manifests.get(path.key())
    }

    /// Find a manifest by path, mutable, `None` on miss
    pub fn try_find_mut(&mut self, path: &Path) -> Option<&mut Manifest<R>> {
        self.manifests.get_mut(path.key())
    }

    /// Find a manifest by its scheme-specific integer id
    pub fn find_by_unique_id(&self, unique_id: i32) -> Option<&Manifest<R>> {
        self.manifests.values().find(|m| m.unique_id() == unique_id)
    }

    /// Check if a path is declared
    pub fn has(&self, path: &Path) -> bool {
        self.manifests.contains_key(path.key())
    }

    /// Lifecycle state of a path, including slots that no longer exist
    pub fn state_of(&self, path: &Path) -> ResourceState {
        match self.try_find(path) {
            Some(manifest) => manifest.state(),
            None if self.cleared.contains(path.key()) => ResourceState::Cleared,
            None => ResourceState::Undeclared,
        }
    }

    /// Number of manifests
    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    /// Iterate over manifests ordered by path
    pub fn iter(&self) -> impl Iterator<Item = &Manifest<R>> {
        self.manifests.values()
    }

    /// Iterate mutably over manifests ordered by path
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Manifest<R>> {
        self.manifests.values_mut()
    }

    /// Destroy one manifest and its resource
    pub fn remove(&mut self, path: &Path) -> Option<Manifest<R>> {
        let mut manifest = self.manifests.remove(path.key())?;
        manifest.clear();
        self.cleared.insert(path.key().into());
        Some(manifest)
    }

    /// Destroy the manifests matching `pred`. Returns their ids.
    pub fn clear_where(&mut self, mut pred: impl FnMut(&Manifest<R>) -> bool) -> Vec<Id> {
        let keys: Vec<Box<str>> = self
            .manifests
            .iter()
            .filter(|(_, m)| pred(m))
            .map(|(k, _)| k.clone())
            .collect();

        let mut removed = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(mut manifest) = self.manifests.remove(&key) {
                manifest.clear();
                removed.push(manifest.id());
                self.cleared.insert(key);
            }
        }
        removed
    }

    /// Destroy every manifest and resource in the scheme
    pub fn clear(&mut self) -> Vec<Id> {
        let removed = self.clear_where(|_| true);
        if !removed.is_empty() {
            log::debug!("Cleared {} manifests from scheme {}", removed.len(), self.name);
        }
        removed
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Manifest<R>> {
        self.manifests.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Manifest<R>> {
        self.manifests.get_mut(key)
    }

    fn missing(&self, path: &Path) -> ResourceError {
        ResourceError::MissingResource(format!("{}:{}", self.name, path))
    }
}
