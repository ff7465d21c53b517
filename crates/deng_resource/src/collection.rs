//! Resource collections
//!
//! A collection groups the schemes of one resource kind (textures,
//! materials, fonts) behind a shared id sequence, so every manifest of that
//! kind can also be found by id.

use std::collections::BTreeMap;
use std::sync::Arc;

use deng_core::{scheme_key, Id, IdGenerator, ResourceUri};

use crate::error::{ResourceError, ResourceResult};
use crate::lifecycle::ResourceState;
use crate::manifest::Manifest;
use crate::scheme::Scheme;

/// All schemes of one resource kind
#[derive(Debug)]
pub struct ResourceCollection<R> {
    kind: &'static str,
    ids: Arc<IdGenerator>,
    /// Schemes in registration order; scheme-less lookups search this order
    schemes: Vec<Scheme<R>>,
    by_id: BTreeMap<Id, (usize, Box<str>)>,
}

impl<R> ResourceCollection<R> {
    /// Create an empty collection. `kind` is used in log messages.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            ids: Arc::new(IdGenerator::new()),
            schemes: Vec::new(),
            by_id: BTreeMap::new(),
        }
    }

    /// Resource kind name
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Register a scheme. Registering a known name returns the existing one.
    pub fn create_scheme(&mut self, name: &str) -> ResourceResult<&mut Scheme<R>> {
        let index = match self.scheme_index(name) {
            Some(index) => index,
            None => {
                let scheme = Scheme::with_ids(name, self.ids.clone())?;
                log::debug!("Created {} scheme '{}'", self.kind, name);
                self.schemes.push(scheme);
                self.schemes.len() - 1
            }
        };
        Ok(&mut self.schemes[index])
    }

    /// Check if a scheme name is known
    pub fn is_known_scheme(&self, name: &str) -> bool {
        self.scheme_index(name).is_some()
    }

    /// Look up a scheme by name
    pub fn scheme(&self, name: &str) -> ResourceResult<&Scheme<R>> {
        self.scheme_index(name)
            .map(|index| &self.schemes[index])
            .ok_or_else(|| ResourceError::UnknownScheme(name.to_string()))
    }

    /// Look up a scheme by name, mutable
    pub fn scheme_mut(&mut self, name: &str) -> ResourceResult<&mut Scheme<R>> {
        match self.scheme_index(name) {
            Some(index) => Ok(&mut self.schemes[index]),
            None => Err(ResourceError::UnknownScheme(name.to_string())),
        }
    }

    /// All schemes in registration order
    pub fn schemes(&self) -> impl Iterator<Item = &Scheme<R>> {
        self.schemes.iter()
    }

    /// Declare a manifest. The URI must name a known scheme.
    pub fn declare(&mut self, uri: &ResourceUri) -> ResourceResult<&mut Manifest<R>> {
        let scheme_name = uri
            .scheme()
            .ok_or_else(|| ResourceError::UnknownScheme(String::new()))?;
        let index = self
            .scheme_index(scheme_name)
            .ok_or_else(|| ResourceError::UnknownScheme(scheme_name.to_string()))?;

        let manifest = self.schemes[index].declare(uri.path().clone())?;
        self.by_id
            .entry(manifest.id())
            .or_insert_with(|| (index, uri.path().key().into()));
        Ok(manifest)
    }

    /// Find a manifest by URI. Scheme-less URIs search every scheme.
    pub fn find(&self, uri: &ResourceUri) -> ResourceResult<&Manifest<R>> {
        match uri.scheme() {
            Some(name) => self.scheme(name)?.find(uri.path()),
            None => self
                .schemes
                .iter()
                .find_map(|scheme| scheme.try_find(uri.path()))
                .ok_or_else(|| ResourceError::MissingResource(uri.to_string())),
        }
    }

    /// Find a manifest by URI, mutable
    pub fn find_mut(&mut self, uri: &ResourceUri) -> ResourceResult<&mut Manifest<R>> {
        let index = match uri.scheme() {
            Some(name) => self
                .scheme_index(name)
                .ok_or_else(|| ResourceError::UnknownScheme(name.to_string()))?,
            None => self
                .schemes
                .iter()
                .position(|scheme| scheme.has(uri.path()))
                .ok_or_else(|| ResourceError::MissingResource(uri.to_string()))?,
        };
        self.schemes[index].find_mut(uri.path())
    }

    /// Find a manifest by URI, `None` on miss (including unknown schemes)
    pub fn try_find(&self, uri: &ResourceUri) -> Option<&Manifest<R>> {
        self.find(uri).ok()
    }

    /// Find a manifest by id
    pub fn by_id(&self, id: Id) -> Option<&Manifest<R>> {
        let (index, key) = self.by_id.get(&id)?;
        self.schemes[*index].get(key).filter(|m| m.id() == id)
    }

    /// Find a manifest by id, mutable
    pub fn by_id_mut(&mut self, id: Id) -> Option<&mut Manifest<R>> {
        let (index, key) = self.by_id.get(&id)?;
        self.schemes[*index].get_mut(key).filter(|m| m.id() == id)
    }

    /// Lifecycle state of the slot a URI names
    pub fn state_of(&self, uri: &ResourceUri) -> ResourceResult<ResourceState> {
        match uri.scheme() {
            Some(name) => Ok(self.scheme(name)?.state_of(uri.path())),
            None => Ok(self
                .schemes
                .iter()
                .map(|scheme| scheme.state_of(uri.path()))
                .find(|state| *state != ResourceState::Undeclared)
                .unwrap_or(ResourceState::Undeclared)),
        }
    }

    /// Iterate over every manifest, scheme by scheme
    pub fn iter(&self) -> impl Iterator<Item = &Manifest<R>> {
        self.schemes.iter().flat_map(|scheme| scheme.iter())
    }

    /// Iterate mutably over every manifest
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Manifest<R>> {
        self.schemes.iter_mut().flat_map(|scheme| scheme.iter_mut())
    }

    /// Total manifest count
    pub fn len(&self) -> usize {
        self.schemes.iter().map(|scheme| scheme.len()).sum()
    }

    /// Check if there are no manifests
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroy matching manifests in every scheme. Returns their ids.
    pub fn clear_where(&mut self, mut pred: impl FnMut(&Manifest<R>) -> bool) -> Vec<Id> {
        let mut removed = Vec::new();
        for scheme in &mut self.schemes {
            removed.extend(scheme.clear_where(&mut pred));
        }
        for id in &removed {
            self.by_id.remove(id);
        }
        removed
    }

    /// Destroy every manifest in one scheme
    pub fn clear_scheme(&mut self, name: &str) -> ResourceResult<Vec<Id>> {
        let removed = self.scheme_mut(name)?.clear();
        for id in &removed {
            self.by_id.remove(id);
        }
        Ok(removed)
    }

    /// Destroy every manifest in every scheme
    pub fn clear(&mut self) -> Vec<Id> {
        self.clear_where(|_| true)
    }

    fn scheme_index(&self, name: &str) -> Option<usize> {
        let key = scheme_key(name);
        self.schemes
            .iter()
            .position(|scheme| scheme_key(scheme.name()) == key)
    }
}
