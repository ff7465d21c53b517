//! Resource manifests
//!
//! A manifest is the named slot for a resource. It exists before the
//! resource is defined and outlives releases and reloads of it.

use deng_core::{Id, Path, ResourceUri};

use crate::lifecycle::{Lifecycle, LifecycleError, ResourceOrigin, ResourceState};

/// Named slot for a resource of type `R`
#[derive(Debug)]
pub struct Manifest<R> {
    id: Id,
    uri: ResourceUri,
    unique_id: i32,
    lifecycle: Lifecycle,
    resource: Option<R>,
}

impl<R> Manifest<R> {
    /// Create a declared, empty manifest. `uri` carries the owning scheme.
    pub fn new(id: Id, uri: ResourceUri) -> Self {
        Self {
            id,
            uri,
            unique_id: 0,
            lifecycle: Lifecycle::declared(ResourceOrigin::Runtime),
            resource: None,
        }
    }

    /// Unique id, never reused
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of the owning scheme
    pub fn scheme_name(&self) -> &str {
        self.uri.scheme().unwrap_or_default()
    }

    /// Path within the scheme
    pub fn path(&self) -> &Path {
        self.uri.path()
    }

    /// Full `scheme:path` URI
    pub fn uri(&self) -> &ResourceUri {
        &self.uri
    }

    /// Scheme-specific integer id (e.g. the lump number of the source data)
    pub fn unique_id(&self) -> i32 {
        self.unique_id
    }

    /// Set the scheme-specific integer id
    pub fn set_unique_id(&mut self, unique_id: i32) {
        self.unique_id = unique_id;
    }

    /// Lifecycle state
    pub fn state(&self) -> ResourceState {
        self.lifecycle.state()
    }

    /// Resource origin
    pub fn origin(&self) -> ResourceOrigin {
        self.lifecycle.origin()
    }

    /// Change the resource origin
    pub fn set_origin(&mut self, origin: ResourceOrigin) {
        self.lifecycle.set_origin(origin);
    }

    /// Check if a resource is attached
    pub fn has_resource(&self) -> bool {
        self.resource.is_some()
    }

    /// Attached resource
    pub fn resource(&self) -> Option<&R> {
        self.resource.as_ref()
    }

    /// Attached resource, mutable
    pub fn resource_mut(&mut self) -> Option<&mut R> {
        self.resource.as_mut()
    }

    /// Attach a resource, returning the one it replaces
    pub fn define(&mut self, resource: R) -> Result<Option<R>, LifecycleError> {
        self.lifecycle.define()?;
        Ok(self.resource.replace(resource))
    }

    /// Mark GPU handles as freed
    pub fn mark_released(&mut self) -> Result<(), LifecycleError> {
        self.lifecycle.release()
    }

    /// Mark the resource as usable again after a release
    pub fn mark_restored(&mut self) -> Result<(), LifecycleError> {
        self.lifecycle.restore()
    }

    /// Destroy the resource and mark the slot cleared
    pub fn clear(&mut self) -> Option<R> {
        self.lifecycle.clear();
        self.resource.take()
    }

    /// Resource and lifecycle in one mutable borrow
    pub(crate) fn parts_mut(&mut self) -> (&mut Lifecycle, Option<&mut R>) {
        (&mut self.lifecycle, self.resource.as_mut())
    }
}
