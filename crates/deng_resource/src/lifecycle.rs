//! Resource lifecycle
//!
//! ```text
//!  Undeclared ──declare──► Declared ──define──► Defined ◄──prepare── Released
//!                                                  │                    ▲
//!                                                  └──────release───────┘
//!  any state ──clear──► Cleared   (only a fresh declare leaves it)
//! ```
//!
//! Runtime resources come back on their own: a released runtime texture is
//! re-uploaded the next time a variant is prepared, and a cleared runtime
//! resource is re-declared by whoever uses it next. System resources are
//! owned by the engine and must be re-initialised explicitly after a clear.

use core::fmt;
use thiserror::Error;

/// Lifecycle state of a resource slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// No manifest exists
    Undeclared,
    /// Manifest exists, no resource attached
    Declared,
    /// Resource attached and usable
    Defined,
    /// Resource alive but its GPU handles were freed
    Released,
    /// Manifest and resource destroyed
    Cleared,
}

impl ResourceState {
    /// Check if a resource object is attached in this state
    pub fn has_resource(self) -> bool {
        matches!(self, Self::Defined | Self::Released)
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Undeclared => "undeclared",
            Self::Declared => "declared",
            Self::Defined => "defined",
            Self::Released => "released",
            Self::Cleared => "cleared",
        };
        f.write_str(name)
    }
}

/// Who owns a resource and therefore who reloads it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ResourceOrigin {
    /// Game data; reloads on demand
    #[default]
    Runtime,
    /// Engine built-in; needs an explicit re-init after clearing
    System,
}

impl fmt::Display for ResourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime => f.write_str("runtime"),
            Self::System => f.write_str("system"),
        }
    }
}

/// A lifecycle transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Define,
    Release,
    Restore,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Define => f.write_str("define"),
            Self::Release => f.write_str("release"),
            Self::Restore => f.write_str("restore"),
        }
    }
}

/// Attempted an illegal transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {transition} a resource that is {from}")]
pub struct LifecycleError {
    pub from: ResourceState,
    pub transition: Transition,
}

/// Per-resource state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lifecycle {
    state: ResourceState,
    origin: ResourceOrigin,
}

impl Lifecycle {
    /// A freshly declared slot
    pub fn declared(origin: ResourceOrigin) -> Self {
        Self {
            state: ResourceState::Declared,
            origin,
        }
    }

    /// Current state
    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// Resource origin
    pub fn origin(&self) -> ResourceOrigin {
        self.origin
    }

    /// Change the origin
    pub fn set_origin(&mut self, origin: ResourceOrigin) {
        self.origin = origin;
    }

    /// Attach (or replace) the resource definition
    pub fn define(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            ResourceState::Declared | ResourceState::Defined | ResourceState::Released => {
                self.state = ResourceState::Defined;
                Ok(())
            }
            from => Err(LifecycleError {
                from,
                transition: Transition::Define,
            }),
        }
    }

    /// Free GPU handles, keeping the manifest and CPU object
    pub fn release(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            ResourceState::Defined | ResourceState::Released => {
                self.state = ResourceState::Released;
                Ok(())
            }
            from => Err(LifecycleError {
                from,
                transition: Transition::Release,
            }),
        }
    }

    /// A variant was prepared again after a release
    pub fn restore(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            ResourceState::Defined | ResourceState::Released => {
                self.state = ResourceState::Defined;
                Ok(())
            }
            from => Err(LifecycleError {
                from,
                transition: Transition::Restore,
            }),
        }
    }

    /// Destroy the slot. Valid from any state.
    pub fn clear(&mut self) {
        self.state = ResourceState::Cleared;
    }

    /// Check if an explicit re-init is needed before this slot is usable
    pub fn needs_reinit(&self) -> bool {
        self.state == ResourceState::Cleared && self.origin == ResourceOrigin::System
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let mut lc = Lifecycle::declared(ResourceOrigin::Runtime);
        assert_eq!(lc.state(), ResourceState::Declared);

        lc.define().unwrap();
        assert_eq!(lc.state(), ResourceState::Defined);

        lc.release().unwrap();
        assert_eq!(lc.state(), ResourceState::Released);
        assert!(lc.state().has_resource());

        lc.restore().unwrap();
        assert_eq!(lc.state(), ResourceState::Defined);

        lc.clear();
        assert_eq!(lc.state(), ResourceState::Cleared);
        assert!(!lc.needs_reinit());
    }

    #[test]
    fn test_release_requires_definition() {
        let mut lc = Lifecycle::declared(ResourceOrigin::Runtime);
        let err = lc.release().unwrap_err();
        assert_eq!(err.from, ResourceState::Declared);
        assert_eq!(err.transition, Transition::Release);
        assert_eq!(err.to_string(), "cannot release a resource that is declared");
    }

    #[test]
    fn test_cleared_is_terminal() {
        let mut lc = Lifecycle::declared(ResourceOrigin::System);
        lc.define().unwrap();
        lc.clear();

        assert!(lc.define().is_err());
        assert!(lc.release().is_err());
        assert!(lc.restore().is_err());
        assert!(lc.needs_reinit());
    }
}
