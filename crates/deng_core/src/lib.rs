//! # deng_core - Doomsday Core Primitives
//!
//! Zero-dependency building blocks shared by every resource-layer crate:
//! - **Ids**: monotonically increasing identifiers that are never reused
//! - **URIs**: `scheme:path` resource addresses with case-insensitive matching
//! - **Main thread discipline**: resource mutation happens on one thread only
//!
//! Nothing in here knows about materials, textures or the console; those
//! live in `deng_resource` and `deng_shell`.

pub mod error;
pub mod id;
pub mod thread;
pub mod uri;

pub use error::*;
pub use id::*;
pub use thread::*;
pub use uri::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::id::{Id, IdGenerator};
    pub use crate::thread::MainThread;
    pub use crate::uri::{Path, ResourceUri, UriError};
}
