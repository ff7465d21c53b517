//! Resource error taxonomy
//!
//! Every variant here is a programmer or data error (bad URI, bad id). They
//! propagate to a top-level handler that logs and aborts the operation, not
//! the process.

use deng_core::{Id, ThreadError, UriError};
use thiserror::Error;

use crate::lifecycle::LifecycleError;
use crate::uploader::PrepareError;

/// Errors raised by the resource layer
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Unknown scheme: '{0}'")]
    UnknownScheme(String),

    #[error("Missing resource: '{0}'")]
    MissingResource(String),

    #[error("Unknown material group: {0}")]
    UnknownMaterialGroup(u32),

    #[error("Unknown material id: {0}")]
    UnknownMaterialId(Id),

    #[error("Unknown texture id: {0}")]
    UnknownTextureId(Id),

    #[error("Unknown font id: {0}")]
    UnknownFontId(Id),

    #[error("Missing model definition: '{0}'")]
    MissingModelDef(String),

    #[error("Unknown animation group: {0}")]
    UnknownAnimationGroup(u32),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Invalid URI: {0}")]
    Uri(#[from] UriError),

    #[error("Prepare failed: {0}")]
    Prepare(#[from] PrepareError),

    #[error(transparent)]
    Thread(#[from] ThreadError),
}

/// Result type for resource operations
pub type ResourceResult<T> = Result<T, ResourceError>;
