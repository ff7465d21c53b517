//! GPU upload seam
//!
//! The resource layer never talks to a graphics API directly. Preparing a
//! texture variant goes through [`TextureUploader`], which hands back an
//! opaque [`GlName`]. Tests and headless tools use [`NullUploader`].

use thiserror::Error;

use crate::texture::TextureDef;
use crate::variant::TextureVariantSpec;

/// Opaque GPU texture name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct GlName(pub u32);

impl GlName {
    /// No texture
    pub const NONE: Self = Self(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for GlName {
    fn from(name: u32) -> Self {
        Self(name)
    }
}

/// Failure preparing a variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrepareError {
    #[error("texture '{0}' has no image data")]
    NoImage(String),

    #[error("texture '{path}' is {width}x{height}, which the device cannot hold")]
    TooLarge { path: String, width: u32, height: u32 },

    #[error("upload of '{path}' failed: {reason}")]
    Upload { path: String, reason: String },

    #[error("material '{0}' has no layers")]
    NoLayers(String),

    #[error("layer texture '{0}' is not defined")]
    UndefinedLayer(String),
}

/// Uploads prepared texture variants to the GPU
pub trait TextureUploader {
    /// Upload the texture at `path` prepared per `spec`
    fn upload(
        &mut self,
        path: &str,
        def: &TextureDef,
        spec: &TextureVariantSpec,
    ) -> Result<GlName, PrepareError>;

    /// Free a name returned by [`upload`](Self::upload)
    fn release(&mut self, name: GlName);
}

/// Uploader that allocates names without a GPU
#[derive(Debug, Default)]
pub struct NullUploader {
    next: u32,
    live: usize,
    max_size: Option<u32>,
}

impl NullUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject textures larger than `max_size` in either dimension
    pub fn with_max_size(max_size: u32) -> Self {
        Self {
            max_size: Some(max_size),
            ..Self::default()
        }
    }

    /// Names uploaded and not yet released
    pub fn live(&self) -> usize {
        self.live
    }

    /// Names handed out in total
    pub fn uploaded(&self) -> u32 {
        self.next
    }
}

impl TextureUploader for NullUploader {
    fn upload(
        &mut self,
        path: &str,
        def: &TextureDef,
        _spec: &TextureVariantSpec,
    ) -> Result<GlName, PrepareError> {
        if def.width == 0 || def.height == 0 {
            return Err(PrepareError::NoImage(path.to_string()));
        }
        if let Some(max) = self.max_size {
            if def.width > max || def.height > max {
                return Err(PrepareError::TooLarge {
                    path: path.to_string(),
                    width: def.width,
                    height: def.height,
                });
            }
        }
        self.next += 1;
        self.live += 1;
        Ok(GlName(self.next))
    }

    fn release(&mut self, name: GlName) {
        if !name.is_none() {
            self.live = self.live.saturating_sub(1);
        }
    }
}
