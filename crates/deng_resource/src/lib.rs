//! # deng_resource - Doomsday Resource Layer
//!
//! Materials, textures and fonts addressed by `scheme:path` URIs.
//!
//! ## Structure
//!
//! ```text
//! ResourceSystem
//!   ├── ResourceCollection<Texture>   schemes → manifests → Texture → variants
//!   ├── ResourceCollection<Material>  schemes → manifests → Material → variants
//!   ├── ResourceCollection<Font>
//!   ├── VariantSpecs                  interned texture/material specifications
//!   ├── CacheQueue + MaterialGroups   deferred (precache) preparation
//!   ├── AnimationGroups
//!   └── ModelDefs
//! ```
//!
//! GPU work goes through the [`TextureUploader`] trait so the whole layer
//! runs headless.
//!
//! ## Example
//!
//! ```ignore
//! use deng_resource::prelude::*;
//!
//! let mut sys = ResourceSystem::headless(ResourceConfig::default())?;
//! let tex = ResourceUri::parse("Textures:STARTAN3")?;
//! sys.define_texture(&tex, TextureDef::new(64, 128))?;
//! let wall = sys.define_material(&tex, MaterialDef::new(64, 128).with_layer(tex.clone()))?;
//!
//! let spec = sys.material_spec(
//!     MaterialContext::MapSurface,
//!     TextureVariantSpec::new(TextureUsageContext::MapSurface),
//! );
//! sys.cache_material(wall, &spec, true)?;
//! sys.process_cache_queue()?;
//! ```

pub mod animation;
pub mod cache;
pub mod collection;
pub mod error;
pub mod font;
pub mod lifecycle;
pub mod manifest;
pub mod material;
pub mod model;
pub mod scheme;
pub mod system;
pub mod texture;
pub mod uploader;
pub mod variant;

pub use animation::{AnimGroupFlags, AnimationFrame, AnimationGroup, AnimationGroups, Animator};
pub use cache::{CacheQueue, CacheReport, CacheTask, MaterialGroup, MaterialGroups};
pub use collection::ResourceCollection;
pub use error::{ResourceError, ResourceResult};
pub use font::{Font, FontDef, FontKind};
pub use lifecycle::{Lifecycle, LifecycleError, ResourceOrigin, ResourceState, Transition};
pub use manifest::Manifest;
pub use material::{Material, MaterialDef, MaterialFlags, MaterialLayer, MaterialVariant};
pub use model::{ModelDef, ModelDefs, SubModelDef};
pub use scheme::Scheme;
pub use system::{ResourceConfig, ResourceSystem};
pub use texture::{Texture, TextureDef, TextureFlags, TextureVariant};
pub use uploader::{GlName, NullUploader, PrepareError, TextureUploader};
pub use variant::{
    Filter, MaterialContext, MaterialVariantSpec, SpecInterner, TextureSpecFlags,
    TextureUsageContext, TextureVariantSpec, Translation, VariantSpecs, WrapMode,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{ResourceError, ResourceResult};
    pub use crate::lifecycle::{ResourceOrigin, ResourceState};
    pub use crate::material::MaterialDef;
    pub use crate::system::{ResourceConfig, ResourceSystem};
    pub use crate::texture::TextureDef;
    pub use crate::uploader::{GlName, NullUploader, TextureUploader};
    pub use crate::variant::{
        MaterialContext, MaterialVariantSpec, TextureUsageContext, TextureVariantSpec,
    };
    pub use deng_core::{Id, ResourceUri};
}
