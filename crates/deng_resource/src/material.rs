//! Materials
//!
//! A material is a surface description built from one or more texture
//! layers. Variants pair an interned [`MaterialVariantSpec`] with the GPU
//! names of the prepared layer textures.

use std::sync::Arc;

use deng_core::ResourceUri;

use crate::uploader::GlName;
use crate::variant::MaterialVariantSpec;

/// Material flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaterialFlags(u32);

impl MaterialFlags {
    pub const NONE: Self = Self(0);
    /// Never drawn
    pub const NO_DRAW: Self = Self(1 << 0);
    /// Surfaces using it show the sky
    pub const SKY_MASK: Self = Self(1 << 1);
    /// Glows in the dark
    pub const GLOW: Self = Self(1 << 2);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl core::ops::BitOr for MaterialFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One texture layer of a material
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialLayer {
    /// Texture the layer draws
    pub texture: ResourceUri,
    /// Tics the layer stays current in a layer animation; 0 is static
    pub tics: u16,
}

impl MaterialLayer {
    pub fn new(texture: ResourceUri) -> Self {
        Self { texture, tics: 0 }
    }
}

/// CPU-side description of a material
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct MaterialDef {
    pub width: u32,
    pub height: u32,
    pub flags: MaterialFlags,
    pub layers: Vec<MaterialLayer>,
}

impl MaterialDef {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Append a texture layer
    pub fn with_layer(mut self, texture: ResourceUri) -> Self {
        self.layers.push(MaterialLayer::new(texture));
        self
    }

    pub fn with_flags(mut self, flags: MaterialFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// One prepared form of a material
#[derive(Clone, Debug)]
pub struct MaterialVariant {
    spec: Arc<MaterialVariantSpec>,
    /// GPU names per layer, in layer order
    layers: Vec<GlName>,
}

impl MaterialVariant {
    pub fn spec(&self) -> &Arc<MaterialVariantSpec> {
        &self.spec
    }

    pub fn layer_names(&self) -> &[GlName] {
        &self.layers
    }

    /// Check if every layer holds a GPU name
    pub fn is_prepared(&self) -> bool {
        !self.layers.is_empty() && self.layers.iter().all(|name| !name.is_none())
    }
}

/// A material resource
#[derive(Debug)]
pub struct Material {
    def: MaterialDef,
    variants: Vec<MaterialVariant>,
}

impl Material {
    pub fn new(def: MaterialDef) -> Self {
        Self {
            def,
            variants: Vec::new(),
        }
    }

    pub fn def(&self) -> &MaterialDef {
        &self.def
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.def.width, self.def.height)
    }

    pub fn flags(&self) -> MaterialFlags {
        self.def.flags
    }

    pub fn layer_count(&self) -> usize {
        self.def.layers.len()
    }

    pub fn variants(&self) -> &[MaterialVariant] {
        &self.variants
    }

    /// Variant for an interned specification, if one exists
    pub fn variant(&self, spec: &Arc<MaterialVariantSpec>) -> Option<&MaterialVariant> {
        self.variants.iter().find(|v| Arc::ptr_eq(&v.spec, spec))
    }

    /// Record the prepared layer names for `spec`, creating the variant on
    /// first use
    pub(crate) fn set_variant(&mut self, spec: &Arc<MaterialVariantSpec>, layers: Vec<GlName>) {
        match self.variants.iter_mut().find(|v| Arc::ptr_eq(&v.spec, spec)) {
            Some(variant) => variant.layers = layers,
            None => self.variants.push(MaterialVariant {
                spec: spec.clone(),
                layers,
            }),
        }
    }

    /// Forget the GPU names of every variant. The textures own the names.
    pub(crate) fn forget_gl_names(&mut self) {
        for variant in &mut self.variants {
            variant.layers.iter_mut().for_each(|name| *name = GlName::NONE);
        }
    }
}
