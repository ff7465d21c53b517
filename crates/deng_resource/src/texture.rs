//! Textures and their prepared variants

use std::sync::Arc;

use crate::uploader::{GlName, PrepareError, TextureUploader};
use crate::variant::TextureVariantSpec;

/// Texture flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureFlags(u32);

impl TextureFlags {
    pub const NONE: Self = Self(0);
    /// Has transparent texels
    pub const MASKED: Self = Self(1 << 0);
    /// Replaced by an add-on rather than the original game data
    pub const CUSTOM: Self = Self(1 << 1);
    /// Do not draw (e.g. sky placeholder)
    pub const NO_DRAW: Self = Self(1 << 2);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl core::ops::BitOr for TextureFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// CPU-side description of a texture
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TextureDef {
    pub width: u32,
    pub height: u32,
    /// Offset of the image origin (sprites and patches)
    pub origin: (i16, i16),
    pub flags: TextureFlags,
}

impl TextureDef {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_origin(mut self, x: i16, y: i16) -> Self {
        self.origin = (x, y);
        self
    }

    pub fn with_flags(mut self, flags: TextureFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// One prepared form of a texture
#[derive(Clone, Debug)]
pub struct TextureVariant {
    spec: Arc<TextureVariantSpec>,
    gl_name: GlName,
}

impl TextureVariant {
    /// Specification this variant was prepared for
    pub fn spec(&self) -> &Arc<TextureVariantSpec> {
        &self.spec
    }

    /// GPU name, [`GlName::NONE`] while released
    pub fn gl_name(&self) -> GlName {
        self.gl_name
    }

    pub fn is_uploaded(&self) -> bool {
        !self.gl_name.is_none()
    }
}

/// A texture resource
#[derive(Debug)]
pub struct Texture {
    def: TextureDef,
    variants: Vec<TextureVariant>,
}

impl Texture {
    pub fn new(def: TextureDef) -> Self {
        Self {
            def,
            variants: Vec::new(),
        }
    }

    pub fn def(&self) -> &TextureDef {
        &self.def
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.def.width, self.def.height)
    }

    pub fn is_masked(&self) -> bool {
        self.def.flags.contains(TextureFlags::MASKED)
    }

    pub fn variants(&self) -> &[TextureVariant] {
        &self.variants
    }

    /// Variant for an interned specification, if one was prepared
    pub fn variant(&self, spec: &Arc<TextureVariantSpec>) -> Option<&TextureVariant> {
        self.variants.iter().find(|v| Arc::ptr_eq(&v.spec, spec))
    }

    /// Prepare (or re-upload after a release) the variant for `spec`
    pub fn prepare_variant(
        &mut self,
        path: &str,
        spec: &Arc<TextureVariantSpec>,
        uploader: &mut dyn TextureUploader,
    ) -> Result<GlName, PrepareError> {
        let index = match self.variants.iter().position(|v| Arc::ptr_eq(&v.spec, spec)) {
            Some(index) if self.variants[index].is_uploaded() => {
                return Ok(self.variants[index].gl_name);
            }
            Some(index) => index,
            None => {
                self.variants.push(TextureVariant {
                    spec: spec.clone(),
                    gl_name: GlName::NONE,
                });
                self.variants.len() - 1
            }
        };

        let name = uploader.upload(path, &self.def, spec)?;
        log::debug!("Uploaded {} as {} ({})", path, name.0, spec.context);
        self.variants[index].gl_name = name;
        Ok(name)
    }

    /// Free the GPU names of every variant. Returns how many were freed.
    pub fn release_variants(&mut self, uploader: &mut dyn TextureUploader) -> usize {
        let mut released = 0;
        for variant in &mut self.variants {
            if variant.is_uploaded() {
                uploader.release(variant.gl_name);
                variant.gl_name = GlName::NONE;
                released += 1;
            }
        }
        released
    }
}
