//! Variant specifications
//!
//! A specification describes how a base texture or material is prepared for
//! one usage context: wrap modes, filtering, palette translation, border and
//! so on. Specifications are interned: equal parameter sets share one `Arc`,
//! so variants can be matched by pointer and the cache queue can dedupe by
//! identity.
//!
//! The interner does a linear scan. The set of parameter combinations used
//! by the renderer is small and bounded, so there is no index.

use core::fmt;
use std::sync::Arc;

/// What a texture variant is used for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureUsageContext {
    Unknown,
    Ui,
    MapSurface,
    Sprite,
    ModelSkin,
    ModelShinySkin,
    PSprite,
    SkySphere,
    Particle,
    Detail,
    Reflection,
    Mask,
    Flare,
    Lightmap,
}

impl fmt::Display for TextureUsageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Ui => "ui",
            Self::MapSurface => "mapsurface",
            Self::Sprite => "sprite",
            Self::ModelSkin => "modelskin",
            Self::ModelShinySkin => "modelshinyskin",
            Self::PSprite => "psprite",
            Self::SkySphere => "skysphere",
            Self::Particle => "particle",
            Self::Detail => "detail",
            Self::Reflection => "reflection",
            Self::Mask => "mask",
            Self::Flare => "flare",
            Self::Lightmap => "lightmap",
        };
        f.write_str(name)
    }
}

/// What a material variant is used for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialContext {
    Ui,
    MapSurface,
    Sprite,
    ModelSkin,
    PSprite,
    SkySphere,
}

impl MaterialContext {
    /// Texture usage context for the primary layer
    pub fn texture_context(self) -> TextureUsageContext {
        match self {
            Self::Ui => TextureUsageContext::Ui,
            Self::MapSurface => TextureUsageContext::MapSurface,
            Self::Sprite => TextureUsageContext::Sprite,
            Self::ModelSkin => TextureUsageContext::ModelSkin,
            Self::PSprite => TextureUsageContext::PSprite,
            Self::SkySphere => TextureUsageContext::SkySphere,
        }
    }
}

impl fmt::Display for MaterialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.texture_context(), f)
    }
}

/// Texture coordinate wrap mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    ClampToEdge,
}

/// Texture filter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl Filter {
    /// Check if the filter samples mipmaps
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, Self::Nearest | Self::Linear)
    }

    /// Closest non-mipmap filter, as required for magnification
    pub fn without_mipmaps(self) -> Self {
        match self {
            Self::Nearest | Self::NearestMipmapNearest | Self::NearestMipmapLinear => Self::Nearest,
            Self::Linear | Self::LinearMipmapNearest | Self::LinearMipmapLinear => Self::Linear,
        }
    }
}

/// Palette translation applied when preparing a variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Translation {
    /// Translation class (player colour range); never zero
    pub class: u8,
    /// Translation map within the class
    pub map: u8,
}

impl Translation {
    /// Build a translation. Class zero means "no translation".
    pub fn new(class: u8, map: u8) -> Option<Self> {
        (class != 0).then_some(Self { class, map })
    }
}

/// Texture preparation flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureSpecFlags(u32);

impl TextureSpecFlags {
    /// No flags
    pub const NONE: Self = Self(0);

    /// Never use a compressed GPU format
    pub const NO_COMPRESSION: Self = Self(1 << 0);

    /// Upsample the source image before upload
    pub const UPSAMPLE: Self = Self(1 << 1);

    /// Convert to monochrome
    pub const MONOCHROME: Self = Self(1 << 2);

    /// Apply the upscale-and-sharpen filter
    pub const UPSCALE_AND_SHARPEN: Self = Self(1 << 3);

    /// Palette index zero is transparent
    pub const ZERO_MASK: Self = Self(1 << 4);

    /// Create flags from raw bits
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Get raw bits
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check if all specified flags are set
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of two flag sets
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl core::ops::BitOr for TextureSpecFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Anisotropic filtering range; -1 means "use the user setting"
pub const ANISOTROPY_RANGE: core::ops::RangeInclusive<i8> = -1..=4;

/// How a texture is prepared for one usage context
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureVariantSpec {
    pub context: TextureUsageContext,
    pub flags: TextureSpecFlags,
    /// Border size in texels
    pub border: u8,
    pub translation: Option<Translation>,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub anisotropy: i8,
    pub mipmapped: bool,
    pub gamma_correction: bool,
    pub no_stretch: bool,
    pub to_alpha: bool,
}

impl TextureVariantSpec {
    /// Defaults for a usage context
    pub fn new(context: TextureUsageContext) -> Self {
        Self {
            context,
            flags: TextureSpecFlags::NONE,
            border: 0,
            translation: None,
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            anisotropy: -1,
            mipmapped: false,
            gamma_correction: true,
            no_stretch: false,
            to_alpha: false,
        }
    }

    pub fn with_flags(mut self, flags: TextureSpecFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_border(mut self, border: u8) -> Self {
        self.border = border;
        self
    }

    pub fn with_translation(mut self, class: u8, map: u8) -> Self {
        self.translation = Translation::new(class, map);
        self
    }

    pub fn with_wrap(mut self, wrap_s: WrapMode, wrap_t: WrapMode) -> Self {
        self.wrap_s = wrap_s;
        self.wrap_t = wrap_t;
        self
    }

    pub fn with_filters(mut self, min_filter: Filter, mag_filter: Filter) -> Self {
        self.min_filter = min_filter;
        self.mag_filter = mag_filter;
        self
    }

    pub fn with_anisotropy(mut self, anisotropy: i8) -> Self {
        self.anisotropy = anisotropy;
        self
    }

    pub fn mipmapped(mut self, on: bool) -> Self {
        self.mipmapped = on;
        self
    }

    pub fn gamma_correction(mut self, on: bool) -> Self {
        self.gamma_correction = on;
        self
    }

    pub fn no_stretch(mut self, on: bool) -> Self {
        self.no_stretch = on;
        self
    }

    pub fn to_alpha(mut self, on: bool) -> Self {
        self.to_alpha = on;
        self
    }

    /// Clamp parameters into their legal ranges so equivalent requests
    /// intern to the same specification.
    pub fn normalized(mut self) -> Self {
        self.anisotropy = self
            .anisotropy
            .clamp(*ANISOTROPY_RANGE.start(), *ANISOTROPY_RANGE.end());
        self.mag_filter = self.mag_filter.without_mipmaps();
        if !self.mipmapped {
            self.min_filter = self.min_filter.without_mipmaps();
        }
        self
    }
}

impl fmt::Display for TextureVariantSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "context:{} flags:{:#x} border:{} wrap:{:?}/{:?} filter:{:?}/{:?} aniso:{} mipmap:{} gamma:{} nostretch:{} alpha:{}",
            self.context,
            self.flags.bits(),
            self.border,
            self.wrap_s,
            self.wrap_t,
            self.min_filter,
            self.mag_filter,
            self.anisotropy,
            self.mipmapped,
            self.gamma_correction,
            self.no_stretch,
            self.to_alpha,
        )?;
        if let Some(t) = &self.translation {
            write!(f, " translation:{}/{}", t.class, t.map)?;
        }
        Ok(())
    }
}

/// How a material is prepared for one usage context
#[derive(Clone, Debug)]
pub struct MaterialVariantSpec {
    pub context: MaterialContext,
    /// Interned specification for the primary texture layer
    pub primary: Arc<TextureVariantSpec>,
}

impl PartialEq for MaterialVariantSpec {
    fn eq(&self, other: &Self) -> bool {
        // Texture specs are interned, so pointer identity is value identity.
        self.context == other.context && Arc::ptr_eq(&self.primary, &other.primary)
    }
}

impl Eq for MaterialVariantSpec {}

/// Interns specifications of type `S`
///
/// Specifications live as long as the interner; variants hold `Arc`s to them.
#[derive(Debug)]
pub struct SpecInterner<S> {
    specs: Vec<Arc<S>>,
}

impl<S: PartialEq> SpecInterner<S> {
    /// Create an empty interner
    pub fn new() -> Self {
        Self { specs: Vec::new() }
    }

    /// Canonical shared instance equal to `spec`
    pub fn intern(&mut self, spec: S) -> Arc<S> {
        if let Some(existing) = self.specs.iter().find(|s| ***s == spec) {
            return existing.clone();
        }
        let spec = Arc::new(spec);
        self.specs.push(spec.clone());
        spec
    }

    /// Find an existing canonical instance without inserting
    pub fn find(&self, spec: &S) -> Option<Arc<S>> {
        self.specs.iter().find(|s| ***s == *spec).cloned()
    }

    /// Number of distinct specifications
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<S>> {
        self.specs.iter()
    }
}

impl<S: PartialEq> Default for SpecInterner<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Interner pair for texture and material specifications
#[derive(Debug, Default)]
pub struct VariantSpecs {
    textures: SpecInterner<TextureVariantSpec>,
    materials: SpecInterner<MaterialVariantSpec>,
}

impl VariantSpecs {
    /// Create empty interners
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a texture specification (normalised first)
    pub fn texture_spec(&mut self, spec: TextureVariantSpec) -> Arc<TextureVariantSpec> {
        self.textures.intern(spec.normalized())
    }

    /// Intern a material specification; its primary texture spec is
    /// interned first so equal requests share it.
    pub fn material_spec(
        &mut self,
        context: MaterialContext,
        primary: TextureVariantSpec,
    ) -> Arc<MaterialVariantSpec> {
        let primary = self.texture_spec(primary);
        self.materials.intern(MaterialVariantSpec { context, primary })
    }

    /// Texture specification interner
    pub fn textures(&self) -> &SpecInterner<TextureVariantSpec> {
        &self.textures
    }

    /// Material specification interner
    pub fn materials(&self) -> &SpecInterner<MaterialVariantSpec> {
        &self.materials
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_specs_share_instance() {
        let mut specs = VariantSpecs::new();
        let a = specs.texture_spec(TextureVariantSpec::new(TextureUsageContext::Sprite).with_border(1));
        let b = specs.texture_spec(TextureVariantSpec::new(TextureUsageContext::Sprite).with_border(1));
        let c = specs.texture_spec(TextureVariantSpec::new(TextureUsageContext::Sprite).with_border(2));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(specs.textures().len(), 2);
    }

    #[test]
    fn test_normalization_merges_equivalent_requests() {
        let mut specs = VariantSpecs::new();
        let a = specs.texture_spec(
            TextureVariantSpec::new(TextureUsageContext::MapSurface)
                .with_anisotropy(16)
                .with_filters(Filter::Linear, Filter::LinearMipmapLinear),
        );
        let b = specs.texture_spec(
            TextureVariantSpec::new(TextureUsageContext::MapSurface)
                .with_anisotropy(4)
                .with_filters(Filter::Linear, Filter::Linear),
        );
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.anisotropy, 4);
        assert_eq!(a.mag_filter, Filter::Linear);
    }

    #[test]
    fn test_translation_class_zero_is_none() {
        let spec = TextureVariantSpec::new(TextureUsageContext::Sprite).with_translation(0, 3);
        assert_eq!(spec.translation, None);

        let spec = TextureVariantSpec::new(TextureUsageContext::Sprite).with_translation(1, 3);
        assert_eq!(spec.translation, Some(Translation { class: 1, map: 3 }));
    }

    #[test]
    fn test_material_specs_share_texture_spec() {
        let mut specs = VariantSpecs::new();
        let tex = TextureVariantSpec::new(TextureUsageContext::MapSurface).mipmapped(true);

        let a = specs.material_spec(MaterialContext::MapSurface, tex.clone());
        let b = specs.material_spec(MaterialContext::MapSurface, tex.clone());
        let c = specs.material_spec(MaterialContext::SkySphere, tex);

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert!(Arc::ptr_eq(&a.primary, &c.primary));
        assert_eq!(specs.textures().len(), 1);
        assert_eq!(specs.materials().len(), 2);
    }

    #[test]
    fn test_flags() {
        let flags = TextureSpecFlags::ZERO_MASK | TextureSpecFlags::NO_COMPRESSION;
        assert!(flags.contains(TextureSpecFlags::ZERO_MASK));
        assert!(!flags.contains(TextureSpecFlags::MONOCHROME));
    }
}
