//! Resource system
//!
//! Owns every resource collection together with the variant specification
//! interners, the cache queue, precache groups, animation groups and model
//! definitions. All mutation happens on the thread that created the system.
//!
//! Resources declared in a scheme named `System` are engine built-ins: their
//! definitions are remembered so [`ResourceSystem::reinit_system_resources`]
//! can bring them back after [`ResourceSystem::clear_system_resources`].

use std::sync::Arc;

use deng_core::{scheme_key, Id, MainThread, ResourceUri};

use crate::animation::{AnimGroupFlags, AnimationGroup, AnimationGroups};
use crate::cache::{CacheQueue, CacheReport, MaterialGroup, MaterialGroups};
use crate::collection::ResourceCollection;
use crate::error::{ResourceError, ResourceResult};
use crate::font::{Font, FontDef};
use crate::lifecycle::{ResourceOrigin, ResourceState};
use crate::manifest::Manifest;
use crate::material::{Material, MaterialDef, MaterialVariant};
use crate::model::{ModelDef, ModelDefs};
use crate::scheme::Scheme;
use crate::texture::{Texture, TextureDef};
use crate::uploader::{GlName, NullUploader, PrepareError, TextureUploader};
use crate::variant::{
    MaterialContext, MaterialVariantSpec, TextureVariantSpec, VariantSpecs,
};

/// Texture schemes created at startup, in lookup order
pub const TEXTURE_SCHEMES: &[&str] = &[
    "Sprites",
    "Textures",
    "Flats",
    "Patches",
    "System",
    "Details",
    "Reflections",
    "Masks",
    "ModelSkins",
    "ModelReflectionSkins",
    "Lightmaps",
    "Flaremaps",
];

/// Material schemes created at startup, in lookup order
pub const MATERIAL_SCHEMES: &[&str] = &["Sprites", "Textures", "Flats", "System"];

/// Font schemes created at startup, in lookup order
pub const FONT_SCHEMES: &[&str] = &["System", "Game"];

/// Name of the scheme holding engine built-ins
pub const SYSTEM_SCHEME: &str = "System";

/// Resource system settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Cache the other members of a material's precache groups with it
    pub precache_groups: bool,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            precache_groups: true,
        }
    }
}

/// Definitions of engine built-ins, kept for re-initialisation
#[derive(Debug, Default)]
struct SystemDefs {
    textures: Vec<(ResourceUri, TextureDef)>,
    materials: Vec<(ResourceUri, MaterialDef)>,
    fonts: Vec<(ResourceUri, FontDef)>,
}

/// Same scheme and path, ignoring case
fn same_uri(a: &ResourceUri, b: &ResourceUri) -> bool {
    a.scheme().map(scheme_key) == b.scheme().map(scheme_key) && a.path().key() == b.path().key()
}

/// Check if a material layer draws `texture`. A layer without a scheme
/// matches the path in any scheme.
fn layer_uses(layer: &ResourceUri, texture: &ResourceUri) -> bool {
    layer.path().key() == texture.path().key()
        && (layer.scheme().is_none() || layer.scheme().map(scheme_key) == texture.scheme().map(scheme_key))
}

fn remember<D: Clone>(list: &mut Vec<(ResourceUri, D)>, uri: &ResourceUri, def: &D) {
    match list.iter_mut().find(|(known, _)| same_uri(known, uri)) {
        Some(entry) => entry.1 = def.clone(),
        None => list.push((uri.clone(), def.clone())),
    }
}

fn origin_of(uri: &ResourceUri) -> ResourceOrigin {
    match uri.scheme() {
        Some(name) if scheme_key(name) == scheme_key(SYSTEM_SCHEME) => ResourceOrigin::System,
        _ => ResourceOrigin::Runtime,
    }
}

/// Owner of all materials, textures and fonts
pub struct ResourceSystem {
    main: MainThread,
    config: ResourceConfig,
    textures: ResourceCollection<Texture>,
    materials: ResourceCollection<Material>,
    fonts: ResourceCollection<Font>,
    specs: VariantSpecs,
    cache: CacheQueue,
    material_groups: MaterialGroups,
    animation_groups: AnimationGroups,
    models: ModelDefs,
    system_defs: SystemDefs,
    uploader: Box<dyn TextureUploader>,
}

impl ResourceSystem {
    /// Create the system with the default schemes. The calling thread
    /// becomes the main thread.
    pub fn new(config: ResourceConfig, uploader: Box<dyn TextureUploader>) -> ResourceResult<Self> {
        let mut textures = ResourceCollection::new("texture");
        for name in TEXTURE_SCHEMES {
            textures.create_scheme(name)?;
        }
        let mut materials = ResourceCollection::new("material");
        for name in MATERIAL_SCHEMES {
            materials.create_scheme(name)?;
        }
        let mut fonts = ResourceCollection::new("font");
        for name in FONT_SCHEMES {
            fonts.create_scheme(name)?;
        }

        log::info!(
            "Resource system ready ({} texture, {} material, {} font schemes)",
            TEXTURE_SCHEMES.len(),
            MATERIAL_SCHEMES.len(),
            FONT_SCHEMES.len()
        );

        Ok(Self {
            main: MainThread::current(),
            config,
            textures,
            materials,
            fonts,
            specs: VariantSpecs::new(),
            cache: CacheQueue::new(),
            material_groups: MaterialGroups::new(),
            animation_groups: AnimationGroups::new(),
            models: ModelDefs::new(),
            system_defs: SystemDefs::default(),
            uploader,
        })
    }

    /// Create the system without a GPU
    pub fn headless(config: ResourceConfig) -> ResourceResult<Self> {
        Self::new(config, Box::new(NullUploader::new()))
    }

    pub fn main_thread(&self) -> MainThread {
        self.main
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ResourceConfig) {
        self.config = config;
    }

    // ---- Schemes and collections ----

    pub fn textures(&self) -> &ResourceCollection<Texture> {
        &self.textures
    }

    pub fn materials(&self) -> &ResourceCollection<Material> {
        &self.materials
    }

    pub fn fonts(&self) -> &ResourceCollection<Font> {
        &self.fonts
    }

    pub fn texture_scheme(&self, name: &str) -> ResourceResult<&Scheme<Texture>> {
        self.textures.scheme(name)
    }

    pub fn material_scheme(&self, name: &str) -> ResourceResult<&Scheme<Material>> {
        self.materials.scheme(name)
    }

    pub fn font_scheme(&self, name: &str) -> ResourceResult<&Scheme<Font>> {
        self.fonts.scheme(name)
    }

    // ---- Textures ----

    /// Declare a texture manifest. Returns its id.
    pub fn declare_texture(&mut self, uri: &ResourceUri) -> ResourceResult<Id> {
        self.assert_main("declare_texture")?;
        let manifest = self.textures.declare(uri)?;
        manifest.set_origin(origin_of(uri));
        Ok(manifest.id())
    }

    /// Declare (if needed) and define a texture. A previous definition is
    /// replaced and its GPU names freed.
    pub fn define_texture(&mut self, uri: &ResourceUri, def: TextureDef) -> ResourceResult<Id> {
        self.assert_main("define_texture")?;
        let origin = origin_of(uri);
        if origin == ResourceOrigin::System {
            remember(&mut self.system_defs.textures, uri, &def);
        }

        let manifest = self.textures.declare(uri)?;
        manifest.set_origin(origin);
        let id = manifest.id();
        if let Some(mut old) = manifest.define(Texture::new(def))? {
            if old.release_variants(self.uploader.as_mut()) > 0 {
                self.forget_layer_names(std::slice::from_ref(uri));
            }
        }
        Ok(id)
    }

    pub fn texture_manifest(&self, uri: &ResourceUri) -> ResourceResult<&Manifest<Texture>> {
        self.textures.find(uri)
    }

    /// Defined texture by URI
    pub fn texture(&self, uri: &ResourceUri) -> ResourceResult<&Texture> {
        self.textures
            .find(uri)?
            .resource()
            .ok_or_else(|| ResourceError::MissingResource(uri.to_string()))
    }

    pub fn texture_by_id(&self, id: Id) -> ResourceResult<&Manifest<Texture>> {
        self.textures
            .by_id(id)
            .ok_or(ResourceError::UnknownTextureId(id))
    }

    // ---- Materials ----

    /// Declare a material manifest. Returns its id.
    pub fn declare_material(&mut self, uri: &ResourceUri) -> ResourceResult<Id> {
        self.assert_main("declare_material")?;
        let manifest = self.materials.declare(uri)?;
        manifest.set_origin(origin_of(uri));
        Ok(manifest.id())
    }

    /// Declare (if needed) and define a material
    pub fn define_material(&mut self, uri: &ResourceUri, def: MaterialDef) -> ResourceResult<Id> {
        self.assert_main("define_material")?;
        let origin = origin_of(uri);
        if origin == ResourceOrigin::System {
            remember(&mut self.system_defs.materials, uri, &def);
        }

        let manifest = self.materials.declare(uri)?;
        manifest.set_origin(origin);
        manifest.define(Material::new(def))?;
        Ok(manifest.id())
    }

    pub fn material_manifest(&self, uri: &ResourceUri) -> ResourceResult<&Manifest<Material>> {
        self.materials.find(uri)
    }

    /// Defined material by URI
    pub fn material(&self, uri: &ResourceUri) -> ResourceResult<&Material> {
        self.materials
            .find(uri)?
            .resource()
            .ok_or_else(|| ResourceError::MissingResource(uri.to_string()))
    }

    pub fn material_by_id(&self, id: Id) -> ResourceResult<&Manifest<Material>> {
        self.materials
            .by_id(id)
            .ok_or(ResourceError::UnknownMaterialId(id))
    }

    // ---- Fonts ----

    pub fn declare_font(&mut self, uri: &ResourceUri) -> ResourceResult<Id> {
        self.assert_main("declare_font")?;
        let manifest = self.fonts.declare(uri)?;
        manifest.set_origin(origin_of(uri));
        Ok(manifest.id())
    }

    pub fn define_font(&mut self, uri: &ResourceUri, def: FontDef) -> ResourceResult<Id> {
        self.assert_main("define_font")?;
        let origin = origin_of(uri);
        if origin == ResourceOrigin::System {
            remember(&mut self.system_defs.fonts, uri, &def);
        }

        let manifest = self.fonts.declare(uri)?;
        manifest.set_origin(origin);
        manifest.define(Font::new(def))?;
        Ok(manifest.id())
    }

    pub fn font(&self, uri: &ResourceUri) -> ResourceResult<&Font> {
        self.fonts
            .find(uri)?
            .resource()
            .ok_or_else(|| ResourceError::MissingResource(uri.to_string()))
    }

    pub fn font_by_id(&self, id: Id) -> ResourceResult<&Manifest<Font>> {
        self.fonts.by_id(id).ok_or(ResourceError::UnknownFontId(id))
    }

    // ---- Model definitions ----

    pub fn model_defs(&self) -> &ModelDefs {
        &self.models
    }

    pub fn add_model_def(&mut self, def: ModelDef) -> ResourceResult<usize> {
        self.assert_main("add_model_def")?;
        Ok(self.models.add(def))
    }

    /// Model definition by index
    pub fn model_def(&self, index: usize) -> ResourceResult<&ModelDef> {
        self.models.get(index)
    }

    /// Model definition for a mobj state
    pub fn model_def_for_state(&self, state: &str) -> ResourceResult<&ModelDef> {
        self.models.for_state(state)
    }

    // ---- Groups ----

    /// Create an empty precache group and return its 1-based id
    pub fn new_material_group(&mut self) -> ResourceResult<u32> {
        self.assert_main("new_material_group")?;
        Ok(self.material_groups.create())
    }

    pub fn material_group(&self, id: u32) -> ResourceResult<&MaterialGroup> {
        self.material_groups.get(id)
    }

    /// Add a material to a precache group
    pub fn add_to_material_group(&mut self, group: u32, material: Id) -> ResourceResult<()> {
        self.assert_main("add_to_material_group")?;
        self.material_by_id(material)?;
        self.material_groups.get_mut(group)?.add(material);
        Ok(())
    }

    pub fn material_groups(&self) -> &MaterialGroups {
        &self.material_groups
    }

    /// Create an empty animation group and return its 1-based id
    pub fn new_animation_group(&mut self, flags: AnimGroupFlags) -> ResourceResult<u32> {
        self.assert_main("new_animation_group")?;
        Ok(self.animation_groups.create(flags))
    }

    pub fn animation_group(&self, id: u32) -> ResourceResult<&AnimationGroup> {
        self.animation_groups.get(id)
    }

    /// Append a frame to an animation group. The texture must be declared.
    pub fn add_animation_frame(
        &mut self,
        group: u32,
        texture: &ResourceUri,
        tics: u16,
        random_tics: u16,
    ) -> ResourceResult<()> {
        self.assert_main("add_animation_frame")?;
        let texture = self.textures.find(texture)?.id();
        self.animation_groups
            .get_mut(group)?
            .new_frame(texture, tics, random_tics);
        Ok(())
    }

    pub fn animation_groups(&self) -> &AnimationGroups {
        &self.animation_groups
    }

    pub fn animation_groups_mut(&mut self) -> ResourceResult<&mut AnimationGroups> {
        self.assert_main("animation_groups_mut")?;
        Ok(&mut self.animation_groups)
    }

    // ---- Variant specifications ----

    /// Canonical texture specification equal to `spec`
    pub fn texture_spec(&mut self, spec: TextureVariantSpec) -> Arc<TextureVariantSpec> {
        self.specs.texture_spec(spec)
    }

    /// Canonical material specification
    pub fn material_spec(
        &mut self,
        context: MaterialContext,
        primary: TextureVariantSpec,
    ) -> Arc<MaterialVariantSpec> {
        self.specs.material_spec(context, primary)
    }

    pub fn specs(&self) -> &VariantSpecs {
        &self.specs
    }

    // ---- Cache queue ----

    /// Queue a material variant for preparation. With `cache_groups`, the
    /// other members of the material's precache groups are queued too.
    pub fn cache_material(
        &mut self,
        material: Id,
        spec: &Arc<MaterialVariantSpec>,
        cache_groups: bool,
    ) -> ResourceResult<()> {
        self.assert_main("cache_material")?;
        self.material_by_id(material)?;

        if self.cache.enqueue(material, spec) {
            log::debug!("Queued material {} for caching", material);
        }

        if cache_groups && self.config.precache_groups {
            let siblings: Vec<Id> = self
                .material_groups
                .containing(material)
                .flat_map(|group| group.members().iter().copied())
                .filter(|member| *member != material)
                .collect();
            for sibling in siblings {
                self.cache_material(sibling, spec, false)?;
            }
        }
        Ok(())
    }

    pub fn cache_queue(&self) -> &CacheQueue {
        &self.cache
    }

    /// Prepare every queued task in request order. A failing task is logged
    /// and processing continues with the next one.
    pub fn process_cache_queue(&mut self) -> ResourceResult<CacheReport> {
        self.assert_main("process_cache_queue")?;
        let mut report = CacheReport::default();

        while let Some(task) = self.cache.pop() {
            if self.materials.by_id(task.material).is_none() {
                log::debug!("Skipping cache task for cleared material {}", task.material);
                report.skipped += 1;
                continue;
            }
            match self.prepare_material(task.material, &task.spec) {
                Ok(_) => report.prepared += 1,
                Err(err) => {
                    log::warn!("Failed to cache material {}: {}", task.material, err);
                    report.failed += 1;
                }
            }
        }

        if report.total() > 0 {
            log::info!("Cache queue processed: {}", report);
        }
        Ok(report)
    }

    /// Drop every pending task unprepared. Returns how many were dropped.
    pub fn purge_cache_queue(&mut self) -> ResourceResult<usize> {
        self.assert_main("purge_cache_queue")?;
        let purged = self.cache.purge();
        if purged > 0 {
            log::debug!("Purged {} cache tasks", purged);
        }
        Ok(purged)
    }

    // ---- Preparation and release ----

    /// Prepare the variant of a material for `spec`, uploading the texture
    /// of every layer. Released resources return to defined.
    pub fn prepare_material(
        &mut self,
        material: Id,
        spec: &Arc<MaterialVariantSpec>,
    ) -> ResourceResult<&MaterialVariant> {
        self.assert_main("prepare_material")?;

        let manifest = self
            .materials
            .by_id(material)
            .ok_or(ResourceError::UnknownMaterialId(material))?;
        let material_path = manifest.uri().to_string();
        let layers: Vec<ResourceUri> = manifest
            .resource()
            .ok_or_else(|| ResourceError::MissingResource(material_path.clone()))?
            .def()
            .layers
            .iter()
            .map(|layer| layer.texture.clone())
            .collect();
        if layers.is_empty() {
            return Err(PrepareError::NoLayers(material_path).into());
        }

        let mut names: Vec<GlName> = Vec::with_capacity(layers.len());
        for layer in &layers {
            let texture_manifest = self
                .textures
                .find_mut(layer)
                .map_err(|_| PrepareError::UndefinedLayer(layer.to_string()))?;
            let texture_path = texture_manifest.uri().to_string();
            let (lifecycle, texture) = texture_manifest.parts_mut();
            let texture = texture.ok_or_else(|| PrepareError::UndefinedLayer(texture_path.clone()))?;
            let name = texture.prepare_variant(&texture_path, &spec.primary, self.uploader.as_mut())?;
            if lifecycle.state() == ResourceState::Released {
                lifecycle.restore()?;
            }
            names.push(name);
        }

        let manifest = self
            .materials
            .by_id_mut(material)
            .ok_or(ResourceError::UnknownMaterialId(material))?;
        if manifest.state() == ResourceState::Released {
            manifest.mark_restored()?;
        }
        let resource = manifest
            .resource_mut()
            .ok_or_else(|| ResourceError::MissingResource(material_path.clone()))?;
        resource.set_variant(spec, names);
        resource
            .variant(spec)
            .ok_or(ResourceError::UnknownMaterialId(material))
    }

    /// Free every GPU name. Manifests and CPU objects survive and defined
    /// resources become released.
    pub fn release_all_gl(&mut self) -> ResourceResult<usize> {
        self.assert_main("release_all_gl")?;
        let released = self.release_textures_where(|_| true)?;

        for manifest in self.materials.iter_mut() {
            if let Some(material) = manifest.resource_mut() {
                material.forget_gl_names();
            }
            if manifest.state() == ResourceState::Defined {
                manifest.mark_released()?;
            }
        }

        log::info!("Released {} GL textures", released);
        Ok(released)
    }

    /// Destroy every runtime resource and manifest. They come back when
    /// next declared.
    pub fn clear_runtime_resources(&mut self) -> ResourceResult<usize> {
        self.assert_main("clear_runtime_resources")?;
        let cleared = self.clear_origin(ResourceOrigin::Runtime)?;
        log::info!("Cleared {} runtime resources", cleared);
        Ok(cleared)
    }

    /// Destroy every engine built-in. Use
    /// [`reinit_system_resources`](Self::reinit_system_resources) to restore.
    pub fn clear_system_resources(&mut self) -> ResourceResult<usize> {
        self.assert_main("clear_system_resources")?;
        let cleared = self.clear_origin(ResourceOrigin::System)?;
        log::info!("Cleared {} system resources", cleared);
        Ok(cleared)
    }

    /// Re-define every engine built-in that is not currently defined
    pub fn reinit_system_resources(&mut self) -> ResourceResult<usize> {
        self.assert_main("reinit_system_resources")?;
        let mut count = 0;

        let textures = self.system_defs.textures.clone();
        for (uri, def) in textures {
            if !self.textures.state_of(&uri)?.has_resource() {
                self.define_texture(&uri, def)?;
                count += 1;
            }
        }
        let materials = self.system_defs.materials.clone();
        for (uri, def) in materials {
            if !self.materials.state_of(&uri)?.has_resource() {
                self.define_material(&uri, def)?;
                count += 1;
            }
        }
        let fonts = self.system_defs.fonts.clone();
        for (uri, def) in fonts {
            if !self.fonts.state_of(&uri)?.has_resource() {
                self.define_font(&uri, def)?;
                count += 1;
            }
        }

        log::info!("Re-initialised {} system resources", count);
        Ok(count)
    }

    fn clear_origin(&mut self, origin: ResourceOrigin) -> ResourceResult<usize> {
        let doomed: Vec<ResourceUri> = self
            .textures
            .iter()
            .filter(|m| m.origin() == origin && m.has_resource())
            .map(|m| m.uri().clone())
            .collect();
        self.release_textures_where(|m| m.origin() == origin)?;
        // Materials of the other origin may layer the doomed textures
        self.forget_layer_names(&doomed);

        let textures = self.textures.clear_where(|m| m.origin() == origin);
        let materials = self.materials.clear_where(|m| m.origin() == origin);
        let fonts = self.fonts.clear_where(|m| m.origin() == origin);
        for id in &materials {
            self.material_groups.forget(*id);
        }
        Ok(textures.len() + materials.len() + fonts.len())
    }

    /// Drop the GPU names held by material variants that layer any of
    /// `textures`; the next prepare uploads them again
    fn forget_layer_names(&mut self, textures: &[ResourceUri]) {
        if textures.is_empty() {
            return;
        }
        for manifest in self.materials.iter_mut() {
            let affected = manifest.resource().is_some_and(|material| {
                material
                    .def()
                    .layers
                    .iter()
                    .any(|layer| textures.iter().any(|texture| layer_uses(&layer.texture, texture)))
            });
            if !affected {
                continue;
            }
            log::debug!("Forgetting GL names of {}", manifest.uri());
            if let Some(material) = manifest.resource_mut() {
                material.forget_gl_names();
            }
        }
    }

    fn release_textures_where(
        &mut self,
        mut pred: impl FnMut(&Manifest<Texture>) -> bool,
    ) -> ResourceResult<usize> {
        let mut released = 0;
        for manifest in self.textures.iter_mut() {
            if !pred(&*manifest) {
                continue;
            }
            if let Some(texture) = manifest.resource_mut() {
                released += texture.release_variants(self.uploader.as_mut());
            }
            if manifest.state() == ResourceState::Defined {
                manifest.mark_released()?;
            }
        }
        Ok(released)
    }

    fn assert_main(&self, operation: &'static str) -> ResourceResult<()> {
        self.main.assert_current(operation).map_err(|err| {
            log::error!("{}", err);
            ResourceError::from(err)
        })
    }
}

impl std::fmt::Debug for ResourceSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceSystem")
            .field("textures", &self.textures.len())
            .field("materials", &self.materials.len())
            .field("fonts", &self.fonts.len())
            .field("queued", &self.cache.len())
            .finish()
    }
}
