//! Integration tests for deng_resource

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use deng_resource::*;
use deng_core::{Id, ResourceUri};

/// Records every upload and release, failing for paths it was told to fail
#[derive(Default)]
struct Recorder {
    uploads: Vec<String>,
    releases: Vec<GlName>,
    fail: Vec<String>,
}

struct RecordingUploader {
    log: Rc<RefCell<Recorder>>,
    next: u32,
}

impl TextureUploader for RecordingUploader {
    fn upload(
        &mut self,
        path: &str,
        _def: &TextureDef,
        _spec: &TextureVariantSpec,
    ) -> Result<GlName, PrepareError> {
        let mut log = self.log.borrow_mut();
        if log.fail.iter().any(|p| p == path) {
            return Err(PrepareError::Upload {
                path: path.to_string(),
                reason: "device lost".into(),
            });
        }
        log.uploads.push(path.to_string());
        self.next += 1;
        Ok(GlName(self.next))
    }

    fn release(&mut self, name: GlName) {
        self.log.borrow_mut().releases.push(name);
    }
}

fn uri(text: &str) -> ResourceUri {
    ResourceUri::parse(text).unwrap()
}

fn recording_system() -> (ResourceSystem, Rc<RefCell<Recorder>>) {
    let log = Rc::new(RefCell::new(Recorder::default()));
    let uploader = RecordingUploader {
        log: log.clone(),
        next: 0,
    };
    let sys = ResourceSystem::new(ResourceConfig::default(), Box::new(uploader)).unwrap();
    (sys, log)
}

fn define_wall(sys: &mut ResourceSystem, name: &str) -> Id {
    let tex = uri(&format!("Textures:{}", name));
    sys.define_texture(&tex, TextureDef::new(64, 128)).unwrap();
    sys.define_material(&tex, MaterialDef::new(64, 128).with_layer(tex.clone()))
        .unwrap()
}

fn wall_spec(sys: &mut ResourceSystem) -> Arc<MaterialVariantSpec> {
    sys.material_spec(
        MaterialContext::MapSurface,
        TextureVariantSpec::new(TextureUsageContext::MapSurface).mipmapped(true),
    )
}

#[test]
fn test_cache_queue_prepares_in_request_order() {
    let (mut sys, log) = recording_system();
    let a = define_wall(&mut sys, "STARTAN3");
    let b = define_wall(&mut sys, "BROWN1");
    let c = define_wall(&mut sys, "COMPTALL");
    let spec = wall_spec(&mut sys);

    sys.cache_material(c, &spec, true).unwrap();
    sys.cache_material(a, &spec, true).unwrap();
    sys.cache_material(c, &spec, true).unwrap();
    sys.cache_material(b, &spec, true).unwrap();
    assert_eq!(sys.cache_queue().len(), 3);

    let report = sys.process_cache_queue().unwrap();
    assert_eq!(report.prepared, 3);
    assert!(sys.cache_queue().is_empty());
    assert_eq!(
        log.borrow().uploads,
        vec!["Textures:COMPTALL", "Textures:STARTAN3", "Textures:BROWN1"]
    );
}

#[test]
fn test_failed_task_does_not_stop_the_queue() {
    let (mut sys, log) = recording_system();
    let a = define_wall(&mut sys, "BAD");
    let b = define_wall(&mut sys, "GOOD");
    log.borrow_mut().fail.push("Textures:BAD".into());
    let spec = wall_spec(&mut sys);

    sys.cache_material(a, &spec, false).unwrap();
    sys.cache_material(b, &spec, false).unwrap();
    let report = sys.process_cache_queue().unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.prepared, 1);
    assert_eq!(log.borrow().uploads, vec!["Textures:GOOD"]);
}

#[test]
fn test_purge_prepares_nothing() {
    let (mut sys, log) = recording_system();
    let a = define_wall(&mut sys, "STARTAN3");
    let spec = wall_spec(&mut sys);
    sys.cache_material(a, &spec, true).unwrap();

    assert_eq!(sys.purge_cache_queue().unwrap(), 1);
    assert_eq!(sys.process_cache_queue().unwrap(), CacheReport::default());
    assert!(log.borrow().uploads.is_empty());
}

#[test]
fn test_shared_spec_shares_texture_variant() {
    let (mut sys, log) = recording_system();
    let tex = uri("Flats:NUKAGE1");
    sys.define_texture(&tex, TextureDef::new(64, 64)).unwrap();
    let floor = sys
        .define_material(&uri("Flats:NUKAGE1"), MaterialDef::new(64, 64).with_layer(tex.clone()))
        .unwrap();
    let ceiling = sys
        .define_material(&uri("Textures:NUKAGE1"), MaterialDef::new(64, 64).with_layer(tex.clone()))
        .unwrap();

    let spec = wall_spec(&mut sys);
    sys.prepare_material(floor, &spec).unwrap();
    sys.prepare_material(ceiling, &spec).unwrap();

    // Both materials use the same texture under the same interned spec
    assert_eq!(log.borrow().uploads.len(), 1);
    assert_eq!(sys.texture(&tex).unwrap().variants().len(), 1);
}

#[test]
fn test_release_keeps_manifests_and_reloads_on_demand() {
    let (mut sys, log) = recording_system();
    let wall = define_wall(&mut sys, "STARTAN3");
    let spec = wall_spec(&mut sys);
    sys.prepare_material(wall, &spec).unwrap();

    assert_eq!(sys.release_all_gl().unwrap(), 1);
    assert_eq!(log.borrow().releases, vec![GlName(1)]);
    assert_eq!(sys.material_by_id(wall).unwrap().state(), ResourceState::Released);
    assert!(sys.material(&uri("Textures:STARTAN3")).is_ok());

    let variant = sys.prepare_material(wall, &spec).unwrap();
    assert_eq!(variant.layer_names(), &[GlName(2)]);
    assert_eq!(sys.material_by_id(wall).unwrap().state(), ResourceState::Defined);
}

#[test]
fn test_clear_runtime_frees_gpu_names() {
    let (mut sys, log) = recording_system();
    let wall = define_wall(&mut sys, "STARTAN3");
    let spec = wall_spec(&mut sys);
    sys.prepare_material(wall, &spec).unwrap();

    sys.clear_runtime_resources().unwrap();
    assert_eq!(log.borrow().releases.len(), 1);
    assert!(matches!(
        sys.material_by_id(wall),
        Err(ResourceError::UnknownMaterialId(_))
    ));
    assert_eq!(
        sys.materials().state_of(&uri("Textures:STARTAN3")).unwrap(),
        ResourceState::Cleared
    );

    // Runtime resources come back when declared again, with a fresh id
    let again = define_wall(&mut sys, "STARTAN3");
    assert_ne!(again, wall);
}

#[test]
fn test_redefining_a_texture_releases_old_variants() {
    let (mut sys, log) = recording_system();
    let wall = define_wall(&mut sys, "STARTAN3");
    let spec = wall_spec(&mut sys);
    sys.prepare_material(wall, &spec).unwrap();

    sys.define_texture(&uri("Textures:STARTAN3"), TextureDef::new(128, 128))
        .unwrap();
    assert_eq!(log.borrow().releases, vec![GlName(1)]);
    assert!(sys
        .texture(&uri("Textures:STARTAN3"))
        .unwrap()
        .variants()
        .is_empty());

    // The material must not keep the freed name
    let variant = sys.material_by_id(wall).unwrap().resource().unwrap().variant(&spec).unwrap();
    assert_eq!(variant.layer_names(), &[GlName::NONE]);
    assert!(!variant.is_prepared());

    // Preparing again uploads the new definition
    let names = sys.prepare_material(wall, &spec).unwrap().layer_names().to_vec();
    assert_eq!(names, vec![GlName(2)]);
}

#[test]
fn test_clearing_system_textures_reaches_runtime_materials() {
    let (mut sys, log) = recording_system();
    let gray = uri("System:gray");
    sys.define_texture(&gray, TextureDef::new(8, 8)).unwrap();
    let floor = sys
        .define_material(&uri("Flats:FLOOR0_1"), MaterialDef::new(64, 64).with_layer(gray))
        .unwrap();
    let spec = wall_spec(&mut sys);
    sys.prepare_material(floor, &spec).unwrap();

    sys.clear_system_resources().unwrap();
    assert_eq!(log.borrow().releases, vec![GlName(1)]);
    let floor_material = sys.material_by_id(floor).unwrap().resource().unwrap();
    assert_eq!(floor_material.variant(&spec).unwrap().layer_names(), &[GlName::NONE]);
}

#[test]
fn test_system_definitions_are_remembered_once() {
    let mut sys = ResourceSystem::headless(ResourceConfig::default()).unwrap();
    sys.define_texture(&uri("System:bbox"), TextureDef::new(16, 16)).unwrap();
    sys.define_texture(&uri("system:BBOX"), TextureDef::new(32, 32)).unwrap();
    assert_eq!(sys.textures().len(), 1);

    sys.clear_system_resources().unwrap();
    assert_eq!(sys.reinit_system_resources().unwrap(), 1);
    let bbox = sys.texture(&uri("System:bbox")).unwrap();
    assert_eq!((bbox.def().width, bbox.def().height), (32, 32));
}

#[test]
fn test_schemeless_material_lookup() {
    let mut sys = ResourceSystem::headless(ResourceConfig::default()).unwrap();
    define_wall(&mut sys, "STARTAN3");
    assert!(sys.material(&uri("startan3")).is_ok());
    assert!(matches!(
        sys.material(&uri("Walls:STARTAN3")),
        Err(ResourceError::UnknownScheme(_))
    ));
}

#[test]
fn test_mutation_off_main_thread_is_refused() {
    let sys = ResourceSystem::headless(ResourceConfig::default()).unwrap();
    let main = sys.main_thread();
    let result = std::thread::spawn(move || main.check("declare_texture")).join().unwrap();
    assert!(result.is_err());
}
