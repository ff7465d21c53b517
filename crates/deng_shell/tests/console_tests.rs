//! Console command surface, driven through `Console::execute`

use deng_core::ResourceUri;
use deng_resource::{
    MaterialContext, MaterialDef, ResourceConfig, ResourceSystem, TextureDef, TextureUsageContext,
    TextureVariantSpec,
};
use deng_shell::*;

fn uri(text: &str) -> ResourceUri {
    ResourceUri::parse(text).unwrap()
}

fn console() -> Console {
    let modes = vec![
        DisplayMode::new(1920, 1080),
        DisplayMode::new(640, 480),
        DisplayMode::new(1280, 720),
    ];
    Console::new(ConsoleConfig::default(), CVars::with_defaults(), Display::new(modes, 800, 600, false))
}

/// Two wall materials over their own textures, plus one declared only
fn populated() -> ResourceSystem {
    let mut sys = ResourceSystem::headless(ResourceConfig::default()).unwrap();
    for name in ["STARTAN3", "STARG1"] {
        let tex = uri(&format!("Textures:{}", name));
        sys.define_texture(&tex, TextureDef::new(64, 128)).unwrap();
        sys.define_material(&tex, MaterialDef::new(64, 128).with_layer(tex.clone()))
            .unwrap();
    }
    sys.declare_material(&uri("Flats:FLOOR4_8")).unwrap();
    sys
}

#[test]
fn test_listmaterials_filters_by_scheme_and_path() {
    let mut console = console();
    let mut sys = populated();

    let all = console.execute("listmaterials", &mut sys);
    assert!(all.is_success());
    assert_eq!(all.data().unwrap().as_array().unwrap().len(), 3);

    let textures = console.execute("listmaterials textures", &mut sys);
    assert_eq!(textures.data().unwrap().as_array().unwrap().len(), 2);
    assert!(textures.message().unwrap().contains("Textures"));

    let filtered = console.execute("lsmat textures startan", &mut sys);
    let uris = filtered.data().unwrap().as_array().unwrap().clone();
    assert_eq!(uris.len(), 1);
    assert!(uris[0].as_str().unwrap().contains("STARTAN3"));

    // A lone argument that is not a scheme filters by path
    let by_path = console.execute("listmaterials floor", &mut sys);
    assert_eq!(by_path.data().unwrap().as_array().unwrap().len(), 1);
}

#[test]
fn test_listmaterials_unknown_scheme_fails() {
    let mut console = console();
    let mut sys = populated();
    let result = console.execute("listmaterials Nowhere x", &mut sys);
    assert!(!result.is_success());
}

#[test]
fn test_inspectmaterial() {
    let mut console = console();
    let mut sys = populated();

    let result = console.execute("inspectmaterial Textures:STARTAN3", &mut sys);
    assert!(result.is_success());
    let text = result.text();
    assert!(text.contains("64x128"));
    assert!(text.contains("layer #0"));
    assert!(text.contains("Variants: 0"));

    let declared = console.execute("inspectmaterial Flats:FLOOR4_8", &mut sys);
    assert!(declared.is_success());
    assert!(declared.text().contains("Not defined"));

    let missing = console.execute("inspectmaterial Textures:NOPE", &mut sys);
    assert!(!missing.is_success());
}

#[test]
fn test_precache_and_clearcache() {
    let mut console = console();
    let mut sys = populated();

    let spec = sys.material_spec(
        MaterialContext::MapSurface,
        TextureVariantSpec::new(TextureUsageContext::MapSurface),
    );
    let wall = sys.material_manifest(&uri("Textures:STARTAN3")).unwrap().id();
    sys.cache_material(wall, &spec, true).unwrap();

    let result = console.execute("precache", &mut sys);
    assert!(result.is_success());
    assert_eq!(result.data().unwrap()["prepared"], 1);
    assert!(sys.cache_queue().is_empty());
    assert!(sys.material(&uri("Textures:STARTAN3")).unwrap().variants()[0].is_prepared());

    sys.cache_material(wall, &spec, true).unwrap();
    let result = console.execute("clearcache", &mut sys);
    assert_eq!(result.message(), Some("Purged 1 cache tasks"));
    assert!(sys.cache_queue().is_empty());

    let result = console.execute("releasegl", &mut sys);
    assert_eq!(result.message(), Some("Released 1 GL textures"));
}

#[test]
fn test_resolution_commands() {
    let mut console = console();
    let mut sys = populated();

    assert!(console.execute("setwinres 1024 768", &mut sys).is_success());
    assert_eq!(console.display().window().size(), (1024, 768));
    assert!(!console.display().window().fullscreen);

    assert!(console.execute("setfullres 1270 700", &mut sys).is_success());
    assert!(console.display().window().fullscreen);
    assert_eq!(console.display().current_mode(), DisplayMode::new(1280, 720));

    // setres follows the current mode
    assert!(console.execute("setres 640 480", &mut sys).is_success());
    assert_eq!(console.display().window().fullscreen_size, (640, 480));

    assert!(console.execute("togglefullscreen", &mut sys).is_success());
    assert!(!console.display().window().fullscreen);
    assert_eq!(console.display().current_mode(), console.display().original_mode());

    let too_small = console.execute("setwinres 100 100", &mut sys);
    assert!(!too_small.is_success());
    let bad = console.execute("setres wide 480", &mut sys);
    assert!(!bad.is_success());
}

#[test]
fn test_display_mode_listing() {
    let mut console = console();
    let mut sys = populated();

    let modes = console.execute("listdisplaymodes", &mut sys);
    assert_eq!(modes.output_lines().len(), 3);

    let current = console.execute("displaymode", &mut sys);
    assert!(current.message().unwrap().contains("1920x1080"));
    assert_eq!(current.data().unwrap()["current"]["width"], 1920);
}

#[test]
fn test_fog_command() {
    let mut console = console();
    let mut sys = populated();

    assert!(console.execute("fog on", &mut sys).is_success());
    assert!(console.display().fog().enabled);

    assert!(console.execute("fog mode exp2", &mut sys).is_success());
    assert_eq!(console.display().fog().mode, FogMode::Exp2);

    assert!(console.execute("fog color 255 0 128", &mut sys).is_success());
    assert_eq!(console.display().fog().color_bytes(), [255, 0, 128]);

    assert!(console.execute("fog start 10; fog end 500; fog density 0.5", &mut sys).is_success());
    assert_eq!(console.display().fog().start, 10.0);
    assert_eq!(console.display().fog().end, 500.0);
    assert_eq!(console.display().fog().density, 0.5);

    let state = console.execute("fog", &mut sys);
    assert!(state.message().unwrap().starts_with("fog on mode:exp2"));

    assert!(!console.execute("fog mode cubic", &mut sys).is_success());
    assert!(!console.execute("fog color 300 0 0", &mut sys).is_success());
    assert!(!console.execute("fog sideways", &mut sys).is_success());

    assert!(console.execute("fog off", &mut sys).is_success());
    assert!(!console.display().fog().enabled);
}

#[test]
fn test_gamma_cvars_update_ramp() {
    let mut console = console();
    let mut sys = populated();
    assert_eq!(*console.display().gamma_ramp(), GammaRamp::linear());

    assert!(console.execute("set vid-gamma 2", &mut sys).is_success());
    assert_eq!(console.cvars().float("vid-gamma").unwrap(), 2.0);
    assert_eq!(*console.display().gamma_ramp(), GammaRamp::compute(2.0, 1.0, 0.0));

    // Out of range: rejected, ramp unchanged
    assert!(!console.execute("set vid-gamma 9", &mut sys).is_success());
    assert_eq!(console.cvars().float("vid-gamma").unwrap(), 2.0);

    assert!(console.execute("setvidramp", &mut sys).is_success());
    assert_eq!(*console.display().gamma_ramp(), GammaRamp::compute(2.0, 1.0, 0.0));
}

#[test]
fn test_help_lists_every_command() {
    let mut console = console();
    let mut sys = populated();

    let help = console.execute("help", &mut sys);
    let text = help.text();
    for name in [
        "listmaterials",
        "inspectmaterial",
        "setres",
        "setfullres",
        "setwinres",
        "togglefullscreen",
        "displaymode",
        "listdisplaymodes",
        "fog",
        "setvidramp",
    ] {
        assert!(text.contains(name), "help is missing {}", name);
    }

    let topic = console.execute("help fog", &mut sys);
    assert!(topic.message().unwrap().contains("usage: fog"));
    assert!(!console.execute("help nothing", &mut sys).is_success());
}

#[test]
fn test_error_stops_remaining_commands() {
    let mut console = console();
    let mut sys = populated();

    assert!(console.try_execute("fog on; bogus; fog off", &mut sys).is_err());
    assert!(console.display().fog().enabled);
}
