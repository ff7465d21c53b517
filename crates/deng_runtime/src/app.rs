//! The running engine: resources, console and the idgames link
//!
//! Everything here lives on the main thread. The link's background fetch
//! reports back through [`App::poll_link`], called from the main loop.

use deng_core::ResourceUri;
use deng_remote::{IdgamesLink, LinkEvent};
use deng_resource::system::SYSTEM_SCHEME;
use deng_resource::{
    FontDef, FontKind, MaterialDef, MaterialFlags, ResourceError, ResourceSystem, TextureDef,
    TextureFlags,
};
use deng_shell::{CVars, Console, ConsoleConfig, Display, Output, OutputLine, Repl};
use thiserror::Error;

use crate::config::Config;

/// Startup errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] deng_core::Error),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Built-in textures: name, size, flags
const SYSTEM_TEXTURES: &[(&str, u32, u32, TextureFlags)] = &[
    ("unknown", 64, 64, TextureFlags::NONE),
    ("missing", 64, 64, TextureFlags::NONE),
    ("bbox", 16, 16, TextureFlags::MASKED),
    ("gray", 8, 8, TextureFlags::NONE),
    ("boxcorner", 16, 16, TextureFlags::MASKED),
];

fn system_uri(name: &str) -> deng_core::Result<ResourceUri> {
    Ok(ResourceUri::new(SYSTEM_SCHEME, name)?)
}

/// Define the engine's own textures, materials and console font. They are
/// `System` resources and survive `clear_runtime_resources`.
pub fn seed_system_resources(resources: &mut ResourceSystem) -> Result<usize, AppError> {
    let mut count = 0;
    for &(name, width, height, flags) in SYSTEM_TEXTURES {
        let uri = system_uri(name)?;
        resources.define_texture(&uri, TextureDef::new(width, height).with_flags(flags))?;
        let material_flags = if name == "missing" || name == "unknown" {
            MaterialFlags::NONE
        } else {
            MaterialFlags::NO_DRAW
        };
        resources.define_material(
            &uri,
            MaterialDef::new(width, height)
                .with_layer(uri.clone())
                .with_flags(material_flags),
        )?;
        count += 2;
    }

    resources.define_font(&system_uri("fixed")?, FontDef::new(FontKind::Bitmap, 8))?;
    count += 1;
    log::debug!("Defined {} system resources", count);
    Ok(count)
}

/// Resources, console and the idgames link
pub struct App {
    resources: ResourceSystem,
    repl: Repl,
    link: IdgamesLink,
    auto_connect: bool,
}

impl App {
    /// Build everything from the configuration. Must be called on the thread
    /// that will run the main loop.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let mut resources = ResourceSystem::headless(config.resources.resource_config())?;
        seed_system_resources(&mut resources)?;

        let mut cvars = CVars::with_defaults();
        let applied = cvars.apply(&config.cvars);
        if applied > 0 {
            log::info!("Applied {} configured console variables", applied);
        }

        let display = Display::new(
            config.display.modes.clone(),
            config.display.width,
            config.display.height,
            config.display.fullscreen,
        );
        let console = Console::new(ConsoleConfig::default(), cvars, display);

        Ok(Self {
            resources,
            repl: Repl::new(console),
            link: IdgamesLink::new(config.remote.link_config()),
            auto_connect: config.remote.auto_connect,
        })
    }

    /// Start the console; connects the link when configured to
    pub fn start(&mut self) -> Output {
        let mut output = self.repl.start();
        output.add_info("'idgames help' lists the idgames link commands");
        if self.auto_connect {
            self.connect_link(&mut output);
        }
        output
    }

    pub fn is_running(&self) -> bool {
        self.repl.is_running()
    }

    pub fn prompt(&self) -> &str {
        self.repl.prompt()
    }

    pub fn resources(&self) -> &ResourceSystem {
        &self.resources
    }

    pub fn link(&self) -> &IdgamesLink {
        &self.link
    }

    pub fn repl(&self) -> &Repl {
        &self.repl
    }

    /// Run one line of console input
    pub fn handle_line(&mut self, line: &str) -> Output {
        let trimmed = line.trim();
        let mut words = trimmed.split_whitespace();
        if words
            .next()
            .is_some_and(|first| first.eq_ignore_ascii_case("idgames"))
        {
            let args: Vec<&str> = words.collect();
            return self.idgames_command(&args);
        }
        self.repl.process_line(trimmed, &mut self.resources)
    }

    /// Report what the link's background fetch produced since last time
    pub fn poll_link(&mut self) -> Output {
        let mut output = Output::new();
        for event in self.link.poll() {
            match event {
                LinkEvent::StatusChanged(status) => {
                    output.add_info(format!("idgames link is {}", status));
                }
                LinkEvent::PackagesAvailable(count) => {
                    output.add_line(OutputLine::success(format!(
                        "idgames: {} packages available",
                        count
                    )));
                }
                LinkEvent::Failed(message) => {
                    output.add_error(format!("idgames: {}", message));
                }
            }
        }
        output
    }

    /// Stop background work before exit
    pub fn shutdown(&mut self) {
        self.link.disconnect();
        match self.resources.release_all_gl() {
            Ok(released) => log::debug!("Released {} GL textures at shutdown", released),
            Err(err) => log::warn!("Shutdown: {}", err),
        }
    }

    fn connect_link(&mut self, output: &mut Output) {
        match self.link.connect() {
            Ok(()) => output.add_info(format!(
                "Loading idgames listing from {}",
                self.link.config().listing_url
            )),
            Err(err) => output.add_error(format!("idgames: {}", err)),
        }
    }

    fn idgames_command(&mut self, args: &[&str]) -> Output {
        let mut output = Output::new();
        match args {
            [] | ["status"] => {
                output.add_info(format!("idgames link: {}", self.link.status()));
                output.add_info(format!("  url: {}", self.link.config().listing_url));
                output.add_info(format!("  packages: {}", self.link.packages().count()));
                output.add_info(format!("  bytes received: {}", self.link.bytes_received()));
                if let Some(err) = self.link.last_error() {
                    output.add_warning(format!("  last error: {}", err));
                }
            }
            ["connect"] => self.connect_link(&mut output),
            ["disconnect"] => {
                self.link.disconnect();
                output.add_info("idgames link disconnected");
            }
            ["find", pattern] => match self.link.find_packages(pattern) {
                Ok(packages) => {
                    for package in &packages {
                        output.add_info(format!(
                            "  {} ({} bytes)",
                            package.versioned_id(),
                            package.size
                        ));
                    }
                    output.add_info(format!("{} matching packages", packages.len()));
                }
                Err(err) => output.add_error(format!("idgames: {}", err)),
            },
            ["info", id] => match self.link.metadata(id) {
                Some(meta) => {
                    for line in meta.to_info().lines() {
                        output.add_info(line);
                    }
                }
                None => output.add_error(format!("idgames: unknown package '{}'", id)),
            },
            ["help"] => {
                for line in [
                    "idgames [status]       link state",
                    "idgames connect        load the archive listing",
                    "idgames disconnect     forget the listing",
                    "idgames find <regex>   packages whose id matches",
                    "idgames info <id>      info.dei metadata of a package",
                ] {
                    output.add_line(OutputLine::info(line));
                }
            }
            _ => output.add_error(
                "usage: idgames [status|connect|disconnect|find <regex>|info <id>|help]",
            ),
        }
        output
    }
}
