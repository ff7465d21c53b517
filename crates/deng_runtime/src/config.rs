//! Runtime configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variable: `DOOMSDAY_CONFIG=/path/to/doomsday.toml`
//! 2. `./doomsday.toml`
//! 3. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! log_level = "debug"
//!
//! [display]
//! width = 1024
//! height = 768
//! fullscreen = false
//! modes = [
//!     { width = 1920, height = 1080, refresh_rate = 60.0 },
//!     { width = 1280, height = 720 },
//! ]
//!
//! [cvars]
//! vid-gamma = 1.2
//! rend-model-lights = 6
//!
//! [remote]
//! listing_url = "https://www.gamers.org/pub/idgames/ls-laR.gz"
//! auto_connect = false
//!
//! [resources]
//! precache_groups = true
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use deng_remote::{LinkConfig, DEFAULT_LISTING_URL};
use deng_resource::ResourceConfig;
use deng_shell::{CVarValue, DisplayMode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "DOOMSDAY_CONFIG";

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "doomsday.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Window and display modes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    /// Modes the monitor supports; the first is the desktop mode
    pub modes: Vec<DisplayMode>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fullscreen: false,
            modes: vec![
                DisplayMode::new(1920, 1080),
                DisplayMode::new(1280, 720),
                DisplayMode::new(1024, 768),
                DisplayMode::new(800, 600),
                DisplayMode::new(640, 480),
            ],
        }
    }
}

/// idgames link settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub listing_url: String,
    /// Start loading the listing at startup
    pub auto_connect: bool,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            auto_connect: false,
            timeout_secs: 60,
        }
    }
}

impl RemoteConfig {
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            listing_url: self.listing_url.clone(),
            reference_year: None,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Queue a material's precache group siblings along with it
    pub precache_groups: bool,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            precache_groups: ResourceConfig::default().precache_groups,
        }
    }
}

impl ResourcesConfig {
    pub fn resource_config(&self) -> ResourceConfig {
        ResourceConfig {
            precache_groups: self.precache_groups,
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `env_logger` filter used when `RUST_LOG` is unset
    pub log_level: Option<String>,
    pub display: DisplayConfig,
    /// Initial console variable values
    pub cvars: BTreeMap<String, CVarValue>,
    pub remote: RemoteConfig,
    pub resources: ResourcesConfig,
    /// File the configuration came from
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Config {
    /// Load from the first config file found, or defaults. A file that
    /// exists but cannot be read or parsed is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_from(from_env.as_deref(), Path::new(CONFIG_FILE))
    }

    /// Search `explicit` (if given) and then `fallback`
    pub fn load_from(explicit: Option<&Path>, fallback: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            // An explicitly named file must exist
            return Self::load_from_file(path);
        }
        if fallback.is_file() {
            return Self::load_from_file(fallback);
        }
        Ok(Self::default())
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Log filter: the configured level, else `info`
    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Print configuration summary
    pub fn log_summary(&self) {
        match &self.config_path {
            Some(path) => log::info!("Configuration from {}", path.display()),
            None => log::info!("Default configuration"),
        }
        log::info!(
            "  Display: {}x{}{}",
            self.display.width,
            self.display.height,
            if self.display.fullscreen { " fullscreen" } else { "" }
        );
        log::info!("  Console variables: {}", self.cvars.len());
        log::info!(
            "  idgames: {} (auto-connect: {})",
            self.remote.listing_url,
            self.remote.auto_connect
        );
        log::info!("  Precache groups: {}", self.resources.precache_groups);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(None, &dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.log_filter(), "info");
        assert!(config.resources.precache_groups);
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[display]
width = 1024
height = 768
modes = [{{ width = 1280, height = 720, refresh_rate = 75.0 }}]

[cvars]
vid-gamma = 1.5
rend-model-lights = 6
vid-vsync = false

[remote]
auto_connect = true

[resources]
precache_groups = false
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path()), Path::new("unused.toml")).unwrap();
        assert_eq!(config.log_filter(), "debug");
        assert_eq!(config.display.width, 1024);
        assert!(!config.display.fullscreen);
        assert_eq!(config.display.modes.len(), 1);
        assert_eq!(config.display.modes[0].refresh_rate, 75.0);
        assert_eq!(config.display.modes[0].depth, 32);
        assert_eq!(config.cvars["vid-gamma"], CVarValue::Float(1.5));
        assert_eq!(config.cvars["rend-model-lights"], CVarValue::Int(6));
        assert_eq!(config.cvars["vid-vsync"], CVarValue::Bool(false));
        assert!(config.remote.auto_connect);
        assert_eq!(config.remote.listing_url, DEFAULT_LISTING_URL);
        assert!(!config.resources.precache_groups);
        assert_eq!(config.config_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_fallback_file_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[display]\nfullscreen = true\n").unwrap();

        let config = Config::load_from(None, &path).unwrap();
        assert!(config.display.fullscreen);
        assert_eq!(config.display.width, 640);
    }

    #[test]
    fn test_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load_from(Some(&missing), Path::new("unused.toml")),
            Err(ConfigError::Io { .. })
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[display\nwidth = ").unwrap();
        assert!(matches!(Config::load_from_file(&bad), Err(ConfigError::Toml { .. })));

        // Wrong type for a known key
        std::fs::write(&bad, "[display]\nwidth = \"wide\"\n").unwrap();
        assert!(matches!(Config::load_from_file(&bad), Err(ConfigError::Toml { .. })));
    }
}
