//! Doomsday runtime
//!
//! Loads the configuration, seeds the engine's built-in resources and runs
//! the console against them. The `doomsday` binary drives [`App`] from a
//! line-oriented main loop.

pub mod app;
pub mod config;

pub use app::{seed_system_resources, App, AppError};
pub use config::{Config, ConfigError, DisplayConfig, RemoteConfig, ResourcesConfig};
