//! Command executor
//!
//! Looks up handlers by name (or alias) and runs them.

use std::collections::HashMap;
use std::sync::Arc;

use crate::builtins;
use crate::command::{Command, CommandError, CommandHandler, CommandResult};
use crate::context::{CommandInfo, ConsoleContext};
use crate::resource_commands;
use crate::video_commands;

/// Command executor
pub struct Executor {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    aliases: HashMap<String, String>,
    catalog: Vec<CommandInfo>,
}

impl Executor {
    /// Executor with no commands
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
            aliases: HashMap::new(),
            catalog: Vec::new(),
        }
    }

    /// Executor with every console command registered
    pub fn new() -> Self {
        let mut executor = Self::empty();

        executor.register(Arc::new(builtins::HelpCommand));
        executor.register(Arc::new(builtins::EchoCommand));
        executor.register(Arc::new(builtins::SetCommand));
        executor.register(Arc::new(builtins::ListCVarsCommand));

        executor.register(Arc::new(resource_commands::ListMaterialsCommand));
        executor.register(Arc::new(resource_commands::InspectMaterialCommand));
        executor.register(Arc::new(resource_commands::ListTexturesCommand));
        executor.register(Arc::new(resource_commands::ClearCacheCommand));
        executor.register(Arc::new(resource_commands::PrecacheCommand));
        executor.register(Arc::new(resource_commands::ReleaseGlCommand));

        executor.register(Arc::new(video_commands::SetResCommand));
        executor.register(Arc::new(video_commands::SetFullResCommand));
        executor.register(Arc::new(video_commands::SetWinResCommand));
        executor.register(Arc::new(video_commands::ToggleFullscreenCommand));
        executor.register(Arc::new(video_commands::DisplayModeCommand));
        executor.register(Arc::new(video_commands::ListDisplayModesCommand));
        executor.register(Arc::new(video_commands::FogCommand));
        executor.register(Arc::new(video_commands::SetVidRampCommand));

        executor.add_alias("?", "help");
        executor.add_alias("lsmat", "listmaterials");
        executor.add_alias("lstex", "listtextures");

        executor
    }

    /// Register a command handler, replacing one with the same name
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) {
        let name = handler.name().to_lowercase();
        self.catalog.retain(|info| info.name != name);
        self.catalog.push(CommandInfo {
            name: name.clone(),
            usage: handler.usage().to_string(),
            description: handler.description().to_string(),
        });
        self.catalog.sort_by(|a, b| a.name.cmp(&b.name));
        self.handlers.insert(name, handler);
    }

    pub fn add_alias(&mut self, alias: &str, target: &str) {
        self.aliases.insert(alias.to_lowercase(), target.to_lowercase());
    }

    /// Registered commands, sorted by name
    pub fn catalog(&self) -> &[CommandInfo] {
        &self.catalog
    }

    /// Run a command
    pub fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        let handler = self
            .get_handler(&cmd.name)
            .ok_or_else(|| CommandError::UnknownCommand(cmd.name.clone()))?;
        log::debug!("Executing '{}' {:?}", cmd.name, cmd.args);
        handler.execute(cmd, ctx)
    }

    /// Command and alias names starting with `partial`
    pub fn complete(&self, partial: &str) -> Vec<String> {
        let partial = partial.to_lowercase();
        let mut completions: Vec<String> = self
            .handlers
            .keys()
            .chain(self.aliases.keys())
            .filter(|name| name.starts_with(&partial))
            .cloned()
            .collect();
        completions.sort();
        completions.dedup();
        completions
    }

    /// Handler for a command name or alias
    pub fn get_handler(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        let resolved = self.aliases.get(name).map(|s| s.as_str()).unwrap_or(name);
        self.handlers.get(resolved).cloned()
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}
