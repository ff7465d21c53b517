//! # deng_shell - Doomsday Console
//!
//! Console layer over the resource system:
//! - Command parsing and execution
//! - Console variables, including the gamma cvars
//! - Display state (modes, window, fog, gamma ramp) for the video commands
//! - Resource inspection and cache commands
//!
//! ## Architecture
//!
//! ```text
//! Input line ──► Parser ──► Command(s) ──► Executor ──► handler
//!                                                         │
//!                            ConsoleContext ◄─────────────┘
//!              (ResourceSystem, Display, CVars, command catalog)
//! ```
//!
//! ## Usage
//!
//! ```text
//! > listmaterials textures star
//! > inspectmaterial Textures:STARTAN3
//! > set vid-gamma 1.5; setvidramp
//! > fog on; fog color 128 0 0
//! ```

pub mod builtins;
pub mod command;
pub mod context;
pub mod cvar;
pub mod display;
pub mod executor;
pub mod fog;
pub mod gamma;
pub mod output;
pub mod parser;
pub mod resource_commands;
pub mod video_commands;

pub use command::{Command, CommandError, CommandHandler, CommandResult};
pub use context::{CommandInfo, ConsoleContext};
pub use cvar::{CVar, CVarError, CVarValue, CVars};
pub use display::{Display, DisplayError, DisplayMode, Window};
pub use executor::Executor;
pub use fog::{Fog, FogMode};
pub use gamma::GammaRamp;
pub use output::{Output, OutputLevel, OutputLine};
pub use parser::{ParseError, Parser, Token};

use deng_resource::ResourceSystem;
use thiserror::Error;

/// Shell errors
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}

/// Console configuration
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Prompt string
    pub prompt: String,
    /// Welcome message
    pub welcome_message: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            welcome_message: Some(format!(
                "Doomsday console v{} - Type 'help' for commands",
                env!("CARGO_PKG_VERSION")
            )),
        }
    }
}

/// The console: parser, executor and the state the commands change.
/// The resource system is borrowed per line so the caller keeps owning it.
pub struct Console {
    config: ConsoleConfig,
    parser: Parser,
    executor: Executor,
    cvars: CVars,
    display: Display,
}

impl Console {
    /// Create a console. The gamma ramp is computed from `cvars` right away.
    pub fn new(config: ConsoleConfig, cvars: CVars, mut display: Display) -> Self {
        match GammaRamp::from_cvars(&cvars) {
            Ok(ramp) => display.set_gamma_ramp(ramp),
            Err(err) => log::warn!("Keeping the linear gamma ramp: {}", err),
        }
        Self {
            config,
            parser: Parser::new(),
            executor: Executor::new(),
            cvars,
            display,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.config.prompt
    }

    pub fn welcome(&self) -> Option<&str> {
        self.config.welcome_message.as_deref()
    }

    /// Run every command on a line, stopping at the first error
    pub fn try_execute(
        &mut self,
        input: &str,
        resources: &mut ResourceSystem,
    ) -> Result<Vec<CommandResult>, ShellError> {
        let input = input.trim();
        if input.is_empty() || input.starts_with('#') {
            return Ok(Vec::new());
        }

        let commands = self.parser.parse(input)?;
        let mut ctx = ConsoleContext {
            resources,
            display: &mut self.display,
            cvars: &mut self.cvars,
            catalog: self.executor.catalog(),
        };

        let mut results = Vec::with_capacity(commands.len());
        for command in &commands {
            results.push(self.executor.execute(command, &mut ctx)?);
        }
        Ok(results)
    }

    /// Run a line and fold the outcome into one result. Errors become a
    /// failing result; they never propagate.
    pub fn execute(&mut self, input: &str, resources: &mut ResourceSystem) -> CommandResult {
        match self.try_execute(input, resources) {
            Ok(results) => merge(results),
            Err(err) => {
                log::warn!("'{}' failed: {}", input.trim(), err);
                CommandResult::failure(err.to_string())
            }
        }
    }

    /// Command names starting with `partial`
    pub fn complete(&self, partial: &str) -> Vec<String> {
        self.executor.complete(partial)
    }

    pub fn executor_mut(&mut self) -> &mut Executor {
        &mut self.executor
    }

    pub fn cvars(&self) -> &CVars {
        &self.cvars
    }

    pub fn display(&self) -> &Display {
        &self.display
    }
}

/// Single result for a line of several commands; the data of the last
/// command that produced some is kept
fn merge(results: Vec<CommandResult>) -> CommandResult {
    if results.len() == 1 {
        if let Some(result) = results.into_iter().next() {
            return result;
        }
        return CommandResult::empty();
    }

    let mut merged = CommandResult::success();
    let mut data = None;
    for result in results {
        if let Some(message) = result.message() {
            merged = merged.add_line(OutputLine::info(message));
        }
        merged = merged.add_lines(result.output_lines().iter().cloned());
        if let Some(value) = result.data() {
            data = Some(value.clone());
        }
    }
    match data {
        Some(value) => merged.with_data(value),
        None => merged,
    }
}

/// Interactive REPL runner
pub struct Repl {
    console: Console,
    running: bool,
}

impl Repl {
    pub fn new(console: Console) -> Self {
        Self {
            console,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start the REPL
    pub fn start(&mut self) -> Output {
        self.running = true;

        let mut output = Output::new();
        if let Some(welcome) = self.console.welcome() {
            output.add_info(welcome);
        }
        output
    }

    /// Process a single line of input
    pub fn process_line(&mut self, input: &str, resources: &mut ResourceSystem) -> Output {
        let mut output = Output::new();

        if input.trim() == "exit" || input.trim() == "quit" {
            self.running = false;
            output.add_info("Goodbye!");
            return output;
        }

        output.add_result(&self.console.execute(input, resources));
        output
    }

    pub fn prompt(&self) -> &str {
        self.console.prompt()
    }

    pub fn complete(&self, partial: &str) -> Vec<String> {
        self.console.complete(partial)
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deng_resource::ResourceConfig;

    fn console() -> Console {
        Console::new(
            ConsoleConfig::default(),
            CVars::with_defaults(),
            Display::new(vec![DisplayMode::new(1920, 1080)], 640, 480, false),
        )
    }

    #[test]
    fn test_execute_empty_and_comment() {
        let mut console = console();
        let mut resources = ResourceSystem::headless(ResourceConfig::default()).unwrap();
        assert!(console.try_execute("", &mut resources).unwrap().is_empty());
        assert!(console.try_execute("# comment", &mut resources).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_command_is_a_failing_result() {
        let mut console = console();
        let mut resources = ResourceSystem::headless(ResourceConfig::default()).unwrap();
        let result = console.execute("frobnicate", &mut resources);
        assert!(!result.is_success());
        assert!(result.message().unwrap().contains("frobnicate"));
    }

    #[test]
    fn test_multiple_commands_merge() {
        let mut console = console();
        let mut resources = ResourceSystem::headless(ResourceConfig::default()).unwrap();
        let result = console.execute("echo one; echo two", &mut resources);
        assert!(result.is_success());
        assert_eq!(result.text(), "one\ntwo");
        assert_eq!(result.data(), Some(&serde_json::json!("two")));
    }

    #[test]
    fn test_repl() {
        let mut repl = Repl::new(console());
        let mut resources = ResourceSystem::headless(ResourceConfig::default()).unwrap();
        assert!(!repl.is_running());

        let output = repl.start();
        assert!(repl.is_running());
        assert!(!output.is_empty());

        let output = repl.process_line("bogus", &mut resources);
        assert!(output.has_errors());

        repl.process_line("exit", &mut resources);
        assert!(!repl.is_running());
    }
}
