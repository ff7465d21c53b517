//! Command representation
//!
//! Defines the command structure, results and the handler trait.

use std::str::FromStr;

use deng_resource::ResourceError;

use crate::context::ConsoleContext;
use crate::cvar::CVarError;
use crate::display::DisplayError;
use crate::output::OutputLine;

/// Command error
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    CVar(#[from] CVarError),

    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name, lower-cased
    pub name: String,
    /// Positional arguments
    pub args: Vec<String>,
}

impl Command {
    /// Create a new command
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            args: Vec::new(),
        }
    }

    /// Add a positional argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Get first argument
    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(|s| s.as_str())
    }

    /// Get argument at index
    pub fn get_arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(|s| s.as_str())
    }

    /// Get required argument
    pub fn require_arg(&self, index: usize, name: &str) -> Result<&str, CommandError> {
        self.get_arg(index)
            .ok_or_else(|| CommandError::MissingArgument(name.to_string()))
    }

    /// Parse a required argument
    pub fn parse_arg<T: FromStr>(&self, index: usize, name: &str) -> Result<T, CommandError> {
        let raw = self.require_arg(index, name)?;
        raw.parse()
            .map_err(|_| CommandError::InvalidArguments(format!("{}: '{}'", name, raw)))
    }

    /// Check the argument count
    pub fn expect_args(&self, min: usize, max: usize, usage: &str) -> Result<(), CommandError> {
        if self.args.len() < min || self.args.len() > max {
            return Err(CommandError::InvalidArguments(format!("usage: {}", usage)));
        }
        Ok(())
    }
}

/// Result of command execution
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    success: bool,
    /// Main message
    message: Option<String>,
    /// Output lines
    output: Vec<OutputLine>,
    /// Structured data for scripted consumers
    data: Option<serde_json::Value>,
}

impl CommandResult {
    /// Create a successful result
    pub fn success() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// Create empty result (for no-op input)
    pub fn empty() -> Self {
        Self::success()
    }

    /// Create a failure result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Create result with message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Add output line
    pub fn add_line(mut self, line: OutputLine) -> Self {
        self.output.push(line);
        self
    }

    /// Add multiple output lines
    pub fn add_lines(mut self, lines: impl IntoIterator<Item = OutputLine>) -> Self {
        self.output.extend(lines);
        self
    }

    /// Set structured data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn output_lines(&self) -> &[OutputLine] {
        &self.output
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    /// Message and output lines as plain text
    pub fn text(&self) -> String {
        self.message
            .iter()
            .cloned()
            .chain(self.output.iter().map(|line| line.text().to_string()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Console command handler
pub trait CommandHandler: Send + Sync {
    /// Command name
    fn name(&self) -> &str;

    /// One-line description
    fn description(&self) -> &str;

    /// Usage string
    fn usage(&self) -> &str {
        self.name()
    }

    /// Run the command
    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = Command::new("SetRes").arg("640").arg("480");
        assert_eq!(cmd.name, "setres");
        assert_eq!(cmd.first_arg(), Some("640"));
        assert_eq!(cmd.parse_arg::<u32>(1, "height").unwrap(), 480);
    }

    #[test]
    fn test_bad_argument() {
        let cmd = Command::new("setres").arg("wide");
        assert!(matches!(
            cmd.parse_arg::<u32>(0, "width"),
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(matches!(
            cmd.require_arg(1, "height"),
            Err(CommandError::MissingArgument(_))
        ));
        assert!(cmd.expect_args(2, 2, "setres <w> <h>").is_err());
    }

    #[test]
    fn test_command_result() {
        let result = CommandResult::with_message("Done").add_line(OutputLine::info("more"));
        assert!(result.is_success());
        assert_eq!(result.text(), "Done\nmore");

        let result = CommandResult::failure("Something went wrong");
        assert!(!result.is_success());
    }
}
