//! Built-in console commands

use crate::command::{Command, CommandError, CommandHandler, CommandResult};
use crate::context::ConsoleContext;
use crate::output::OutputLine;

/// Help command - shows available commands
pub struct HelpCommand;

impl CommandHandler for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Show available commands and their descriptions"
    }

    fn usage(&self) -> &str {
        "help [command]"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        if let Some(topic) = cmd.first_arg() {
            let topic = topic.to_lowercase();
            return match ctx.catalog.iter().find(|info| info.name == topic) {
                Some(info) => Ok(CommandResult::with_message(format!(
                    "{} - {}\nusage: {}",
                    info.name, info.description, info.usage
                ))),
                None => Err(CommandError::UnknownCommand(topic)),
            };
        }

        let lines = ctx
            .catalog
            .iter()
            .map(|info| OutputLine::info(format!("  {:18} {}", info.name, info.description)));
        Ok(CommandResult::with_message("Available commands:").add_lines(lines))
    }
}

/// Echo command - print arguments
pub struct EchoCommand;

impl CommandHandler for EchoCommand {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Print arguments to output"
    }

    fn usage(&self) -> &str {
        "echo [text...]"
    }

    fn execute(&self, cmd: &Command, _ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        let message = cmd.args.join(" ");
        Ok(CommandResult::with_message(message.clone()).with_data(serde_json::json!(message)))
    }
}

/// Set command - change a console variable
pub struct SetCommand;

impl CommandHandler for SetCommand {
    fn name(&self) -> &str {
        "set"
    }

    fn description(&self) -> &str {
        "Set a console variable"
    }

    fn usage(&self) -> &str {
        "set <cvar> <value>"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        cmd.expect_args(1, 2, self.usage())?;
        let name = cmd.require_arg(0, "cvar")?.to_lowercase();

        let Some(text) = cmd.get_arg(1) else {
            let var = ctx.cvars.get(&name)?;
            return Ok(CommandResult::with_message(format!("{} = {}", var.name(), var.value())));
        };

        let previous = ctx.set_cvar(&name, text)?;
        let value = ctx.cvars.get(&name)?.value();
        Ok(CommandResult::with_message(format!("{} = {} (was {})", name, value, previous))
            .with_data(serde_json::json!({ "name": name, "value": value })))
    }
}

/// List console variables
pub struct ListCVarsCommand;

impl CommandHandler for ListCVarsCommand {
    fn name(&self) -> &str {
        "listcvars"
    }

    fn description(&self) -> &str {
        "List console variables"
    }

    fn usage(&self) -> &str {
        "listcvars [filter]"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        let filter = cmd.first_arg().map(str::to_lowercase);
        let lines: Vec<OutputLine> = ctx
            .cvars
            .iter()
            .filter(|var| filter.as_deref().map_or(true, |f| var.name().contains(f)))
            .map(|var| {
                let range = var
                    .range()
                    .filter(|r| *r.end() < f64::MAX)
                    .map(|r| format!(" [{}..{}]", r.start(), r.end()))
                    .unwrap_or_default();
                OutputLine::info(format!(
                    "  {:30} {:>8}{}  {}",
                    var.name(),
                    var.value().to_string(),
                    range,
                    var.description()
                ))
            })
            .collect();

        let count = lines.len();
        Ok(CommandResult::success()
            .add_lines(lines)
            .add_line(OutputLine::info(format!("{} console variables", count))))
    }
}
