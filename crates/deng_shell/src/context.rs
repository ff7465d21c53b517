//! Execution context handed to command handlers

use deng_resource::ResourceSystem;

use crate::command::CommandError;
use crate::cvar::{CVarValue, CVars, GAMMA_CVARS};
use crate::display::Display;
use crate::gamma::GammaRamp;

/// Name, usage and description of a registered command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: String,
    pub usage: String,
    pub description: String,
}

/// Everything a command may inspect or change. Built per console line; all
/// borrows are exclusive, so handlers run on the main thread only.
pub struct ConsoleContext<'a> {
    pub resources: &'a mut ResourceSystem,
    pub display: &'a mut Display,
    pub cvars: &'a mut CVars,
    /// Registered commands, sorted by name
    pub catalog: &'a [CommandInfo],
}

impl ConsoleContext<'_> {
    /// Set a console variable from text, recomputing the gamma ramp when a
    /// gamma variable changes. Returns the previous value.
    pub fn set_cvar(&mut self, name: &str, text: &str) -> Result<CVarValue, CommandError> {
        let previous = self.cvars.set_from_str(name, text)?;
        if GAMMA_CVARS.iter().any(|gamma| *gamma == name) {
            self.update_gamma_ramp()?;
        }
        Ok(previous)
    }

    /// Recompute and install the gamma ramp from the console variables
    pub fn update_gamma_ramp(&mut self) -> Result<(), CommandError> {
        let ramp = GammaRamp::from_cvars(&*self.cvars)?;
        self.display.set_gamma_ramp(ramp);
        Ok(())
    }
}
