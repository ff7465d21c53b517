//! Video commands: resolution, fullscreen, fog and gamma

use crate::command::{Command, CommandError, CommandHandler, CommandResult};
use crate::context::ConsoleContext;
use crate::display::Display;
use crate::fog::FogMode;
use crate::output::OutputLine;

fn size_args(cmd: &Command, usage: &str) -> Result<(u32, u32), CommandError> {
    cmd.expect_args(2, 2, usage)?;
    Ok((cmd.parse_arg(0, "width")?, cmd.parse_arg(1, "height")?))
}

fn window_summary(display: &Display) -> String {
    let window = display.window();
    let (w, h) = window.size();
    format!(
        "{} {}x{}",
        if window.fullscreen { "Fullscreen" } else { "Windowed" },
        w,
        h
    )
}

/// Resize in the current mode
pub struct SetResCommand;

impl CommandHandler for SetResCommand {
    fn name(&self) -> &str {
        "setres"
    }

    fn description(&self) -> &str {
        "Change the resolution of the current window mode"
    }

    fn usage(&self) -> &str {
        "setres <width> <height>"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        let (w, h) = size_args(cmd, self.usage())?;
        ctx.display.set_resolution(w, h)?;
        Ok(CommandResult::with_message(window_summary(ctx.display)))
    }
}

/// Go fullscreen at a resolution
pub struct SetFullResCommand;

impl CommandHandler for SetFullResCommand {
    fn name(&self) -> &str {
        "setfullres"
    }

    fn description(&self) -> &str {
        "Switch to fullscreen at the closest display mode"
    }

    fn usage(&self) -> &str {
        "setfullres <width> <height>"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        let (w, h) = size_args(cmd, self.usage())?;
        ctx.display.set_fullscreen_resolution(w, h)?;
        Ok(CommandResult::with_message(format!(
            "{} [{}]",
            window_summary(ctx.display),
            ctx.display.current_mode()
        )))
    }
}

/// Go windowed at a size
pub struct SetWinResCommand;

impl CommandHandler for SetWinResCommand {
    fn name(&self) -> &str {
        "setwinres"
    }

    fn description(&self) -> &str {
        "Switch to a window of the given size"
    }

    fn usage(&self) -> &str {
        "setwinres <width> <height>"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        let (w, h) = size_args(cmd, self.usage())?;
        ctx.display.set_windowed_resolution(w, h)?;
        Ok(CommandResult::with_message(window_summary(ctx.display)))
    }
}

pub struct ToggleFullscreenCommand;

impl CommandHandler for ToggleFullscreenCommand {
    fn name(&self) -> &str {
        "togglefullscreen"
    }

    fn description(&self) -> &str {
        "Flip between windowed and fullscreen"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        cmd.expect_args(0, 0, self.usage())?;
        let fullscreen = ctx.display.toggle_fullscreen();
        Ok(CommandResult::with_message(window_summary(ctx.display))
            .with_data(serde_json::json!({ "fullscreen": fullscreen })))
    }
}

/// Show the current and original display modes
pub struct DisplayModeCommand;

impl CommandHandler for DisplayModeCommand {
    fn name(&self) -> &str {
        "displaymode"
    }

    fn description(&self) -> &str {
        "Show the current display mode"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        cmd.expect_args(0, 0, self.usage())?;
        let display = &*ctx.display;
        let original = display.original_mode();
        let current = display.current_mode();

        let mut result = CommandResult::with_message(format!("Current mode: {}", current))
            .add_line(OutputLine::info(window_summary(display)));
        if original != current {
            result = result.add_line(OutputLine::info(format!("Original mode: {}", original)));
        }
        Ok(result.with_data(serde_json::json!({ "current": current, "original": original })))
    }
}

pub struct ListDisplayModesCommand;

impl CommandHandler for ListDisplayModesCommand {
    fn name(&self) -> &str {
        "listdisplaymodes"
    }

    fn description(&self) -> &str {
        "List the display modes the monitor supports"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        cmd.expect_args(0, 0, self.usage())?;
        let current = ctx.display.current_mode();
        let lines = ctx.display.modes().iter().map(|mode| {
            let marker = if *mode == current { "*" } else { " " };
            OutputLine::info(format!("{} {}", marker, mode))
        });
        let count = ctx.display.modes().len();
        Ok(CommandResult::with_message(format!("{} display modes:", count)).add_lines(lines))
    }
}

/// Fog control
pub struct FogCommand;

impl FogCommand {
    fn parse_value(cmd: &Command, index: usize, name: &str) -> Result<f32, CommandError> {
        let value: f32 = cmd.parse_arg(index, name)?;
        if !value.is_finite() || value < 0.0 {
            return Err(CommandError::InvalidArguments(format!("{}: '{}'", name, value)));
        }
        Ok(value)
    }
}

impl CommandHandler for FogCommand {
    fn name(&self) -> &str {
        "fog"
    }

    fn description(&self) -> &str {
        "Change fog settings"
    }

    fn usage(&self) -> &str {
        "fog [on|off|mode <linear|exp|exp2>|color <r> <g> <b>|start <d>|end <d>|density <d>]"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        let Some(action) = cmd.first_arg() else {
            return Ok(CommandResult::with_message(ctx.display.fog().to_string()));
        };

        let fog = ctx.display.fog_mut();
        let message = match action.to_lowercase().as_str() {
            "on" => {
                cmd.expect_args(1, 1, self.usage())?;
                fog.enabled = true;
                "Fog is now active".to_string()
            }
            "off" => {
                cmd.expect_args(1, 1, self.usage())?;
                fog.enabled = false;
                "Fog is now disabled".to_string()
            }
            "mode" => {
                cmd.expect_args(2, 2, self.usage())?;
                let raw = cmd.require_arg(1, "mode")?;
                fog.mode = raw
                    .parse::<FogMode>()
                    .map_err(|()| CommandError::InvalidArguments(format!("fog mode: '{}'", raw)))?;
                format!("Fog mode set to {}", fog.mode)
            }
            "color" => {
                cmd.expect_args(4, 4, self.usage())?;
                let r: u8 = cmd.parse_arg(1, "red")?;
                let g: u8 = cmd.parse_arg(2, "green")?;
                let b: u8 = cmd.parse_arg(3, "blue")?;
                fog.set_color_bytes(r, g, b);
                format!("Fog color set to {} {} {}", r, g, b)
            }
            "start" => {
                cmd.expect_args(2, 2, self.usage())?;
                fog.start = Self::parse_value(cmd, 1, "start")?;
                format!("Fog start distance set to {}", fog.start)
            }
            "end" => {
                cmd.expect_args(2, 2, self.usage())?;
                fog.end = Self::parse_value(cmd, 1, "end")?;
                format!("Fog end distance set to {}", fog.end)
            }
            "density" => {
                cmd.expect_args(2, 2, self.usage())?;
                fog.density = Self::parse_value(cmd, 1, "density")?;
                format!("Fog density set to {}", fog.density)
            }
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown fog action '{}'; usage: {}",
                    other,
                    self.usage()
                )))
            }
        };
        Ok(CommandResult::with_message(message))
    }
}

/// Reapply the gamma ramp from the gamma cvars
pub struct SetVidRampCommand;

impl CommandHandler for SetVidRampCommand {
    fn name(&self) -> &str {
        "setvidramp"
    }

    fn description(&self) -> &str {
        "Recompute the gamma ramp from vid-gamma, vid-contrast and vid-bright"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        cmd.expect_args(0, 0, self.usage())?;
        ctx.update_gamma_ramp()?;
        let ramp = ctx.display.gamma_ramp();
        Ok(CommandResult::with_message(format!(
            "Gamma ramp applied (mid-grey {})",
            ramp.red[128]
        )))
    }
}
