//! Display modes and window state
//!
//! Tracks what the video commands change: the available display modes, the
//! current mode, the window's windowed and fullscreen sizes, fog and the
//! applied gamma ramp. Applying the state to a real window is the
//! presenter's job; this module only keeps it consistent.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fog::Fog;
use crate::gamma::GammaRamp;

/// Smallest accepted window size
pub const MIN_WIDTH: u32 = 320;
pub const MIN_HEIGHT: u32 = 240;

/// Display errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error("{width}x{height} is smaller than the minimum {min_width}x{min_height}")]
    TooSmall {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },

    #[error("No display mode matches {0}x{1}")]
    NoMatchingMode(u32, u32),
}

/// A display mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate: f32,
    #[serde(default = "default_depth")]
    pub depth: u8,
}

fn default_refresh_rate() -> f32 {
    60.0
}

fn default_depth() -> u8 {
    32
}

impl DisplayMode {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            refresh_rate: default_refresh_rate(),
            depth: default_depth(),
        }
    }

    /// Reduced aspect ratio, e.g. (16, 9)
    pub fn ratio(&self) -> (u32, u32) {
        fn gcd(a: u32, b: u32) -> u32 {
            if b == 0 {
                a
            } else {
                gcd(b, a % b)
            }
        }
        let d = gcd(self.width, self.height).max(1);
        (self.width / d, self.height / d)
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rx, ry) = self.ratio();
        write!(
            f,
            "{}x{} ({}:{}) {}-bit {:.1} Hz",
            self.width, self.height, rx, ry, self.depth, self.refresh_rate
        )
    }
}

/// The main window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub windowed_size: (u32, u32),
    pub fullscreen_size: (u32, u32),
    pub fullscreen: bool,
}

impl Window {
    /// Size of the window in its current mode
    pub fn size(&self) -> (u32, u32) {
        if self.fullscreen {
            self.fullscreen_size
        } else {
            self.windowed_size
        }
    }
}

/// Display state changed by the video commands
#[derive(Debug, Clone)]
pub struct Display {
    modes: Vec<DisplayMode>,
    original: DisplayMode,
    current: DisplayMode,
    window: Window,
    fog: Fog,
    ramp: GammaRamp,
}

impl Display {
    /// Create the display state. `modes` lists what the monitor supports;
    /// the first one is the desktop mode. An empty list falls back to the
    /// window size.
    pub fn new(mut modes: Vec<DisplayMode>, width: u32, height: u32, fullscreen: bool) -> Self {
        if modes.is_empty() {
            modes.push(DisplayMode::new(width, height));
        }
        let original = modes[0];
        modes.sort_by(|a, b| {
            (a.width, a.height)
                .cmp(&(b.width, b.height))
                .then(a.refresh_rate.total_cmp(&b.refresh_rate))
        });
        modes.dedup();

        let mut display = Self {
            modes,
            original,
            current: original,
            window: Window {
                windowed_size: (width, height),
                fullscreen_size: (original.width, original.height),
                fullscreen,
            },
            fog: Fog::default(),
            ramp: GammaRamp::linear(),
        };
        if fullscreen {
            display.current = display.closest_mode(width, height);
            display.window.fullscreen_size = (display.current.width, display.current.height);
        }
        display
    }

    /// Available modes, smallest first
    pub fn modes(&self) -> &[DisplayMode] {
        &self.modes
    }

    /// Desktop mode at startup
    pub fn original_mode(&self) -> DisplayMode {
        self.original
    }

    pub fn current_mode(&self) -> DisplayMode {
        self.current
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn fog(&self) -> &Fog {
        &self.fog
    }

    pub fn fog_mut(&mut self) -> &mut Fog {
        &mut self.fog
    }

    /// Last applied gamma ramp
    pub fn gamma_ramp(&self) -> &GammaRamp {
        &self.ramp
    }

    /// Install a new gamma ramp
    pub fn set_gamma_ramp(&mut self, ramp: GammaRamp) {
        log::debug!("Applying gamma ramp {:?}", ramp);
        self.ramp = ramp;
    }

    /// Mode closest in size to `width`x`height`, preferring the highest
    /// refresh rate among equals
    pub fn closest_mode(&self, width: u32, height: u32) -> DisplayMode {
        let distance = |m: &DisplayMode| {
            let dw = i64::from(m.width) - i64::from(width);
            let dh = i64::from(m.height) - i64::from(height);
            dw * dw + dh * dh
        };
        self.modes
            .iter()
            .copied()
            .min_by(|a, b| {
                distance(a)
                    .cmp(&distance(b))
                    .then(b.refresh_rate.total_cmp(&a.refresh_rate))
            })
            .unwrap_or(self.original)
    }

    /// Exact mode for a size
    pub fn find_mode(&self, width: u32, height: u32) -> Result<DisplayMode, DisplayError> {
        let mode = self.closest_mode(width, height);
        if (mode.width, mode.height) == (width, height) {
            Ok(mode)
        } else {
            Err(DisplayError::NoMatchingMode(width, height))
        }
    }

    /// Resize in the current mode (windowed or fullscreen)
    pub fn set_resolution(&mut self, width: u32, height: u32) -> Result<(), DisplayError> {
        if self.window.fullscreen {
            self.set_fullscreen_resolution(width, height)
        } else {
            self.set_windowed_resolution(width, height)
        }
    }

    /// Switch to fullscreen at the closest display mode
    pub fn set_fullscreen_resolution(&mut self, width: u32, height: u32) -> Result<(), DisplayError> {
        check_size(width, height)?;
        self.current = self.closest_mode(width, height);
        self.window.fullscreen_size = (self.current.width, self.current.height);
        self.window.fullscreen = true;
        log::info!("Fullscreen mode {}", self.current);
        Ok(())
    }

    /// Switch to a window of the given size; the display returns to the
    /// desktop mode
    pub fn set_windowed_resolution(&mut self, width: u32, height: u32) -> Result<(), DisplayError> {
        check_size(width, height)?;
        self.window.windowed_size = (width, height);
        self.window.fullscreen = false;
        self.current = self.original;
        log::info!("Windowed {}x{}", width, height);
        Ok(())
    }

    /// Flip between windowed and fullscreen. Returns the new fullscreen flag.
    pub fn toggle_fullscreen(&mut self) -> bool {
        if self.window.fullscreen {
            self.window.fullscreen = false;
            self.current = self.original;
        } else {
            let (w, h) = self.window.fullscreen_size;
            self.current = self.closest_mode(w, h);
            self.window.fullscreen = true;
        }
        self.window.fullscreen
    }
}

fn check_size(width: u32, height: u32) -> Result<(), DisplayError> {
    if width < MIN_WIDTH || height < MIN_HEIGHT {
        return Err(DisplayError::TooSmall {
            width,
            height,
            min_width: MIN_WIDTH,
            min_height: MIN_HEIGHT,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display() -> Display {
        Display::new(
            vec![
                DisplayMode::new(1920, 1080),
                DisplayMode::new(640, 480),
                DisplayMode::new(1280, 720),
                DisplayMode::new(1280, 1024),
            ],
            800,
            600,
            false,
        )
    }

    #[test]
    fn test_modes_sorted_and_original_kept() {
        let d = display();
        assert_eq!(d.modes()[0], DisplayMode::new(640, 480));
        assert_eq!(d.original_mode(), DisplayMode::new(1920, 1080));
        assert_eq!(d.current_mode(), d.original_mode());
        assert_eq!(d.window().size(), (800, 600));
    }

    #[test]
    fn test_ratio() {
        assert_eq!(DisplayMode::new(1920, 1080).ratio(), (16, 9));
        assert_eq!(DisplayMode::new(1280, 1024).ratio(), (5, 4));
    }

    #[test]
    fn test_fullscreen_picks_closest_mode() {
        let mut d = display();
        d.set_fullscreen_resolution(1280, 700).unwrap();
        assert_eq!(d.current_mode(), DisplayMode::new(1280, 720));
        assert_eq!(d.window().size(), (1280, 720));
        assert!(d.find_mode(1280, 700).is_err());
    }

    #[test]
    fn test_toggle_fullscreen() {
        let mut d = display();
        assert!(d.toggle_fullscreen());
        assert_eq!(d.window().size(), (1920, 1080));
        assert!(!d.toggle_fullscreen());
        assert_eq!(d.window().size(), (800, 600));
    }

    #[test]
    fn test_setres_follows_window_mode() {
        let mut d = display();
        d.set_resolution(1024, 768).unwrap();
        assert_eq!(d.window().windowed_size, (1024, 768));
        assert!(!d.window().fullscreen);

        assert!(matches!(
            d.set_resolution(200, 100),
            Err(DisplayError::TooSmall { .. })
        ));
    }
}
