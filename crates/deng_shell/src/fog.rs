//! Fog settings

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fog falloff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FogMode {
    #[default]
    Linear,
    Exp,
    Exp2,
}

impl FromStr for FogMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "exp" => Ok(Self::Exp),
            "exp2" => Ok(Self::Exp2),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::Exp => f.write_str("exp"),
            Self::Exp2 => f.write_str("exp2"),
        }
    }
}

/// Fog state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub enabled: bool,
    pub mode: FogMode,
    /// RGB in 0..=1
    pub color: [f32; 3],
    pub start: f32,
    pub end: f32,
    pub density: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: FogMode::Linear,
            color: [138.0 / 255.0, 138.0 / 255.0, 138.0 / 255.0],
            start: 5.0,
            end: 2100.0,
            density: 0.0001,
        }
    }
}

impl Fog {
    /// Set the colour from 0..=255 components
    pub fn set_color_bytes(&mut self, r: u8, g: u8, b: u8) {
        self.color = [r, g, b].map(|c| f32::from(c) / 255.0);
    }

    /// Colour as 0..=255 components
    pub fn color_bytes(&self) -> [u8; 3] {
        self.color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }
}

impl fmt::Display for Fog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.color_bytes();
        write!(
            f,
            "fog {} mode:{} color:{} {} {} start:{} end:{} density:{}",
            if self.enabled { "on" } else { "off" },
            self.mode,
            r,
            g,
            b,
            self.start,
            self.end,
            self.density
        )
    }
}
