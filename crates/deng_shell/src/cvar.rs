//! Console variables
//!
//! Typed, range-checked engine settings addressed by name
//! (`vid-gamma`, `rend-model-lights`...). Initial values come from the
//! runtime configuration; `set` changes them at runtime.

use core::fmt;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const VID_GAMMA: &str = "vid-gamma";
pub const VID_CONTRAST: &str = "vid-contrast";
pub const VID_BRIGHT: &str = "vid-bright";
pub const VID_VSYNC: &str = "vid-vsync";
pub const VID_FSAA: &str = "vid-fsaa";
pub const REND_MODEL: &str = "rend-model";
pub const REND_MODEL_DISTANCE: &str = "rend-model-distance";
pub const REND_MODEL_LIGHTS: &str = "rend-model-lights";
pub const REND_MODEL_SHINY_MULTIPLIER: &str = "rend-model-shiny-multiplier";

/// Variables whose change recomputes the gamma ramp
pub const GAMMA_CVARS: &[&str] = &[VID_GAMMA, VID_CONTRAST, VID_BRIGHT];

/// Console variable errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CVarError {
    #[error("Unknown console variable: '{0}'")]
    Unknown(String),

    #[error("'{value}' is not a valid {kind} for {name}")]
    InvalidValue {
        name: String,
        value: String,
        kind: &'static str,
    },

    #[error("{name} must be in {min}..={max} (got {value})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// A console variable value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CVarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl CVarValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "number",
        }
    }

    /// Numeric view (booleans are 0 or 1)
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Bool(b) => f64::from(u8::from(b)),
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

impl fmt::Display for CVarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", u8::from(*b)),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
        }
    }
}

/// One console variable
#[derive(Debug, Clone)]
pub struct CVar {
    name: &'static str,
    description: &'static str,
    value: CVarValue,
    default: CVarValue,
    range: Option<RangeInclusive<f64>>,
}

impl CVar {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn value(&self) -> CVarValue {
        self.value
    }

    pub fn default_value(&self) -> CVarValue {
        self.default
    }

    pub fn range(&self) -> Option<&RangeInclusive<f64>> {
        self.range.as_ref()
    }

    /// Coerce `value` to this variable's type and check its range
    fn validate(&self, value: CVarValue) -> Result<CVarValue, CVarError> {
        let coerced = match (self.default, value) {
            (CVarValue::Bool(_), CVarValue::Bool(b)) => CVarValue::Bool(b),
            (CVarValue::Bool(_), CVarValue::Int(i)) if i == 0 || i == 1 => CVarValue::Bool(i == 1),
            (CVarValue::Int(_), CVarValue::Int(i)) => CVarValue::Int(i),
            (CVarValue::Float(_), CVarValue::Float(f)) => CVarValue::Float(f),
            (CVarValue::Float(_), CVarValue::Int(i)) => CVarValue::Float(i as f64),
            (expected, got) => {
                return Err(CVarError::InvalidValue {
                    name: self.name.to_string(),
                    value: got.to_string(),
                    kind: expected.kind(),
                })
            }
        };

        if let Some(range) = &self.range {
            let v = coerced.as_f64();
            if !range.contains(&v) {
                return Err(CVarError::OutOfRange {
                    name: self.name.to_string(),
                    value: v,
                    min: *range.start(),
                    max: *range.end(),
                });
            }
        }
        Ok(coerced)
    }

    /// Parse console text as this variable's type
    fn parse(&self, text: &str) -> Result<CVarValue, CVarError> {
        let invalid = || CVarError::InvalidValue {
            name: self.name.to_string(),
            value: text.to_string(),
            kind: self.default.kind(),
        };
        let value = match self.default {
            CVarValue::Bool(_) => match text.to_ascii_lowercase().as_str() {
                "1" | "on" | "true" | "yes" => CVarValue::Bool(true),
                "0" | "off" | "false" | "no" => CVarValue::Bool(false),
                _ => return Err(invalid()),
            },
            CVarValue::Int(_) => CVarValue::Int(text.parse().map_err(|_| invalid())?),
            CVarValue::Float(_) => {
                let f: f64 = text.parse().map_err(|_| invalid())?;
                if !f.is_finite() {
                    return Err(invalid());
                }
                CVarValue::Float(f)
            }
        };
        self.validate(value)
    }
}

/// Registry of console variables
#[derive(Debug, Clone, Default)]
pub struct CVars {
    vars: BTreeMap<&'static str, CVar>,
}

impl CVars {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the engine's video and model variables
    pub fn with_defaults() -> Self {
        let mut cvars = Self::new();
        cvars.register(VID_GAMMA, "Display gamma correction", CVarValue::Float(1.0), Some(0.1..=4.0));
        cvars.register(VID_CONTRAST, "Display contrast", CVarValue::Float(1.0), Some(0.1..=10.0));
        cvars.register(VID_BRIGHT, "Display brightness", CVarValue::Float(0.0), Some(-0.8..=0.8));
        cvars.register(VID_VSYNC, "Wait for vertical sync", CVarValue::Bool(true), None);
        cvars.register(VID_FSAA, "Full-screen anti-aliasing", CVarValue::Bool(true), None);
        cvars.register(REND_MODEL, "Render 3D models", CVarValue::Bool(true), None);
        cvars.register(
            REND_MODEL_DISTANCE,
            "Farthest distance at which models are drawn",
            CVarValue::Float(1500.0),
            Some(0.0..=f64::MAX),
        );
        cvars.register(REND_MODEL_LIGHTS, "Lights applied to a model", CVarValue::Int(4), Some(0.0..=10.0));
        cvars.register(
            REND_MODEL_SHINY_MULTIPLIER,
            "Shiny skin strength",
            CVarValue::Float(1.0),
            Some(0.0..=10.0),
        );
        cvars
    }

    /// Register a variable. Re-registering replaces it.
    pub fn register(
        &mut self,
        name: &'static str,
        description: &'static str,
        default: CVarValue,
        range: Option<RangeInclusive<f64>>,
    ) {
        self.vars.insert(
            name,
            CVar {
                name,
                description,
                value: default,
                default,
                range,
            },
        );
    }

    pub fn get(&self, name: &str) -> Result<&CVar, CVarError> {
        self.vars
            .get(name)
            .ok_or_else(|| CVarError::Unknown(name.to_string()))
    }

    /// Set a typed value. Returns the previous value.
    pub fn set(&mut self, name: &str, value: CVarValue) -> Result<CVarValue, CVarError> {
        let var = self
            .vars
            .get_mut(name)
            .ok_or_else(|| CVarError::Unknown(name.to_string()))?;
        let value = var.validate(value)?;
        log::debug!("{} = {}", name, value);
        Ok(std::mem::replace(&mut var.value, value))
    }

    /// Set from console text. Returns the previous value.
    pub fn set_from_str(&mut self, name: &str, text: &str) -> Result<CVarValue, CVarError> {
        let value = self.get(name)?.parse(text)?;
        self.set(name, value)
    }

    /// Apply a batch of initial values. Bad entries are logged and skipped.
    pub fn apply<'a>(&mut self, values: impl IntoIterator<Item = (&'a String, &'a CVarValue)>) -> usize {
        let mut applied = 0;
        for (name, value) in values {
            match self.set(name, *value) {
                Ok(_) => applied += 1,
                Err(err) => log::warn!("Ignoring configured value: {}", err),
            }
        }
        applied
    }

    pub fn float(&self, name: &str) -> Result<f64, CVarError> {
        Ok(self.get(name)?.value().as_f64())
    }

    pub fn int(&self, name: &str) -> Result<i64, CVarError> {
        Ok(self.get(name)?.value().as_f64() as i64)
    }

    pub fn bool(&self, name: &str) -> Result<bool, CVarError> {
        Ok(self.get(name)?.value().as_f64() != 0.0)
    }

    /// Iterate in name order
    pub fn iter(&self) -> impl Iterator<Item = &CVar> {
        self.vars.values()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cvars = CVars::with_defaults();
        assert_eq!(cvars.float(VID_GAMMA).unwrap(), 1.0);
        assert_eq!(cvars.int(REND_MODEL_LIGHTS).unwrap(), 4);
        assert!(cvars.bool(VID_VSYNC).unwrap());
    }

    #[test]
    fn test_range_check() {
        let mut cvars = CVars::with_defaults();
        assert!(cvars.set_from_str(VID_GAMMA, "2.2").is_ok());
        assert!(matches!(
            cvars.set_from_str(VID_GAMMA, "5"),
            Err(CVarError::OutOfRange { .. })
        ));
        assert!(matches!(
            cvars.set_from_str(VID_BRIGHT, "-0.9"),
            Err(CVarError::OutOfRange { .. })
        ));
        assert!(matches!(
            cvars.set_from_str(REND_MODEL_LIGHTS, "11"),
            Err(CVarError::OutOfRange { .. })
        ));
        // Rejected sets leave the value alone
        assert_eq!(cvars.float(VID_GAMMA).unwrap(), 2.2);
    }

    #[test]
    fn test_type_check() {
        let mut cvars = CVars::with_defaults();
        assert!(matches!(
            cvars.set_from_str(REND_MODEL_LIGHTS, "2.5"),
            Err(CVarError::InvalidValue { .. })
        ));
        assert!(matches!(
            cvars.set(VID_GAMMA, CVarValue::Bool(true)),
            Err(CVarError::InvalidValue { .. })
        ));
        cvars.set_from_str(VID_VSYNC, "off").unwrap();
        assert!(!cvars.bool(VID_VSYNC).unwrap());
        assert_eq!(cvars.set(VID_CONTRAST, CVarValue::Int(2)).unwrap(), CVarValue::Float(1.0));
    }

    #[test]
    fn test_unknown() {
        let mut cvars = CVars::with_defaults();
        assert!(matches!(cvars.set_from_str("rend-nope", "1"), Err(CVarError::Unknown(_))));
    }

    #[test]
    fn test_apply_skips_bad_values() {
        let mut cvars = CVars::with_defaults();
        let values: BTreeMap<String, CVarValue> = [
            (VID_GAMMA.to_string(), CVarValue::Float(1.5)),
            (VID_CONTRAST.to_string(), CVarValue::Float(99.0)),
            ("nope".to_string(), CVarValue::Int(1)),
        ]
        .into_iter()
        .collect();

        assert_eq!(cvars.apply(&values), 1);
        assert_eq!(cvars.float(VID_GAMMA).unwrap(), 1.5);
        assert_eq!(cvars.float(VID_CONTRAST).unwrap(), 1.0);
    }
}
