//! Display gamma ramp

use crate::cvar::{CVarError, CVars, VID_BRIGHT, VID_CONTRAST, VID_GAMMA};

/// Entries per channel
pub const RAMP_SIZE: usize = 256;

/// Hardware gamma ramp: 256 entries for each of red, green and blue
#[derive(Clone, PartialEq, Eq)]
pub struct GammaRamp {
    pub red: [u16; RAMP_SIZE],
    pub green: [u16; RAMP_SIZE],
    pub blue: [u16; RAMP_SIZE],
}

impl GammaRamp {
    /// Identity ramp
    pub fn linear() -> Self {
        Self::compute(1.0, 1.0, 0.0)
    }

    /// Build the ramp for the given gamma, contrast and brightness. All three
    /// channels get the same curve.
    pub fn compute(gamma: f64, contrast: f64, bright: f64) -> Self {
        let mut channel = [0u16; RAMP_SIZE];
        let inverse = 1.0 / gamma;
        let norm = 255f64.powf(inverse - 1.0);

        for (i, entry) in channel.iter_mut().enumerate() {
            let mut v = (i as f64 * contrast - (contrast - 1.0) * 127.0).max(0.0);
            if gamma != 1.0 {
                v = v.powf(inverse) / norm;
            }
            v += bright * 128.0;
            let v = v.clamp(0.0, 255.0);
            // `as` saturates out-of-range floats
            *entry = (v * 256.0) as u16;
        }

        Self {
            red: channel,
            green: channel,
            blue: channel,
        }
    }

    /// Build the ramp from the `vid-gamma`, `vid-contrast` and `vid-bright`
    /// console variables
    pub fn from_cvars(cvars: &CVars) -> Result<Self, CVarError> {
        Ok(Self::compute(
            cvars.float(VID_GAMMA)?,
            cvars.float(VID_CONTRAST)?,
            cvars.float(VID_BRIGHT)?,
        ))
    }
}

impl Default for GammaRamp {
    fn default() -> Self {
        Self::linear()
    }
}

impl std::fmt::Debug for GammaRamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GammaRamp([{}, {}, .., {}])",
            self.red[0], self.red[128], self.red[RAMP_SIZE - 1]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let ramp = GammaRamp::linear();
        for i in 0..RAMP_SIZE {
            assert_eq!(ramp.red[i], (i * 256) as u16);
        }
        assert_eq!(ramp.red, ramp.blue);
    }

    #[test]
    fn test_top_entry_saturates_at_255() {
        let ramp = GammaRamp::compute(1.0, 1.0, 0.8);
        assert_eq!(ramp.red[RAMP_SIZE - 1], 255 * 256);
        assert_eq!(ramp.red[0], (0.8f64 * 128.0 * 256.0) as u16);
    }

    #[test]
    fn test_contrast_clamps_low_end() {
        let ramp = GammaRamp::compute(1.0, 2.0, 0.0);
        // i*2 - 127 is negative below 64
        assert_eq!(ramp.red[0], 0);
        assert_eq!(ramp.red[63], 0);
        assert_eq!(ramp.red[64], 256);
    }

    #[test]
    fn test_gamma_keeps_endpoints_and_brightens_midtones() {
        let ramp = GammaRamp::compute(2.0, 1.0, 0.0);
        assert_eq!(ramp.red[0], 0);
        assert!(ramp.red[255] >= 255 * 256 - 1);
        assert!(ramp.red[128] > GammaRamp::linear().red[128]);
    }

    #[test]
    fn test_from_cvars() {
        let mut cvars = CVars::with_defaults();
        assert_eq!(GammaRamp::from_cvars(&cvars).unwrap(), GammaRamp::linear());
        cvars.set_from_str(VID_GAMMA, "1.5").unwrap();
        assert_ne!(GammaRamp::from_cvars(&cvars).unwrap(), GammaRamp::linear());
    }
}
