//! Raw photometric inputs as entered by the user.

use serde::{Deserialize, Serialize};

/// How the absolute magnitude is supplied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagnitudeInput {
    /// Absolute magnitude is known directly
    Absolute(f64),

    /// Absolute magnitude must be derived from distance
    FromParallax {
        /// Parallax, in the units the magnitude relation expects (see
        /// [`absolute_magnitude_from_parallax`](super::derived::absolute_magnitude_from_parallax))
        parallax: f64,
        /// Apparent magnitude
        apparent_magnitude: f64,
    },
}

impl Default for MagnitudeInput {
    fn default() -> Self {
        MagnitudeInput::Absolute(0.0)
    }
}

/// The user-supplied parameters for one classification request
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StellarInputs {
    /// B-V color index
    pub bv: f64,
    /// Luminosity in solar units
    pub luminosity: f64,
    /// Absolute magnitude, or the values to derive it from
    pub magnitude: MagnitudeInput,
}

impl StellarInputs {
    pub fn new(bv: f64, luminosity: f64, magnitude: MagnitudeInput) -> Self {
        Self {
            bv,
            luminosity,
            magnitude,
        }
    }

    /// True when the absolute magnitude was entered directly
    pub fn magnitude_known(&self) -> bool {
        matches!(self.magnitude, MagnitudeInput::Absolute(_))
    }
}
