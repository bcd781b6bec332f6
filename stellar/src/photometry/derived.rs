//! Closed-form stellar quantities derived from photometric inputs.
//!
//! Every derived quantity is returned as a `Result` so that a missing or
//! non-physical value is an explicit state rather than a NaN that leaks into
//! the classifier:
//!
//! | quantity           | relation                                                       |
//! |--------------------|----------------------------------------------------------------|
//! | temperature (K)    | `4600 * (1/(0.92 bv + 1.7) + 1/(0.92 bv + 0.62))` (Ballesteros) |
//! | radius (R☉)        | `sqrt(L L☉ / (4π σ T⁴)) / R☉`                                  |
//! | age                | `10 * L^-0.7`                                                  |
//! | absolute magnitude | `m + 5 log10(p / 100)`                                         |

use std::f64::consts::PI;
use std::fmt;

use thiserror::Error;

use super::features::{Feature, FeatureVector};
use super::inputs::{MagnitudeInput, StellarInputs};

/// Nominal solar luminosity in watts
pub const SOLAR_LUMINOSITY_W: f64 = 3.828e26;

/// Stefan-Boltzmann constant in W m⁻² K⁻⁴
pub const STEFAN_BOLTZMANN: f64 = 5.67e-8;

/// Solar radius in meters
pub const SOLAR_RADIUS_M: f64 = 6.95e8;

/// Why a derived quantity is unavailable
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DerivationError {
    #[error("B-V index {bv} gives no finite temperature")]
    InvalidTemperature { bv: f64 },

    #[error("temperature is zero")]
    ZeroTemperature,

    #[error("temperature is unavailable")]
    DependsOnTemperature,

    #[error("luminosity is zero")]
    ZeroLuminosity,

    #[error("parallax {parallax} is not positive")]
    NonPositiveParallax { parallax: f64 },

    #[error("{0} is not a finite number")]
    NonFinite(Feature),
}

/// Effective temperature in Kelvin from the B-V color index
pub fn temperature_from_bv(bv: f64) -> Result<f64, DerivationError> {
    let temperature = 4600.0 * (1.0 / (0.92 * bv + 1.7) + 1.0 / (0.92 * bv + 0.62));
    if temperature.is_finite() {
        Ok(temperature)
    } else {
        Err(DerivationError::InvalidTemperature { bv })
    }
}

/// Radius in solar radii from luminosity (solar units) and temperature (K)
pub fn radius_from_luminosity(luminosity: f64, temperature: f64) -> Result<f64, DerivationError> {
    if temperature == 0.0 {
        return Err(DerivationError::ZeroTemperature);
    }

    let watts = luminosity * SOLAR_LUMINOSITY_W;
    let radius_m = (watts / (4.0 * PI * STEFAN_BOLTZMANN * temperature.powi(4))).sqrt();
    finite(radius_m / SOLAR_RADIUS_M, Feature::Radius)
}

/// Age estimate from luminosity (solar units), undefined for zero luminosity
pub fn age_from_luminosity(luminosity: f64) -> Result<f64, DerivationError> {
    if luminosity == 0.0 {
        return Err(DerivationError::ZeroLuminosity);
    }
    finite(10.0 * luminosity.powf(-0.7), Feature::Age)
}

/// Absolute magnitude from parallax and apparent magnitude
///
/// Uses `M = m + 5 log10(p / 100)`, so `p = 100` leaves the apparent magnitude
/// unchanged. Non-positive parallax has no distance and is rejected.
pub fn absolute_magnitude_from_parallax(
    parallax: f64,
    apparent_magnitude: f64,
) -> Result<f64, DerivationError> {
    if parallax.is_nan() || parallax <= 0.0 {
        return Err(DerivationError::NonPositiveParallax { parallax });
    }
    finite(
        apparent_magnitude + 5.0 * (parallax / 100.0).log10(),
        Feature::Magnitude,
    )
}

/// Resolve the absolute magnitude from whichever form was supplied
pub fn resolve_absolute_magnitude(input: &MagnitudeInput) -> Result<f64, DerivationError> {
    match *input {
        MagnitudeInput::Absolute(magnitude) => finite(magnitude, Feature::Magnitude),
        MagnitudeInput::FromParallax {
            parallax,
            apparent_magnitude,
        } => absolute_magnitude_from_parallax(parallax, apparent_magnitude),
    }
}

fn finite(value: f64, feature: Feature) -> Result<f64, DerivationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DerivationError::NonFinite(feature))
    }
}

/// Derived quantities for one set of inputs, each possibly unavailable
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFeatures {
    pub temperature: Result<f64, DerivationError>,
    pub radius: Result<f64, DerivationError>,
    pub age: Result<f64, DerivationError>,
    pub absolute_magnitude: Result<f64, DerivationError>,
}

impl DerivedFeatures {
    pub fn derive(inputs: &StellarInputs) -> Self {
        let temperature = temperature_from_bv(inputs.bv);
        let radius = match temperature {
            Ok(t) => radius_from_luminosity(inputs.luminosity, t),
            Err(_) => Err(DerivationError::DependsOnTemperature),
        };

        Self {
            temperature,
            radius,
            age: age_from_luminosity(inputs.luminosity),
            absolute_magnitude: resolve_absolute_magnitude(&inputs.magnitude),
        }
    }

    /// Every unavailable quantity together with the reason
    pub fn missing(&self) -> Vec<(Feature, DerivationError)> {
        [
            (Feature::Temperature, self.temperature),
            (Feature::Radius, self.radius),
            (Feature::Magnitude, self.absolute_magnitude),
            (Feature::Age, self.age),
        ]
        .into_iter()
        .filter_map(|(feature, result)| result.err().map(|e| (feature, e)))
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Assemble the classifier inputs, or report everything that is missing
    pub fn feature_vector(&self, inputs: &StellarInputs) -> Result<FeatureVector, IncompleteInputs> {
        let mut missing = Vec::new();
        if !inputs.bv.is_finite() {
            missing.push((Feature::Bv, DerivationError::NonFinite(Feature::Bv)));
        }
        if !inputs.luminosity.is_finite() {
            missing.push((
                Feature::Luminosity,
                DerivationError::NonFinite(Feature::Luminosity),
            ));
        }
        missing.extend(self.missing());

        match (
            self.temperature,
            self.radius,
            self.absolute_magnitude,
            self.age,
        ) {
            (Ok(temperature), Ok(radius), Ok(magnitude), Ok(age)) if missing.is_empty() => {
                Ok(FeatureVector {
                    bv: inputs.bv,
                    temperature,
                    luminosity: inputs.luminosity,
                    radius,
                    magnitude,
                    age,
                })
            }
            _ => Err(IncompleteInputs { missing }),
        }
    }
}

/// Classification refused because some features could not be derived
#[derive(Debug, Clone, PartialEq, Error)]
#[error("incomplete inputs, cannot classify: {}", MissingList(.missing))]
pub struct IncompleteInputs {
    pub missing: Vec<(Feature, DerivationError)>,
}

struct MissingList<'a>(&'a [(Feature, DerivationError)]);

impl fmt::Display for MissingList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (feature, reason)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{feature} ({reason})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_temperature_at_zero_bv() {
        let t = temperature_from_bv(0.0).unwrap();
        assert_relative_eq!(t, 4600.0 * (1.0 / 1.7 + 1.0 / 0.62));
        assert_relative_eq!(t, 10_125.0, max_relative = 1e-3);
    }

    #[test]
    fn test_temperature_sun_like() {
        // Solar B-V
        let t = temperature_from_bv(0.65).unwrap();
        assert_relative_eq!(t, 5778.0, max_relative = 1e-3);
    }

    #[test]
    fn test_temperature_poles_rejected() {
        for bv in [-1.7 / 0.92, -0.62 / 0.92] {
            assert_eq!(
                temperature_from_bv(bv),
                Err(DerivationError::InvalidTemperature { bv })
            );
        }
        assert!(temperature_from_bv(f64::NAN).is_err());
    }

    #[test]
    fn test_radius_of_sun() {
        let r = radius_from_luminosity(1.0, 5778.0).unwrap();
        assert_relative_eq!(r, 1.0, max_relative = 0.01);
    }

    #[test]
    fn test_radius_scales_with_luminosity() {
        let r1 = radius_from_luminosity(1.0, 5778.0).unwrap();
        let r100 = radius_from_luminosity(100.0, 5778.0).unwrap();
        assert_relative_eq!(r100 / r1, 10.0, max_relative = 1e-12);
    }

    #[test]
    fn test_radius_zero_temperature() {
        assert_eq!(
            radius_from_luminosity(1.0, 0.0),
            Err(DerivationError::ZeroTemperature)
        );
    }

    #[test]
    fn test_radius_negative_luminosity() {
        assert_eq!(
            radius_from_luminosity(-1.0, 5778.0),
            Err(DerivationError::NonFinite(Feature::Radius))
        );
    }

    #[test]
    fn test_age() {
        assert_relative_eq!(age_from_luminosity(1.0).unwrap(), 10.0);
        assert_relative_eq!(
            age_from_luminosity(10.0).unwrap(),
            10.0 * 10f64.powf(-0.7)
        );
        assert_eq!(age_from_luminosity(0.0), Err(DerivationError::ZeroLuminosity));
        assert_eq!(
            age_from_luminosity(-2.0),
            Err(DerivationError::NonFinite(Feature::Age))
        );
    }

    #[test]
    fn test_absolute_magnitude_from_parallax() {
        assert_relative_eq!(absolute_magnitude_from_parallax(100.0, 5.0).unwrap(), 5.0);
        assert_relative_eq!(
            absolute_magnitude_from_parallax(10.0, 5.0).unwrap(),
            0.0,
            epsilon = 1e-12
        );
        assert_eq!(
            absolute_magnitude_from_parallax(0.0, 5.0),
            Err(DerivationError::NonPositiveParallax { parallax: 0.0 })
        );
        assert!(absolute_magnitude_from_parallax(-3.0, 5.0).is_err());
    }

    #[test]
    fn test_magnitude_pass_through() {
        assert_eq!(
            resolve_absolute_magnitude(&MagnitudeInput::Absolute(-1.46)),
            Ok(-1.46)
        );
    }

    #[test]
    fn test_derive_complete() {
        let inputs = StellarInputs::new(0.65, 1.0, MagnitudeInput::Absolute(4.83));
        let derived = DerivedFeatures::derive(&inputs);

        assert!(derived.is_complete());
        let v = derived.feature_vector(&inputs).unwrap();
        assert_eq!(v.bv, 0.65);
        assert_eq!(v.luminosity, 1.0);
        assert_eq!(v.magnitude, 4.83);
        assert_relative_eq!(v.age, 10.0);
        assert_relative_eq!(v.radius, 1.0, max_relative = 0.01);
    }

    #[test]
    fn test_derive_zero_luminosity_is_incomplete() {
        let inputs = StellarInputs::new(0.65, 0.0, MagnitudeInput::Absolute(4.83));
        let derived = DerivedFeatures::derive(&inputs);

        assert_eq!(derived.age, Err(DerivationError::ZeroLuminosity));
        // Radius is still defined (zero) for zero luminosity
        assert_eq!(derived.radius, Ok(0.0));

        let err = derived.feature_vector(&inputs).unwrap_err();
        assert_eq!(
            err.missing,
            vec![(Feature::Age, DerivationError::ZeroLuminosity)]
        );
        assert!(err.to_string().contains("age (luminosity is zero)"));
    }

    #[test]
    fn test_derive_bad_parallax_and_bv() {
        let bv = -1.7 / 0.92;
        let inputs = StellarInputs::new(
            bv,
            2.0,
            MagnitudeInput::FromParallax {
                parallax: 0.0,
                apparent_magnitude: 5.0,
            },
        );
        let err = DerivedFeatures::derive(&inputs)
            .feature_vector(&inputs)
            .unwrap_err();

        assert_eq!(
            err.missing,
            vec![
                (
                    Feature::Temperature,
                    DerivationError::InvalidTemperature { bv }
                ),
                (Feature::Radius, DerivationError::DependsOnTemperature),
                (
                    Feature::Magnitude,
                    DerivationError::NonPositiveParallax { parallax: 0.0 }
                ),
            ]
        );
    }
}
