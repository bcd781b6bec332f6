//! The feature schema consumed by the classifier.

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

/// One input column of the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// B-V color index
    #[strum(to_string = "bv", serialize = "b-v", serialize = "b_v")]
    Bv,
    /// Effective temperature in Kelvin
    #[strum(to_string = "temperature")]
    Temperature,
    /// Luminosity in solar units
    #[strum(to_string = "luminosity")]
    Luminosity,
    /// Radius in solar radii
    #[strum(to_string = "radius")]
    Radius,
    /// Absolute magnitude
    #[strum(to_string = "magnitude", serialize = "absolute_magnitude")]
    Magnitude,
    /// Age estimate
    #[strum(to_string = "age")]
    Age,
}

/// Column order of the shipped classifier
pub const CANONICAL_SCHEMA: [Feature; 6] = [
    Feature::Bv,
    Feature::Temperature,
    Feature::Luminosity,
    Feature::Radius,
    Feature::Magnitude,
    Feature::Age,
];

/// A complete set of classifier inputs
///
/// Only constructed once every derived quantity is available, see
/// [`DerivedFeatures::feature_vector`](super::derived::DerivedFeatures::feature_vector).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub bv: f64,
    pub temperature: f64,
    pub luminosity: f64,
    pub radius: f64,
    pub magnitude: f64,
    pub age: f64,
}

impl FeatureVector {
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Bv => self.bv,
            Feature::Temperature => self.temperature,
            Feature::Luminosity => self.luminosity,
            Feature::Radius => self.radius,
            Feature::Magnitude => self.magnitude,
            Feature::Age => self.age,
        }
    }

    /// Lay the features out in the given column order
    pub fn ordered(&self, schema: &[Feature]) -> Vec<f64> {
        schema.iter().map(|f| self.get(*f)).collect()
    }
}
