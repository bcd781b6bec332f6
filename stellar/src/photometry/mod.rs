//! Photometric inputs and the quantities derived from them

pub mod derived;
pub mod features;
pub mod inputs;

pub use derived::{
    absolute_magnitude_from_parallax, age_from_luminosity, radius_from_luminosity,
    resolve_absolute_magnitude, temperature_from_bv, DerivationError, DerivedFeatures,
    IncompleteInputs,
};
pub use features::{Feature, FeatureVector, CANONICAL_SCHEMA};
pub use inputs::{MagnitudeInput, StellarInputs};
