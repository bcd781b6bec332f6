//! Stellar classification from photometric parameters.
//!
//! Given a B-V color index, a luminosity and either an absolute magnitude or
//! a parallax with an apparent magnitude, this crate derives effective
//! temperature, radius, age and absolute magnitude, then feeds the complete
//! feature vector to a pre-trained classifier.
//!
//! Sky positions entered in sexagesimal form are converted to decimal degrees
//! by [`coordinates`] for use with the [`skyview`] image client.

pub mod classifier;
pub mod config;
pub mod coordinates;
pub mod photometry;
pub mod session;
pub mod shared_args;

pub use classifier::{
    classify, ClassificationResult, ClassifierError, ForestClassifier, ModelLoadError,
    StellarClassifier,
};
pub use config::AppConfig;
pub use coordinates::{CelestialCoordinate, CoordinateError, Dms, Hms};
pub use photometry::{
    DerivationError, DerivedFeatures, Feature, FeatureVector, IncompleteInputs, MagnitudeInput,
    StellarInputs,
};
pub use session::{SessionError, StarSession};
